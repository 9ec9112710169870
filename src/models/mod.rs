//! Model loading and inference components

pub mod loader;
pub mod runtime;

pub use loader::{LoadedModel, ModelLoader, ModelState};
pub use runtime::{Graph, OrtGraph, OrtRuntime, Runtime};
