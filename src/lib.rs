//! Policy Model Loader Library
//!
//! Loads a serialized, pre-trained policy network once and runs forward
//! inference on flat observation vectors through ONNX Runtime.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;

pub use config::AppConfig;
pub use error::ModelError;
pub use metrics::InferenceMetrics;
pub use models::loader::ModelLoader;
pub use models::runtime::OrtRuntime;
