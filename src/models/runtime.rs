//! Tensor runtime backends

use crate::config::ModelConfig;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use tracing::{debug, info};

/// A runtime able to deserialize computation graphs from disk.
pub trait Runtime {
    /// Loaded graph handle produced by this runtime
    type Graph: Graph;

    /// Deserialize a graph from a model file.
    fn load(&self, path: &Path) -> Result<Self::Graph>;
}

/// A loaded computation graph.
pub trait Graph {
    /// Run one forward pass on a single input tensor of the given shape.
    ///
    /// `input` holds the tensor data in row-major order. Returns the first
    /// output tensor flattened in row-major order.
    fn forward(&mut self, input: &[f32], shape: [usize; 2]) -> Result<Vec<f32>>;
}

/// ONNX Runtime backend
pub struct OrtRuntime {
    /// Number of intra-op threads per session
    intra_threads: usize,
    /// Graph optimization level applied when building sessions (0-3)
    optimization_level: u8,
}

impl OrtRuntime {
    /// Create a runtime from model configuration
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let mut runtime = Self::with_threads(config.intra_threads)?;
        runtime.optimization_level = config.optimization_level;
        Ok(runtime)
    }

    /// Create a runtime with the given number of intra-op threads
    pub fn with_threads(intra_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(intra_threads = intra_threads, "ONNX Runtime initialized");
        Ok(Self {
            intra_threads,
            optimization_level: 3,
        })
    }
}

fn optimization_level(level: u8) -> GraphOptimizationLevel {
    match level {
        0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}

impl Runtime for OrtRuntime {
    type Graph = OrtGraph;

    fn load(&self, path: &Path) -> Result<OrtGraph> {
        debug!(path = %path.display(), threads = self.intra_threads, "Building ONNX session");

        let session = Session::builder()?
            .with_optimization_level(optimization_level(self.optimization_level))?
            .with_intra_threads(self.intra_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .context("Model declares no inputs")?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .context("Model declares no outputs")?;

        debug!(input = %input_name, output = %output_name, "ONNX session ready");

        Ok(OrtGraph {
            session,
            input_name,
            output_name,
        })
    }
}

/// A graph loaded into an ONNX Runtime session
pub struct OrtGraph {
    session: Session,
    /// First graph input, fed with the observation row
    input_name: String,
    /// First graph output, read back after the forward pass
    output_name: String,
}

impl OrtGraph {
    /// Name of the graph input fed by [`Graph::forward`]
    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Name of the graph output returned by [`Graph::forward`]
    pub fn output_name(&self) -> &str {
        &self.output_name
    }
}

impl Graph for OrtGraph {
    fn forward(&mut self, input: &[f32], shape: [usize; 2]) -> Result<Vec<f32>> {
        let shape = vec![shape[0] as i64, shape[1] as i64];
        let input_tensor =
            Tensor::from_array((shape, input.to_vec())).context("Failed to create input tensor")?;

        let outputs = self
            .session
            .run(ort::inputs![&self.input_name => input_tensor])?;

        let output = outputs
            .get(&self.output_name)
            .with_context(|| format!("Output {:?} missing from session results", self.output_name))?;

        // Extracted data is contiguous and row-major
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .context("Model output is not an f32 tensor")?;

        Ok(data.to_vec())
    }
}
