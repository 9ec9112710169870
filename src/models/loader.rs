//! Model loader: owns at most one loaded graph and runs inference on it

use crate::error::ModelError;
use crate::metrics::InferenceMetrics;
use crate::models::runtime::{Graph, OrtRuntime, Runtime};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// A graph loaded from disk together with its source path
pub struct LoadedModel<G> {
    /// Runtime graph handle
    pub graph: G,
    /// File the graph was deserialized from
    pub path: PathBuf,
}

/// Load state of a [`ModelLoader`]. Only ever moves from `Unloaded` to `Loaded`.
pub enum ModelState<G> {
    Unloaded,
    Loaded(LoadedModel<G>),
}

/// Loads a serialized policy network once and runs forward passes on it.
///
/// Both operations take `&mut self`: the loader owns its graph exclusively
/// and provides no synchronization of its own.
pub struct ModelLoader<R: Runtime = OrtRuntime> {
    runtime: R,
    state: ModelState<R::Graph>,
    metrics: InferenceMetrics,
}

impl<R: Runtime> ModelLoader<R> {
    /// Create an unloaded loader backed by the given runtime
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            state: ModelState::Unloaded,
            metrics: InferenceMetrics::new(),
        }
    }

    /// Load a model, returning `true` if one is loaded afterwards.
    ///
    /// Failures are logged and reported as `false`; the loader stays
    /// unloaded so the call can be retried with another path.
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> bool {
        match self.try_load(path) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Error loading the model");
                false
            }
        }
    }

    /// Load a model from `path` unless one is already loaded.
    ///
    /// When a model is present this returns `Ok(())` without touching `path`.
    pub fn try_load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ModelError> {
        if let ModelState::Loaded(model) = &self.state {
            debug!(path = %model.path.display(), "Model already loaded");
            return Ok(());
        }

        let path = path.as_ref();
        info!(path = %path.display(), "Trying to load model from file");

        let graph = self.runtime.load(path).map_err(|reason| ModelError::Load {
            path: path.to_path_buf(),
            reason,
        })?;

        self.state = ModelState::Loaded(LoadedModel {
            graph,
            path: path.to_path_buf(),
        });
        info!(path = %path.display(), "Model loaded successfully");

        Ok(())
    }

    /// Run the loaded graph on one observation vector.
    ///
    /// The input is fed as a `[1, input.len()]` tensor and the output tensor
    /// is returned flattened in row-major order.
    pub fn inference(&mut self, input: &[f32]) -> Result<Vec<f32>, ModelError> {
        let model = match &mut self.state {
            ModelState::Loaded(model) => model,
            ModelState::Unloaded => {
                self.metrics.record_unloaded();
                return Err(ModelError::Unloaded);
            }
        };

        let start = Instant::now();
        match model.graph.forward(input, [1, input.len()]) {
            Ok(output) => {
                self.metrics.record_success(start.elapsed());
                debug!(
                    input_len = input.len(),
                    output_len = output.len(),
                    "Forward pass complete"
                );
                Ok(output)
            }
            Err(e) => {
                self.metrics.record_failure();
                error!(
                    path = %model.path.display(),
                    input_len = input.len(),
                    error = %e,
                    "Forward pass failed"
                );
                Err(ModelError::Inference(e))
            }
        }
    }

    /// Whether a model has been loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Loaded(_))
    }

    /// Path of the loaded model, if any
    pub fn model_path(&self) -> Option<&Path> {
        match &self.state {
            ModelState::Loaded(model) => Some(&model.path),
            ModelState::Unloaded => None,
        }
    }

    /// Current load state
    pub fn state(&self) -> &ModelState<R::Graph> {
        &self.state
    }

    /// Inference metrics collected by this loader
    pub fn metrics(&self) -> &InferenceMetrics {
        &self.metrics
    }

    /// The runtime backing this loader
    pub fn runtime(&self) -> &R {
        &self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{ensure, Context, Result};
    use serde::Deserialize;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Affine layer `y = W x + b` stored as JSON
    #[derive(Deserialize)]
    struct DenseGraph {
        weights: Vec<Vec<f32>>,
        bias: Vec<f32>,
        #[serde(skip)]
        forward_calls: Rc<Cell<usize>>,
    }

    impl Graph for DenseGraph {
        fn forward(&mut self, input: &[f32], shape: [usize; 2]) -> Result<Vec<f32>> {
            self.forward_calls.set(self.forward_calls.get() + 1);
            ensure!(shape == [1, input.len()], "unexpected shape {:?}", shape);

            let mut output = Vec::with_capacity(self.weights.len());
            for (row, b) in self.weights.iter().zip(&self.bias) {
                ensure!(
                    row.len() == input.len(),
                    "shape mismatch: expected {} inputs, got {}",
                    row.len(),
                    input.len()
                );
                output.push(row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + b);
            }
            Ok(output)
        }
    }

    #[derive(Default)]
    struct DenseRuntime {
        reads: Rc<Cell<usize>>,
        forward_calls: Rc<Cell<usize>>,
    }

    impl Runtime for DenseRuntime {
        type Graph = DenseGraph;

        fn load(&self, path: &Path) -> Result<DenseGraph> {
            self.reads.set(self.reads.get() + 1);
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let mut graph: DenseGraph =
                serde_json::from_slice(&bytes).context("Malformed model file")?;
            graph.forward_calls = self.forward_calls.clone();
            Ok(graph)
        }
    }

    // 3 observations -> 2 Q-values
    const MODEL: &str = r#"{
        "weights": [[0.5, -1.0, 2.0], [1.5, 0.25, -0.5]],
        "bias": [0.1, -0.2]
    }"#;

    fn write_model(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "policy.json", MODEL);
        let mut loader = ModelLoader::new(DenseRuntime::default());

        assert!(loader.load_model(&path));
        assert!(loader.load_model(&path));
        assert_eq!(loader.runtime().reads.get(), 1);

        // A loaded model ignores the path argument entirely
        assert!(loader.load_model(dir.path().join("does-not-exist.json")));
        assert_eq!(loader.runtime().reads.get(), 1);
        assert_eq!(loader.model_path(), Some(path.as_path()));
    }

    #[test]
    fn test_failed_load_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_model(&dir, "bad.json", "not a model");
        let good = write_model(&dir, "good.json", MODEL);
        let mut loader = ModelLoader::new(DenseRuntime::default());

        assert!(!loader.load_model(dir.path().join("missing.json")));
        assert!(!loader.is_loaded());

        assert!(!loader.load_model(&bad));
        assert!(!loader.is_loaded());
        assert!(loader.model_path().is_none());

        assert!(loader.load_model(&good));
        assert!(loader.is_loaded());
        assert_eq!(loader.runtime().reads.get(), 3);
    }

    #[test]
    fn test_try_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let mut loader = ModelLoader::new(DenseRuntime::default());

        match loader.try_load(&missing) {
            Err(ModelError::Load { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected load error, got {:?}", other.err()),
        }
        assert!(matches!(loader.state(), ModelState::Unloaded));
    }

    #[test]
    fn test_inference_before_load() {
        let mut loader = ModelLoader::new(DenseRuntime::default());

        let err = loader.inference(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(err.is_unloaded());
        assert_eq!(loader.runtime().forward_calls.get(), 0);
        assert_eq!(loader.metrics().unloaded(), 1);
    }

    #[test]
    fn test_inference_matches_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "policy.json", MODEL);
        let mut loader = ModelLoader::new(DenseRuntime::default());
        assert!(loader.load_model(&path));

        let output = loader.inference(&[1.0, 2.0, 3.0]).unwrap();
        let expected = [4.6_f32, 0.3];

        assert_eq!(output.len(), 2);
        for (got, want) in output.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "got {}, want {}", got, want);
        }
        assert_eq!(loader.metrics().successes(), 1);
    }

    #[test]
    fn test_inference_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "policy.json", MODEL);
        let mut loader = ModelLoader::new(DenseRuntime::default());
        assert!(loader.load_model(&path));

        let input = [0.3, -0.7, 1.1];
        let first = loader.inference(&input).unwrap();
        let second = loader.inference(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_forward_failure_keeps_model_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model(&dir, "policy.json", MODEL);
        let mut loader = ModelLoader::new(DenseRuntime::default());
        assert!(loader.load_model(&path));

        let err = loader.inference(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ModelError::Inference(_)));
        assert!(err.to_string().contains("shape mismatch"));

        assert!(loader.is_loaded());
        assert_eq!(loader.metrics().failures(), 1);
        assert!(loader.inference(&[1.0, 2.0, 3.0]).is_ok());
    }
}
