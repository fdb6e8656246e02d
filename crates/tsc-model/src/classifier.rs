//! LSTM sequence classifier

use crate::config::ModelConfig;
use crate::dense::{softmax, Dense};
use crate::lstm::{LstmCell, StepCache};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tsc_core::{FeatureSequence, TscError, TscResult};

/// Recurrent classifier: one LSTM cell over the feature sequence, a dense
/// softmax head on the final hidden state.
///
/// Inference is deterministic for fixed weights and input; two classifiers
/// built with the same seed are identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceClassifier {
    pub config: ModelConfig,
    pub classes: Vec<String>,
    pub(crate) cell: LstmCell,
    pub(crate) output: Dense,
}

impl SequenceClassifier {
    /// Build a classifier for the given ordered class labels
    pub fn new(classes: Vec<String>, input_size: usize, hidden_size: usize, seed: u64) -> TscResult<Self> {
        let config = ModelConfig::new(input_size, hidden_size, classes.len())?;
        let mut rng = StdRng::seed_from_u64(seed);
        let cell = LstmCell::new(input_size, hidden_size, &mut rng);
        let output = Dense::new(hidden_size, classes.len(), &mut rng);

        Ok(Self {
            config,
            classes,
            cell,
            output,
        })
    }

    fn check_sequence(&self, sequence: &FeatureSequence) -> TscResult<()> {
        if sequence.is_empty() {
            return Err(TscError::Model {
                message: "cannot classify an empty feature sequence".to_string(),
            });
        }
        if sequence.width() != self.config.input_size {
            return Err(TscError::Model {
                message: format!(
                    "feature width {} does not match model input size {}",
                    sequence.width(),
                    self.config.input_size
                ),
            });
        }
        Ok(())
    }

    /// Run the sequence through the LSTM, keeping per-step caches.
    /// Returns (final hidden state, caches).
    pub(crate) fn run_sequence(
        &self,
        sequence: &FeatureSequence,
    ) -> (Array1<f32>, Vec<StepCache>) {
        let (mut h, mut c) = self.cell.init_state();
        let mut caches = Vec::with_capacity(sequence.len());

        for step in sequence.iter() {
            let x = Array1::from(step.to_vec());
            let (h_next, c_next, cache) = self.cell.forward_step(&x, &h, &c);
            caches.push(cache);
            h = h_next;
            c = c_next;
        }

        (h, caches)
    }

    /// Class probability distribution at the final time step
    pub fn forward(&self, sequence: &FeatureSequence) -> TscResult<Array1<f32>> {
        self.check_sequence(sequence)?;
        let (hidden, _) = self.run_sequence(sequence);
        Ok(softmax(&self.output.forward(&hidden)))
    }

    /// Index of the most probable class
    pub fn predict(&self, sequence: &FeatureSequence) -> TscResult<usize> {
        let probs = self.forward(sequence)?;
        let best = probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);
        Ok(best)
    }

    /// Label of the most probable class
    pub fn predict_label(&self, sequence: &FeatureSequence) -> TscResult<&str> {
        let index = self.predict(sequence)?;
        Ok(self.classes[index].as_str())
    }

    /// Serialize the model to a JSON checkpoint
    pub fn save(&self, path: impl AsRef<Path>) -> TscResult<()> {
        let path = path.as_ref();
        let encoded = serde_json::to_string(self).map_err(|e| TscError::Model {
            message: format!("checkpoint serialization failed: {}", e),
        })?;
        std::fs::write(path, encoded).map_err(|e| TscError::Model {
            message: format!("cannot write checkpoint {}: {}", path.display(), e),
        })
    }

    /// Load a model from a JSON checkpoint
    pub fn load(path: impl AsRef<Path>) -> TscResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| TscError::Model {
            message: format!("cannot read checkpoint {}: {}", path.display(), e),
        })?;
        serde_json::from_str(&data).map_err(|e| TscError::Model {
            message: format!("checkpoint parse failed: {}", e),
        })
    }
}
