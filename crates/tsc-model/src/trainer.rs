//! Mini-batch gradient training for the sequence classifier

use crate::classifier::SequenceClassifier;
use crate::config::TrainConfig;
use crate::dense::{cross_entropy, softmax, DenseGradients};
use crate::lstm::LstmGradients;
use ndarray::{s, Array3};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};
use tsc_core::{FeatureSequence, TscError, TscResult};

/// Per-epoch loss history of one training run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epoch_losses: Vec<f32>,
}

impl TrainingSummary {
    pub fn final_loss(&self) -> f32 {
        self.epoch_losses.last().copied().unwrap_or(f32::NAN)
    }
}

/// Trainer: seeded shuffling, padded mini-batches with length masks,
/// averaged gradients, global-norm clipping, plain SGD.
pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> TscResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Train the classifier on `(sequence, class index)` pairs.
    ///
    /// Deterministic for a fixed config seed and a fixed model seed.
    pub fn fit(
        &self,
        model: &mut SequenceClassifier,
        examples: &[(FeatureSequence, usize)],
    ) -> TscResult<TrainingSummary> {
        if examples.is_empty() {
            return Err(TscError::Model {
                message: "no training examples supplied".to_string(),
            });
        }
        for (sequence, target) in examples {
            if sequence.is_empty() {
                return Err(TscError::Model {
                    message: "training set contains an empty feature sequence".to_string(),
                });
            }
            if sequence.width() != model.config.input_size {
                return Err(TscError::Model {
                    message: format!(
                        "feature width {} does not match model input size {}",
                        sequence.width(),
                        model.config.input_size
                    ),
                });
            }
            if *target >= model.config.num_classes {
                return Err(TscError::Model {
                    message: format!(
                        "class index {} out of range for {} classes",
                        target, model.config.num_classes
                    ),
                });
            }
        }

        let mut epoch_losses = Vec::with_capacity(self.config.epochs);
        let mut indices: Vec<usize> = (0..examples.len()).collect();

        for epoch in 0..self.config.epochs {
            if self.config.shuffle {
                let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(epoch as u64));
                indices.shuffle(&mut rng);
            }

            let mut total_loss = 0.0;
            for chunk in indices.chunks(self.config.batch_size) {
                total_loss += self.train_batch(model, examples, chunk)?;
            }

            let epoch_loss = total_loss / examples.len() as f32;
            epoch_losses.push(epoch_loss);
            debug!(epoch = epoch + 1, loss = epoch_loss, "epoch complete");
        }

        info!(
            epochs = self.config.epochs,
            final_loss = epoch_losses.last().copied().unwrap_or(f32::NAN),
            "training finished"
        );

        Ok(TrainingSummary { epoch_losses })
    }

    /// Process one mini-batch; returns the summed loss over its samples.
    fn train_batch(
        &self,
        model: &mut SequenceClassifier,
        examples: &[(FeatureSequence, usize)],
        chunk: &[usize],
    ) -> TscResult<f32> {
        let input_size = model.config.input_size;
        let hidden_size = model.config.hidden_size;
        let num_classes = model.config.num_classes;

        // Pad variable-length sequences into one [batch, max_len, input]
        // block; `lengths` is the mask deciding how far each row is read.
        let max_len = chunk
            .iter()
            .map(|&i| examples[i].0.len())
            .max()
            .unwrap_or(0);
        let mut batch = Array3::<f32>::zeros((chunk.len(), max_len, input_size));
        let mut lengths = Vec::with_capacity(chunk.len());
        for (row, &index) in chunk.iter().enumerate() {
            let sequence = &examples[index].0;
            lengths.push(sequence.len());
            for (t, step) in sequence.iter().enumerate() {
                for (k, &value) in step.iter().enumerate() {
                    batch[[row, t, k]] = value;
                }
            }
        }

        let mut lstm_grads = LstmGradients::zeros(input_size, hidden_size);
        let mut dense_grads = DenseGradients::zeros(hidden_size, num_classes);
        let mut batch_loss = 0.0;

        for (row, &index) in chunk.iter().enumerate() {
            let target = examples[index].1;

            // Masked forward: only the first `lengths[row]` steps are real
            let (mut h, mut c) = model.cell.init_state();
            let mut caches = Vec::with_capacity(lengths[row]);
            for t in 0..lengths[row] {
                let x = batch.slice(s![row, t, ..]).to_owned();
                let (h_next, c_next, cache) = model.cell.forward_step(&x, &h, &c);
                caches.push(cache);
                h = h_next;
                c = c_next;
            }

            let probs = softmax(&model.output.forward(&h));
            batch_loss += cross_entropy(&probs, target);

            let dh = model.output.backward(&h, &probs, target, &mut dense_grads);
            model.cell.backward(&caches, dh, &mut lstm_grads);
        }

        // Average over the batch, clip by global norm, update
        let scale = 1.0 / chunk.len() as f32;
        lstm_grads.scale(scale);
        dense_grads.scale(scale);

        let norm = (lstm_grads.norm_sq() + dense_grads.norm_sq()).sqrt();
        if norm > self.config.clip_norm {
            let factor = self.config.clip_norm / norm;
            lstm_grads.scale(factor);
            dense_grads.scale(factor);
        }

        model
            .cell
            .apply_gradients(&lstm_grads, self.config.learning_rate);
        model
            .output
            .apply_gradients(&dense_grads, self.config.learning_rate);

        Ok(batch_loss)
    }

    /// Convenience: class-index predictions for a slice of sequences
    pub fn predict_all(
        &self,
        model: &SequenceClassifier,
        sequences: &[FeatureSequence],
    ) -> TscResult<Vec<usize>> {
        sequences.iter().map(|s| model.predict(s)).collect()
    }
}
