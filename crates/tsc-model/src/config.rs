//! Model and training configuration

use serde::{Deserialize, Serialize};
use tsc_core::{TscError, TscResult};

/// Network dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Feature vector width consumed per time step
    pub input_size: usize,
    /// Hidden/cell state size
    pub hidden_size: usize,
    /// Number of output classes
    pub num_classes: usize,
}

impl ModelConfig {
    pub fn new(input_size: usize, hidden_size: usize, num_classes: usize) -> TscResult<Self> {
        if input_size == 0 || hidden_size == 0 {
            return Err(TscError::Config {
                message: "input and hidden sizes must be greater than 0".to_string(),
            });
        }
        if num_classes < 2 {
            return Err(TscError::Config {
                message: format!("need at least 2 classes, got {}", num_classes),
            });
        }
        Ok(Self {
            input_size,
            hidden_size,
            num_classes,
        })
    }
}

/// Gradient-descent training parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Number of passes over the training data
    pub epochs: usize,
    /// Sequences per mini-batch
    pub batch_size: usize,
    /// SGD learning rate
    pub learning_rate: f32,
    /// Global gradient-norm clip threshold
    pub clip_norm: f32,
    /// Seed for weight init and shuffling
    pub seed: u64,
    /// Shuffle examples each epoch
    pub shuffle: bool,
}

impl TrainConfig {
    pub fn validate(&self) -> TscResult<()> {
        if self.epochs == 0 {
            return Err(TscError::Config {
                message: "epochs must be greater than 0".to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(TscError::Config {
                message: "batch size must be greater than 0".to_string(),
            });
        }
        if !(self.learning_rate > 0.0) {
            return Err(TscError::Config {
                message: format!("learning rate must be positive, got {}", self.learning_rate),
            });
        }
        if !(self.clip_norm > 0.0) {
            return Err(TscError::Config {
                message: "clip norm must be positive".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 30,
            batch_size: 16,
            learning_rate: 0.05,
            clip_norm: 5.0,
            seed: 42,
            shuffle: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_validation() {
        assert!(ModelConfig::new(2, 16, 2).is_ok());
        assert!(ModelConfig::new(0, 16, 2).is_err());
        assert!(ModelConfig::new(2, 16, 1).is_err());
    }

    #[test]
    fn test_train_config_defaults_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_train_config_rejects_zero_lr() {
        let config = TrainConfig {
            learning_rate: 0.0,
            ..TrainConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
