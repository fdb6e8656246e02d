//! LSTM sequence classifier, trainer and evaluation metrics

pub mod classifier;
pub mod config;
pub mod dense;
pub mod lstm;
pub mod metrics;
pub mod trainer;

pub use classifier::SequenceClassifier;
pub use config::{ModelConfig, TrainConfig};
pub use metrics::{classification_report, ClassificationReport};
pub use trainer::{Trainer, TrainingSummary};
