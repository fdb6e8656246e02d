//! Labeled signal collections and train/test splitting

use crate::error::{TscError, TscResult};
use crate::signal::Signal;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A signal paired with its categorical class label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledSignal {
    pub signal: Signal,
    pub label: String,
}

impl LabeledSignal {
    pub fn new(signal: Signal, label: impl Into<String>) -> Self {
        Self {
            signal,
            label: label.into(),
        }
    }
}

/// Collection of labeled signals with a fixed, ordered label set.
///
/// Invariant: every example's label belongs to the declared set, and no
/// label is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    examples: Vec<LabeledSignal>,
    labels: Vec<String>,
}

impl Dataset {
    /// Build a dataset, inferring the label set from the examples
    /// (sorted unique labels).
    pub fn new(examples: Vec<LabeledSignal>) -> TscResult<Self> {
        let mut labels: Vec<String> = examples.iter().map(|e| e.label.clone()).collect();
        labels.sort();
        labels.dedup();
        Self::with_labels(examples, labels)
    }

    /// Build a dataset against an explicit label set. Labels outside the
    /// set are rejected; declared labels may have zero examples (the
    /// balancer reports those as empty classes).
    pub fn with_labels(examples: Vec<LabeledSignal>, labels: Vec<String>) -> TscResult<Self> {
        if labels.is_empty() {
            return Err(TscError::Config {
                message: "dataset label set cannot be empty".to_string(),
            });
        }
        if labels.iter().any(|l| l.is_empty()) {
            return Err(TscError::Config {
                message: "labels cannot be empty strings".to_string(),
            });
        }
        for example in &examples {
            if !labels.iter().any(|l| l == &example.label) {
                return Err(TscError::LabelMismatch {
                    reason: format!(
                        "example label '{}' is not in the declared label set",
                        example.label
                    ),
                });
            }
        }

        Ok(Self { examples, labels })
    }

    /// Ordered label set
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// All examples in insertion order
    pub fn examples(&self) -> &[LabeledSignal] {
        &self.examples
    }

    /// Number of examples
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// True when the dataset holds no examples
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Index of a label within the declared set
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Example count per declared label (zero-count classes included)
    pub fn class_counts(&self) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> =
            self.labels.iter().map(|l| (l.clone(), 0)).collect();
        for example in &self.examples {
            *counts.get_mut(&example.label).expect("label validated") += 1;
        }
        counts
    }

    /// Shuffle and split into train/test portions. Deterministic for a
    /// fixed seed. `train_fraction` must lie in (0, 1).
    pub fn split(&self, train_fraction: f32, seed: u64) -> TscResult<(Dataset, Dataset)> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(TscError::Config {
                message: format!("train fraction must be in (0, 1), got {}", train_fraction),
            });
        }

        let mut shuffled = self.examples.clone();
        let mut rng = StdRng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);

        let train_len = ((shuffled.len() as f32) * train_fraction).round() as usize;
        let train_len = train_len.clamp(1, shuffled.len().saturating_sub(1).max(1));
        let test = shuffled.split_off(train_len.min(shuffled.len()));

        Ok((
            Dataset {
                examples: shuffled,
                labels: self.labels.clone(),
            },
            Dataset {
                examples: test,
                labels: self.labels.clone(),
            },
        ))
    }

    /// Consume the dataset, yielding its examples
    pub fn into_examples(self) -> Vec<LabeledSignal> {
        self.examples
    }
}
