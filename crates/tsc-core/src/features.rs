//! FeatureSequence: per-timestep feature vectors derived from a Signal

use crate::error::{TscError, TscResult};
use serde::{Deserialize, Serialize};

/// Ordered sequence of fixed-width feature vectors, one per time step.
///
/// The step count is determined by the windowing parameterization of the
/// extractor that produced the sequence, never by resampling the source
/// signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSequence {
    steps: Vec<Vec<f32>>,
    width: usize,
}

impl FeatureSequence {
    /// Create an empty sequence of the given feature width
    pub fn new(width: usize) -> Self {
        Self {
            steps: Vec::new(),
            width,
        }
    }

    /// Append one time step, validating the vector width
    pub fn push_step(&mut self, step: Vec<f32>) -> TscResult<()> {
        if step.len() != self.width {
            return Err(TscError::Model {
                message: format!(
                    "feature vector width {} does not match sequence width {}",
                    step.len(),
                    self.width
                ),
            });
        }
        self.steps.push(step);
        Ok(())
    }

    /// Number of time steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when no steps have been recorded
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Feature vector width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Feature vector at a given time step
    pub fn step(&self, index: usize) -> Option<&[f32]> {
        self.steps.get(index).map(|s| s.as_slice())
    }

    /// Iterate over time steps
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> {
        self.steps.iter().map(|s| s.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_iterate() {
        let mut seq = FeatureSequence::new(2);
        seq.push_step(vec![1.0, 2.0]).unwrap();
        seq.push_step(vec![3.0, 4.0]).unwrap();

        assert_eq!(seq.len(), 2);
        assert_eq!(seq.width(), 2);
        assert_eq!(seq.step(1), Some(&[3.0, 4.0][..]));

        let collected: Vec<_> = seq.iter().collect();
        assert_eq!(collected[0], &[1.0, 2.0]);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let mut seq = FeatureSequence::new(2);
        let result = seq.push_step(vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(TscError::Model { .. })));
    }
}
