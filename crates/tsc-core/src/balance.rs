//! Class balancing by minority oversampling

use crate::dataset::Dataset;
use crate::error::{TscError, TscResult};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// Oversample minority classes until every declared class matches the
/// largest class count.
///
/// Resamples with replacement from each minority class; original entries
/// are never removed, duplicates are appended after them. Deterministic
/// for a fixed seed, and a no-op on an already-balanced dataset.
pub fn oversample(dataset: &Dataset, seed: u64) -> TscResult<Dataset> {
    let counts = dataset.class_counts();

    for (label, count) in &counts {
        if *count == 0 {
            return Err(TscError::EmptyClass {
                label: label.clone(),
            });
        }
    }

    let max_count = counts.values().copied().max().unwrap_or(0);
    if counts.values().all(|&c| c == max_count) {
        return Ok(dataset.clone());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut examples = dataset.examples().to_vec();

    // Iterate labels in declared order so the draw sequence is stable
    for label in dataset.labels() {
        let members: Vec<usize> = dataset
            .examples()
            .iter()
            .enumerate()
            .filter(|(_, e)| &e.label == label)
            .map(|(i, _)| i)
            .collect();

        let deficit = max_count - members.len();
        for _ in 0..deficit {
            let pick = members[rng.gen_range(0..members.len())];
            examples.push(dataset.examples()[pick].clone());
        }
    }

    Dataset::with_labels(examples, dataset.labels().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::LabeledSignal;
    use crate::signal::Signal;

    fn sample(label: &str) -> LabeledSignal {
        let signal = Signal::mono(vec![0.5; 8], 100.0).unwrap();
        LabeledSignal::new(signal, label)
    }

    fn imbalanced(normal: usize, afib: usize) -> Dataset {
        let mut examples = Vec::new();
        for _ in 0..normal {
            examples.push(sample("Normal"));
        }
        for _ in 0..afib {
            examples.push(sample("AFib"));
        }
        Dataset::new(examples).unwrap()
    }

    #[test]
    fn test_minority_raised_to_majority() {
        let dataset = imbalanced(9, 4);
        let balanced = oversample(&dataset, 42).unwrap();

        let counts = balanced.class_counts();
        assert_eq!(counts["Normal"], 9);
        assert_eq!(counts["AFib"], 9);
        assert_eq!(balanced.len(), 18);
    }

    #[test]
    fn test_originals_retained() {
        let dataset = imbalanced(5, 2);
        let balanced = oversample(&dataset, 1).unwrap();

        // Original entries survive in order at the front
        for (orig, kept) in dataset.examples().iter().zip(balanced.examples()) {
            assert_eq!(orig.signal.id, kept.signal.id);
        }
    }

    #[test]
    fn test_idempotent_on_balanced_input() {
        let dataset = imbalanced(6, 6);
        let balanced = oversample(&dataset, 3).unwrap();

        assert_eq!(balanced.len(), dataset.len());
        for (a, b) in dataset.examples().iter().zip(balanced.examples()) {
            assert_eq!(a.signal.id, b.signal.id);
        }
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let dataset = imbalanced(8, 3);
        let a = oversample(&dataset, 99).unwrap();
        let b = oversample(&dataset, 99).unwrap();

        assert_eq!(a.len(), b.len());
        for (x, y) in a.examples().iter().zip(b.examples()) {
            assert_eq!(x.signal.id, y.signal.id);
        }
    }

    #[test]
    fn test_empty_class_rejected() {
        let dataset = Dataset::with_labels(
            vec![sample("Normal")],
            vec!["AFib".to_string(), "Normal".to_string()],
        )
        .unwrap();

        let result = oversample(&dataset, 0);
        assert!(matches!(result, Err(TscError::EmptyClass { label }) if label == "AFib"));
    }
}
