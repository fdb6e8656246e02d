//! Synthetic waveform snippets for the four-class classification task

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use tsc_core::{Dataset, LabeledSignal, Signal, TscResult};

/// The four waveform families the classifier discriminates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveformClass {
    /// Pure sinusoid
    Sine,
    /// Square wave
    Square,
    /// Sawtooth ramp
    Sawtooth,
    /// Two close sinusoids producing a beat envelope
    Beat,
}

impl WaveformClass {
    pub fn label(&self) -> &'static str {
        match self {
            WaveformClass::Sine => "sine",
            WaveformClass::Square => "square",
            WaveformClass::Sawtooth => "sawtooth",
            WaveformClass::Beat => "beat",
        }
    }

    pub fn all() -> [WaveformClass; 4] {
        [
            WaveformClass::Sine,
            WaveformClass::Square,
            WaveformClass::Sawtooth,
            WaveformClass::Beat,
        ]
    }

    /// Clean waveform value at time `t` for fundamental `freq`.
    /// `detune` is the second-tone offset used by the beat class.
    fn sample(&self, freq: f32, detune: f32, t: f32) -> f32 {
        let phase = freq * t;
        match self {
            WaveformClass::Sine => (2.0 * PI * phase).sin(),
            WaveformClass::Square => {
                if (2.0 * PI * phase).sin() >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveformClass::Sawtooth => 2.0 * (phase - (phase + 0.5).floor()),
            WaveformClass::Beat => {
                0.5 * (2.0 * PI * phase).sin() + 0.5 * (2.0 * PI * (freq + detune) * t).sin()
            }
        }
    }
}

/// Seeded generator for labeled waveform snippets.
///
/// Fundamental frequency, amplitude and length are randomized per snippet
/// so no two examples are sample-identical; Gaussian noise is added on top.
pub struct WaveformGenerator {
    sampling_rate: f32,
    noise_std: f32,
    rng: StdRng,
}

impl WaveformGenerator {
    pub fn new(sampling_rate: f32, noise_std: f32, seed: u64) -> Self {
        Self {
            sampling_rate,
            noise_std,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// One randomized snippet of the given class
    pub fn generate(&mut self, class: WaveformClass) -> TscResult<Signal> {
        let freq = self.rng.gen_range(3.0..18.0);
        let amplitude = self.rng.gen_range(0.6..1.4);
        let detune = self.rng.gen_range(0.5..2.0);
        let duration = self.rng.gen_range(0.8..1.6);
        let samples = (duration * self.sampling_rate) as usize;

        let noise = Normal::new(0.0, self.noise_std).map_err(|e| tsc_core::TscError::Config {
            message: format!("bad noise level: {}", e),
        })?;

        let data: Vec<f32> = (0..samples)
            .map(|i| {
                let t = i as f32 / self.sampling_rate;
                amplitude * class.sample(freq, detune, t) + noise.sample(&mut self.rng)
            })
            .collect();

        Signal::mono(data, self.sampling_rate)
    }

    /// Build a labeled dataset with the requested per-class counts
    pub fn generate_dataset(&mut self, counts: &[(WaveformClass, usize)]) -> TscResult<Dataset> {
        let mut examples = Vec::new();
        for (class, count) in counts {
            for _ in 0..*count {
                let signal = self.generate(*class)?;
                examples.push(LabeledSignal::new(signal, class.label()));
            }
        }
        Dataset::new(examples)
    }

    /// Imbalanced four-class dataset: the first class dominates
    pub fn imbalanced_dataset(&mut self, majority: usize, minority: usize) -> TscResult<Dataset> {
        let [a, b, c, d] = WaveformClass::all();
        self.generate_dataset(&[(a, majority), (b, minority), (c, minority), (d, minority)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_produces_finite_variable_length() {
        let mut generator = WaveformGenerator::new(128.0, 0.05, 42);
        let signal = generator.generate(WaveformClass::Sine).unwrap();

        assert!(signal.is_finite());
        assert!(signal.samples_per_channel() >= (0.8 * 128.0) as usize);
        assert!(signal.samples_per_channel() <= (1.6 * 128.0) as usize + 1);
    }

    #[test]
    fn test_seed_determinism() {
        let mut gen_a = WaveformGenerator::new(128.0, 0.05, 7);
        let mut gen_b = WaveformGenerator::new(128.0, 0.05, 7);

        let a = gen_a.generate(WaveformClass::Square).unwrap();
        let b = gen_b.generate(WaveformClass::Square).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_dataset_counts_and_labels() {
        let mut generator = WaveformGenerator::new(128.0, 0.05, 1);
        let dataset = generator.imbalanced_dataset(8, 3).unwrap();

        let counts = dataset.class_counts();
        assert_eq!(counts["sine"], 8);
        assert_eq!(counts["square"], 3);
        assert_eq!(counts["sawtooth"], 3);
        assert_eq!(counts["beat"], 3);
        assert_eq!(dataset.labels().len(), 4);
    }

    #[test]
    fn test_square_wave_is_clipped_shape() {
        // Noise-free square wave only takes two values (± amplitude)
        let mut generator = WaveformGenerator::new(128.0, 0.0, 3);
        let signal = generator.generate(WaveformClass::Square).unwrap();

        let max = signal.data.iter().cloned().fold(f32::MIN, f32::max);
        let min = signal.data.iter().cloned().fold(f32::MAX, f32::min);
        assert!(max > 0.5 && min < -0.5);
        for &x in &signal.data {
            assert!((x - max).abs() < 1e-5 || (x - min).abs() < 1e-5);
        }
    }
}
