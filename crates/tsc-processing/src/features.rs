//! Sliding spectral-moment feature extraction
//!
//! Reduces a raw signal to two time-frequency moments per window per
//! channel: the instantaneous mean frequency (spectral centroid) and the
//! frequency spread around it. Variable-length inputs are handled by the
//! windowing alone; nothing is resampled.

use crate::config::FeatureConfig;
use num_complex::Complex;
use num_traits::Zero;
use rustfft::FftPlanner;
use tsc_core::{FeatureSequence, Signal, TscError, TscResult};

/// Feature extractor producing `2 * channel_count` features per time step
pub struct SpectralMomentExtractor {
    config: FeatureConfig,
    fft_planner: FftPlanner<f32>,
}

impl SpectralMomentExtractor {
    pub fn new(config: FeatureConfig) -> TscResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fft_planner: FftPlanner::new(),
        })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Feature width for a signal with the given channel count
    pub fn feature_width(&self, channel_count: usize) -> usize {
        2 * channel_count
    }

    /// Extract a feature sequence from a signal.
    ///
    /// Fails with `InvalidSignal` when the input is empty or carries
    /// non-finite samples.
    pub fn extract(&mut self, signal: &Signal) -> TscResult<FeatureSequence> {
        if signal.is_empty() {
            return Err(TscError::InvalidSignal {
                reason: "cannot extract features from a zero-length signal".to_string(),
            });
        }
        if !signal.is_finite() {
            return Err(TscError::InvalidSignal {
                reason: "signal contains non-finite samples".to_string(),
            });
        }

        let channels = signal.all_channels()?;
        let samples = signal.samples_per_channel();
        let steps = self.config.window_count(samples);

        // moments[ch][step] = (centroid, spread)
        let mut moments: Vec<Vec<(f32, f32)>> = Vec::with_capacity(channels.len());
        for channel_data in &channels {
            let mut channel_moments = Vec::with_capacity(steps);
            for window in window_slices(channel_data, &self.config) {
                channel_moments.push(self.window_moments(window, signal.sampling_rate));
            }
            moments.push(channel_moments);
        }

        let width = self.feature_width(signal.channel_count);
        let mut sequence = FeatureSequence::new(width);
        for step in 0..steps {
            let mut vector = Vec::with_capacity(width);
            for channel_moments in &moments {
                let (centroid, spread) = channel_moments[step];
                vector.push(centroid);
                vector.push(spread);
            }
            sequence.push_step(vector)?;
        }

        Ok(sequence)
    }

    /// Spectral centroid and spread (both in Hz) of one window
    fn window_moments(&mut self, window: &[f32], sampling_rate: f32) -> (f32, f32) {
        let fft_size = window.len().next_power_of_two();
        let fft = self.fft_planner.plan_fft_forward(fft_size);

        // Hann-windowed, zero-padded input
        let n = window.len();
        let mut fft_input: Vec<Complex<f32>> = window
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let w = if n > 1 {
                    0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / (n - 1) as f32).cos()
                } else {
                    1.0
                };
                Complex::new(x * w, 0.0)
            })
            .collect();
        fft_input.resize(fft_size, Complex::zero());

        fft.process(&mut fft_input);

        let freq_resolution = sampling_rate / fft_size as f32;

        // Power over positive frequencies, DC excluded
        let power_spectrum: Vec<f32> = fft_input[1..fft_size / 2]
            .iter()
            .map(|c| c.norm_sqr())
            .collect();
        let total_power: f32 = power_spectrum.iter().sum();

        if total_power <= 0.0 {
            return (0.0, 0.0);
        }

        let mut weighted_sum = 0.0;
        for (i, &power) in power_spectrum.iter().enumerate() {
            let frequency = (i + 1) as f32 * freq_resolution;
            weighted_sum += frequency * power;
        }
        let centroid = weighted_sum / total_power;

        let mut variance_sum = 0.0;
        for (i, &power) in power_spectrum.iter().enumerate() {
            let frequency = (i + 1) as f32 * freq_resolution;
            variance_sum += (frequency - centroid).powi(2) * power;
        }
        let spread = (variance_sum / total_power).sqrt();

        (centroid, spread)
    }
}

/// Iterate window slices over one channel per the configured hop.
/// Channels shorter than a window yield a single whole-channel slice.
fn window_slices<'a>(
    data: &'a [f32],
    config: &FeatureConfig,
) -> Box<dyn Iterator<Item = &'a [f32]> + 'a> {
    if data.len() < config.window_size {
        Box::new(std::iter::once(data))
    } else {
        let window = config.window_size;
        Box::new(data.windows(window).step_by(config.hop_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, fs: f32, samples: usize) -> Signal {
        let data: Vec<f32> = (0..samples)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / fs).sin())
            .collect();
        Signal::mono(data, fs).unwrap()
    }

    #[test]
    fn test_step_count_matches_windowing() {
        let config = FeatureConfig::new(64, 32).unwrap();
        let mut extractor = SpectralMomentExtractor::new(config).unwrap();

        let signal = tone(10.0, 128.0, 256);
        let sequence = extractor.extract(&signal).unwrap();

        assert_eq!(sequence.len(), config.window_count(256));
        assert_eq!(sequence.len(), 7);
        assert_eq!(sequence.width(), 2);
    }

    #[test]
    fn test_centroid_tracks_tone_frequency() {
        let config = FeatureConfig::new(64, 32).unwrap();
        let mut extractor = SpectralMomentExtractor::new(config).unwrap();

        // 32 Hz tone at 128 Hz sampling: bin-aligned for a 64-point FFT
        let signal = tone(32.0, 128.0, 256);
        let sequence = extractor.extract(&signal).unwrap();

        for step in sequence.iter() {
            let centroid = step[0];
            let spread = step[1];
            assert!(
                (centroid - 32.0).abs() < 4.0,
                "centroid {} far from 32 Hz",
                centroid
            );
            assert!(spread < 10.0, "spread {} too wide for a pure tone", spread);
        }
    }

    #[test]
    fn test_short_signal_single_window() {
        let config = FeatureConfig::new(128, 64).unwrap();
        let mut extractor = SpectralMomentExtractor::new(config).unwrap();

        let signal = tone(10.0, 100.0, 40);
        let sequence = extractor.extract(&signal).unwrap();
        assert_eq!(sequence.len(), 1);
    }

    #[test]
    fn test_multichannel_width() {
        let config = FeatureConfig::new(64, 32).unwrap();
        let mut extractor = SpectralMomentExtractor::new(config).unwrap();

        let data = vec![0.5; 256];
        let signal = Signal::new(data, 2, 128.0).unwrap();
        let sequence = extractor.extract(&signal).unwrap();

        assert_eq!(sequence.width(), 4);
    }

    #[test]
    fn test_non_finite_rejected() {
        let config = FeatureConfig::waveform();
        let mut extractor = SpectralMomentExtractor::new(config).unwrap();

        let signal = Signal::mono(vec![1.0, f32::INFINITY, 0.0, 2.0], 100.0).unwrap();
        let result = extractor.extract(&signal);
        assert!(matches!(result, Err(TscError::InvalidSignal { .. })));
    }

    #[test]
    fn test_silent_window_yields_zero_moments() {
        let config = FeatureConfig::new(64, 32).unwrap();
        let mut extractor = SpectralMomentExtractor::new(config).unwrap();

        let signal = Signal::mono(vec![0.0; 64], 128.0).unwrap();
        let sequence = extractor.extract(&signal).unwrap();

        assert_eq!(sequence.step(0), Some(&[0.0, 0.0][..]));
    }
}
