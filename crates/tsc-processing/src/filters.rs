//! Digital pre-filters for signal conditioning
//!
//! Biquad-based IIR filters applied before feature extraction: a bandpass
//! to isolate the band of interest and a notch for powerline interference.

use crate::transform::SignalTransform;
use serde::{Deserialize, Serialize};
use tsc_core::{Signal, TscError, TscResult};

/// Bandpass configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandpassConfig {
    /// Low cutoff (Hz)
    pub low_cutoff: f32,
    /// High cutoff (Hz)
    pub high_cutoff: f32,
}

/// Single biquad section (2nd order)
#[derive(Debug, Clone)]
struct BiquadSection {
    // Coefficients: y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    // State per channel
    x1: Vec<f32>,
    x2: Vec<f32>,
    y1: Vec<f32>,
    y2: Vec<f32>,
}

impl BiquadSection {
    fn new(channel_count: usize) -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: vec![0.0; channel_count],
            x2: vec![0.0; channel_count],
            y1: vec![0.0; channel_count],
            y2: vec![0.0; channel_count],
        }
    }

    fn process_sample(&mut self, input: f32, channel: usize) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1[channel] + self.b2 * self.x2[channel]
            - self.a1 * self.y1[channel]
            - self.a2 * self.y2[channel];

        self.x2[channel] = self.x1[channel];
        self.x1[channel] = input;
        self.y2[channel] = self.y1[channel];
        self.y1[channel] = output;

        output
    }

    fn reset(&mut self) {
        self.x1.fill(0.0);
        self.x2.fill(0.0);
        self.y1.fill(0.0);
        self.y2.fill(0.0);
    }
}

/// Second-order bandpass filter (constant peak gain).
///
/// Center frequency is the geometric mean of the cutoffs, Q = f0 / bandwidth.
pub struct BandpassFilter {
    filter_config: BandpassConfig,
    biquad: BiquadSection,
    sampling_rate: f32,
    initialized: bool,
}

impl BandpassFilter {
    pub fn new(low_cutoff: f32, high_cutoff: f32) -> TscResult<Self> {
        if !(low_cutoff > 0.0) {
            return Err(TscError::Config {
                message: "low cutoff must be positive".to_string(),
            });
        }
        if low_cutoff >= high_cutoff {
            return Err(TscError::Config {
                message: format!(
                    "low cutoff {} Hz must be below high cutoff {} Hz",
                    low_cutoff, high_cutoff
                ),
            });
        }

        Ok(Self {
            filter_config: BandpassConfig {
                low_cutoff,
                high_cutoff,
            },
            biquad: BiquadSection::new(0),
            sampling_rate: 0.0,
            initialized: false,
        })
    }

    fn initialize(&mut self, sampling_rate: f32, channel_count: usize) -> TscResult<()> {
        let high = self.filter_config.high_cutoff;
        if high >= sampling_rate / 2.0 {
            return Err(TscError::Config {
                message: format!(
                    "high cutoff {} Hz must be below the Nyquist frequency {} Hz",
                    high,
                    sampling_rate / 2.0
                ),
            });
        }

        let low = self.filter_config.low_cutoff;
        let center = (low * high).sqrt();
        let q = center / (high - low);

        let omega = 2.0 * std::f32::consts::PI * center / sampling_rate;
        let alpha = omega.sin() / (2.0 * q);
        let cos_omega = omega.cos();

        let a0 = 1.0 + alpha;
        let mut biquad = BiquadSection::new(channel_count);
        biquad.b0 = alpha / a0;
        biquad.b1 = 0.0;
        biquad.b2 = -alpha / a0;
        biquad.a1 = -2.0 * cos_omega / a0;
        biquad.a2 = (1.0 - alpha) / a0;

        self.biquad = biquad;
        self.sampling_rate = sampling_rate;
        self.initialized = true;
        Ok(())
    }
}

impl SignalTransform for BandpassFilter {
    fn apply(&mut self, input: &Signal) -> TscResult<Signal> {
        if !self.initialized
            || self.sampling_rate != input.sampling_rate
            || self.biquad.x1.len() != input.channel_count
        {
            self.initialize(input.sampling_rate, input.channel_count)?;
        }

        let channels = input.all_channels()?;
        let filtered: Vec<Vec<f32>> = channels
            .iter()
            .enumerate()
            .map(|(ch, data)| {
                data.iter()
                    .map(|&sample| self.biquad.process_sample(sample, ch))
                    .collect()
            })
            .collect();

        input.from_channels(filtered)
    }

    fn name(&self) -> &str {
        "bandpass"
    }

    fn reset(&mut self) {
        self.biquad.reset();
    }
}

/// Notch filter for powerline interference removal
pub struct NotchFilter {
    notch_freq: f32,
    q_factor: f32,
    biquad: BiquadSection,
    sampling_rate: f32,
    initialized: bool,
}

impl NotchFilter {
    /// Create a notch at the given frequency (typically 50 or 60 Hz)
    pub fn new(notch_freq: f32, q_factor: f32) -> TscResult<Self> {
        if !(notch_freq > 0.0) || !(q_factor > 0.0) {
            return Err(TscError::Config {
                message: "notch frequency and Q must be positive".to_string(),
            });
        }

        Ok(Self {
            notch_freq,
            q_factor,
            biquad: BiquadSection::new(0),
            sampling_rate: 0.0,
            initialized: false,
        })
    }

    fn initialize(&mut self, sampling_rate: f32, channel_count: usize) -> TscResult<()> {
        if self.notch_freq >= sampling_rate / 2.0 {
            return Err(TscError::Config {
                message: format!(
                    "notch frequency {} Hz must be below the Nyquist frequency {} Hz",
                    self.notch_freq,
                    sampling_rate / 2.0
                ),
            });
        }

        let omega = 2.0 * std::f32::consts::PI * self.notch_freq / sampling_rate;
        let alpha = omega.sin() / (2.0 * self.q_factor);
        let cos_omega = omega.cos();

        let a0 = 1.0 + alpha;
        let mut biquad = BiquadSection::new(channel_count);
        biquad.b0 = 1.0 / a0;
        biquad.b1 = -2.0 * cos_omega / a0;
        biquad.b2 = 1.0 / a0;
        biquad.a1 = -2.0 * cos_omega / a0;
        biquad.a2 = (1.0 - alpha) / a0;

        self.biquad = biquad;
        self.sampling_rate = sampling_rate;
        self.initialized = true;
        Ok(())
    }
}

impl SignalTransform for NotchFilter {
    fn apply(&mut self, input: &Signal) -> TscResult<Signal> {
        if !self.initialized
            || self.sampling_rate != input.sampling_rate
            || self.biquad.x1.len() != input.channel_count
        {
            self.initialize(input.sampling_rate, input.channel_count)?;
        }

        let channels = input.all_channels()?;
        let filtered: Vec<Vec<f32>> = channels
            .iter()
            .enumerate()
            .map(|(ch, data)| {
                data.iter()
                    .map(|&sample| self.biquad.process_sample(sample, ch))
                    .collect()
            })
            .collect();

        input.from_channels(filtered)
    }

    fn name(&self) -> &str {
        "notch"
    }

    fn reset(&mut self) {
        self.biquad.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, fs: f32, seconds: f32) -> Signal {
        let samples = (fs * seconds) as usize;
        let data: Vec<f32> = (0..samples)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / fs).sin())
            .collect();
        Signal::mono(data, fs).unwrap()
    }

    fn tail_rms(signal: &Signal, skip: usize) -> f32 {
        let data = &signal.data[skip..];
        (data.iter().map(|x| x * x).sum::<f32>() / data.len() as f32).sqrt()
    }

    #[test]
    fn test_bandpass_passes_in_band() {
        let mut filter = BandpassFilter::new(5.0, 15.0).unwrap();
        let input = sine(9.0, 250.0, 4.0);
        let output = filter.apply(&input).unwrap();

        // Skip the first second of transient
        let rms = tail_rms(&output, 250);
        assert!(rms > 0.5, "in-band RMS too low: {}", rms);
    }

    #[test]
    fn test_bandpass_attenuates_out_of_band() {
        let mut filter = BandpassFilter::new(5.0, 15.0).unwrap();
        let input = sine(60.0, 250.0, 4.0);
        let output = filter.apply(&input).unwrap();

        let rms = tail_rms(&output, 250);
        assert!(rms < 0.3, "out-of-band RMS too high: {}", rms);
    }

    #[test]
    fn test_bandpass_rejects_bad_config() {
        assert!(BandpassFilter::new(15.0, 5.0).is_err());
        assert!(BandpassFilter::new(0.0, 5.0).is_err());

        // High cutoff above Nyquist fails at apply time
        let mut filter = BandpassFilter::new(5.0, 200.0).unwrap();
        let input = sine(10.0, 250.0, 1.0);
        assert!(matches!(filter.apply(&input), Err(TscError::Config { .. })));
    }

    #[test]
    fn test_notch_removes_powerline() {
        let mut filter = NotchFilter::new(50.0, 10.0).unwrap();
        let input = sine(50.0, 500.0, 4.0);
        let output = filter.apply(&input).unwrap();

        let rms = tail_rms(&output, 500);
        assert!(rms < 0.1, "notched RMS too high: {}", rms);
    }

    #[test]
    fn test_notch_passes_distant_frequency() {
        let mut filter = NotchFilter::new(50.0, 10.0).unwrap();
        let input = sine(5.0, 500.0, 4.0);
        let output = filter.apply(&input).unwrap();

        let rms = tail_rms(&output, 500);
        assert!(rms > 0.5, "pass-band RMS too low: {}", rms);
    }

    #[test]
    fn test_filter_reset_clears_state() {
        let mut filter = BandpassFilter::new(5.0, 15.0).unwrap();
        let input = sine(9.0, 250.0, 1.0);

        let first = filter.apply(&input).unwrap();
        filter.reset();
        let second = filter.apply(&input).unwrap();

        assert_eq!(first.data, second.data);
    }
}
