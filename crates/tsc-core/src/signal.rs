//! Signal: core container for sampled time-series data

use crate::error::{TscError, TscResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Universal container for a sampled, possibly multi-channel signal.
///
/// Samples are stored interleaved: `[ch0_s0, ch1_s0, ch0_s1, ch1_s1, ...]`.
/// Lengths vary freely across signals; nothing in the pipeline resamples
/// to a fixed length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Unique identifier for this signal
    pub id: Uuid,
    /// Interleaved sample data
    pub data: Vec<f32>,
    /// Number of channels
    pub channel_count: usize,
    /// Sampling rate in Hz
    pub sampling_rate: f32,
}

impl Signal {
    /// Create a new signal, validating shape and rate
    pub fn new(data: Vec<f32>, channel_count: usize, sampling_rate: f32) -> TscResult<Self> {
        if data.is_empty() {
            return Err(TscError::InvalidSignal {
                reason: "signal has zero length".to_string(),
            });
        }
        if channel_count == 0 {
            return Err(TscError::InvalidSignal {
                reason: "channel count must be at least 1".to_string(),
            });
        }
        if data.len() % channel_count != 0 {
            return Err(TscError::InvalidSignal {
                reason: format!(
                    "data length {} is not divisible by channel count {}",
                    data.len(),
                    channel_count
                ),
            });
        }
        if !(sampling_rate > 0.0) {
            return Err(TscError::InvalidSignal {
                reason: format!("sampling rate must be positive, got {}", sampling_rate),
            });
        }

        Ok(Signal {
            id: Uuid::new_v4(),
            data,
            channel_count,
            sampling_rate,
        })
    }

    /// Convenience constructor for single-channel signals
    pub fn mono(data: Vec<f32>, sampling_rate: f32) -> TscResult<Self> {
        Self::new(data, 1, sampling_rate)
    }

    /// Total number of samples across all channels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether the signal carries any samples
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of samples per channel
    pub fn samples_per_channel(&self) -> usize {
        self.data.len() / self.channel_count
    }

    /// Signal duration in seconds
    pub fn duration(&self) -> f32 {
        self.samples_per_channel() as f32 / self.sampling_rate
    }

    /// True when every sample is finite
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Extract data for a specific channel
    pub fn channel_data(&self, channel_index: usize) -> TscResult<Vec<f32>> {
        if channel_index >= self.channel_count {
            return Err(TscError::InvalidSignal {
                reason: format!(
                    "channel index {} out of bounds (0-{})",
                    channel_index,
                    self.channel_count - 1
                ),
            });
        }

        let samples_per_channel = self.samples_per_channel();
        let mut channel_data = Vec::with_capacity(samples_per_channel);

        for sample_idx in 0..samples_per_channel {
            channel_data.push(self.data[sample_idx * self.channel_count + channel_index]);
        }

        Ok(channel_data)
    }

    /// All channels as separate vectors
    pub fn all_channels(&self) -> TscResult<Vec<Vec<f32>>> {
        let mut channels = Vec::with_capacity(self.channel_count);
        for ch in 0..self.channel_count {
            channels.push(self.channel_data(ch)?);
        }
        Ok(channels)
    }

    /// Rebuild a signal from per-channel vectors, re-interleaving the data.
    /// Keeps the sampling rate of `self` but assigns a fresh id.
    pub fn from_channels(&self, channels: Vec<Vec<f32>>) -> TscResult<Signal> {
        let channel_count = channels.len();
        if channel_count == 0 {
            return Err(TscError::InvalidSignal {
                reason: "no channels supplied".to_string(),
            });
        }
        let samples = channels[0].len();
        if channels.iter().any(|c| c.len() != samples) {
            return Err(TscError::InvalidSignal {
                reason: "channel lengths differ".to_string(),
            });
        }

        let mut data = Vec::with_capacity(samples * channel_count);
        for sample_idx in 0..samples {
            for channel in &channels {
                data.push(channel[sample_idx]);
            }
        }

        Signal::new(data, channel_count, self.sampling_rate)
    }
}
