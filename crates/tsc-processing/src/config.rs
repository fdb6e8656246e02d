//! Feature extraction configuration

use serde::{Deserialize, Serialize};
use tsc_core::{TscError, TscResult};

/// Windowing parameters for spectral-moment extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Window size in samples
    pub window_size: usize,
    /// Hop between consecutive windows in samples
    pub hop_size: usize,
}

impl FeatureConfig {
    pub fn new(window_size: usize, hop_size: usize) -> TscResult<Self> {
        let config = Self {
            window_size,
            hop_size,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate windowing parameters
    pub fn validate(&self) -> TscResult<()> {
        if self.window_size == 0 {
            return Err(TscError::Config {
                message: "window size must be greater than 0".to_string(),
            });
        }
        if self.hop_size == 0 {
            return Err(TscError::Config {
                message: "hop size must be greater than 0".to_string(),
            });
        }
        if self.hop_size > self.window_size {
            return Err(TscError::Config {
                message: format!(
                    "hop size {} exceeds window size {}",
                    self.hop_size, self.window_size
                ),
            });
        }
        Ok(())
    }

    /// Preset for ECG traces sampled around 250-360 Hz
    pub fn ecg() -> Self {
        Self {
            window_size: 128,
            hop_size: 64,
        }
    }

    /// Preset for short synthetic waveform snippets
    pub fn waveform() -> Self {
        Self {
            window_size: 64,
            hop_size: 32,
        }
    }

    /// Number of windows produced for a channel of `samples` samples.
    /// Signals shorter than one window still yield a single whole-signal
    /// window; nothing is resampled.
    pub fn window_count(&self, samples: usize) -> usize {
        if samples == 0 {
            0
        } else if samples < self.window_size {
            1
        } else {
            (samples - self.window_size) / self.hop_size + 1
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self::ecg()
    }
}
