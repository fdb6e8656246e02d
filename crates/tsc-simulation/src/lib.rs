//! Synthetic dataset generation for pipeline development and testing

pub mod ecg;
pub mod waveform;

pub use ecg::{EcgGenerator, EcgRhythm};
pub use waveform::{WaveformClass, WaveformGenerator};
