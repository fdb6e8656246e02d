//! Signal conditioning and feature extraction
//!
//! Digital pre-filters and the sliding spectral-moment extractor that
//! turns raw signals into per-timestep feature sequences.

pub mod config;
pub mod features;
pub mod filters;
pub mod transform;

pub use config::FeatureConfig;
pub use features::SpectralMomentExtractor;
pub use filters::{BandpassFilter, NotchFilter};
pub use transform::SignalTransform;
