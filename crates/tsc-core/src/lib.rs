//! Core data model for the time-series classification pipeline

pub mod balance;
pub mod dataset;
pub mod error;
pub mod features;
pub mod io;
pub mod signal;

pub use balance::oversample;
pub use dataset::{Dataset, LabeledSignal};
pub use error::{TscError, TscResult};
pub use features::FeatureSequence;
pub use signal::Signal;
