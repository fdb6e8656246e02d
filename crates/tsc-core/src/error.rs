//! Error handling for the classification pipeline
//!
//! All errors are fail-fast at the boundary where they are detected;
//! no retry or recovery semantics.

use core::fmt;

/// Result type alias for pipeline operations
pub type TscResult<T> = Result<T, TscError>;

/// Error type covering every pipeline stage
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TscError {
    /// Malformed signal input (zero length, non-finite samples, bad shape)
    InvalidSignal {
        /// Description of the signal problem
        reason: String,
    },

    /// A declared class has no examples to sample from
    EmptyClass {
        /// Label of the empty class
        label: String,
    },

    /// Evaluation label sets are inconsistent
    LabelMismatch {
        /// Description of the mismatch
        reason: String,
    },

    /// Invalid configuration value
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Dataset file could not be parsed
    DataFormat {
        /// Description of the format problem
        message: String,
    },

    /// Model shape or state error
    Model {
        /// Description of the model error
        message: String,
    },
}

impl fmt::Display for TscError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TscError::InvalidSignal { reason } => {
                write!(f, "Invalid signal: {}", reason)
            }
            TscError::EmptyClass { label } => {
                write!(f, "Class '{}' has no examples", label)
            }
            TscError::LabelMismatch { reason } => {
                write!(f, "Label mismatch: {}", reason)
            }
            TscError::Config { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            TscError::DataFormat { message } => {
                write!(f, "Dataset format error: {}", message)
            }
            TscError::Model { message } => {
                write!(f, "Model error: {}", message)
            }
        }
    }
}

impl std::error::Error for TscError {}
