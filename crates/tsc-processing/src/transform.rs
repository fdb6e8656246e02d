//! Core signal transform trait

use tsc_core::{Signal, TscResult};

/// Trait shared by all signal-to-signal stages (filters, detrenders).
///
/// Implementations keep per-channel state between samples of one `apply`
/// call; `reset` clears it so the same instance can process unrelated
/// signals.
pub trait SignalTransform: Send {
    /// Process a signal and return the transformed result
    fn apply(&mut self, input: &Signal) -> TscResult<Signal>;

    /// Transform name/identifier
    fn name(&self) -> &str;

    /// Reset internal state
    fn reset(&mut self);
}
