//! Error types for the harness.

use relaysel_core::{CalibrationError, Relay};
use thiserror::Error;

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the module.
#[derive(Debug, Error)]
pub enum Error {
    /// Output never became valid within the cycle budget
    #[error("no valid selection for alpha {alpha} within {budget} cycles")]
    SettleTimeout { alpha: u8, budget: u32 },

    /// Output was valid but never showed the expected relay
    #[error("expected {expected} for alpha {alpha} within {budget} cycles, last saw {got:?}")]
    SelectionMismatch {
        alpha: u8,
        expected: Relay,
        got: Option<Relay>,
        budget: u32,
    },

    /// Rejected calibration
    #[error("calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    /// Bad configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
