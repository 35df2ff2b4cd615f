//! Calibration errors.

use thiserror::Error;

use crate::arbiter::Relay;

/// A calibration defect caught before the core runs.
///
/// The core itself has no failing transitions. These are design-time
/// mistakes that would otherwise show up as an output that never becomes
/// valid, or never lets go.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalibrationError {
    /// The channel would never integrate anything
    #[error("{relay} gain must be > 0")]
    ZeroGain { relay: Relay },

    /// Leak shift must be 1..=15
    #[error("{relay} leak shift {shift} outside 1..=15")]
    LeakShiftOutOfRange { relay: Relay, shift: u8 },

    /// The channel would fire on an empty accumulator
    #[error("{relay} threshold must be > 0")]
    ZeroThreshold { relay: Relay },

    /// No alpha drives the channel
    #[error("{relay} band {lo}..={hi} is empty")]
    EmptyBand { relay: Relay, lo: u8, hi: u8 },

    /// Undriven leak rounds to zero at this threshold, so the channel
    /// could stay fired forever
    #[error("{relay} threshold {threshold} below leak floor {floor}")]
    ThresholdBelowLeakFloor {
        relay: Relay,
        threshold: u16,
        floor: u32,
    },
}
