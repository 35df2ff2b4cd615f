//! Leaky-integrate-and-fire accumulator channel.
//!
//! Each cycle:
//!
//! ```text
//! acc' = clamp(acc + drive(α) − (acc >> leak_shift), 0, MAX)
//! fired' = acc' ≥ threshold
//! ```
//!
//! `drive(α)` is `gain × α` inside the channel's band and zero outside it.
//! The leak is a right shift, so `leak_c = 2^-leak_shift`.
//!
//! # Convergence
//!
//! With constant α the fixed point is `ss = drive(α) << leak_shift`.
//! Writing `acc = ss − e`, one step gives `e' = e − ceil(e / 2^k)`, so from
//! below the accumulator climbs monotonically and lands on `ss` exactly.
//! From above it decays into `[ss, ss + 2^k − 1]` and stops there.
//!
//! `fired` is a comparator, not a latch: it drops on the cycle the
//! accumulator falls back under the threshold.

use crate::calibration::ChannelCalibration;

/// Saturation ceiling of the accumulator.
pub const ACCUMULATOR_MAX: u16 = u16::MAX;

/// One channel's mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelState {
    /// Fixed-point magnitude, `0..=ACCUMULATOR_MAX`
    pub accumulator: u16,
    /// `accumulator >= threshold` as of the last step
    pub fired: bool,
}

impl ChannelState {
    /// Reset state.
    pub const ZERO: Self = Self {
        accumulator: 0,
        fired: false,
    };

    /// Advance one cycle. Pure: the result depends only on `self`, `alpha`
    /// and the calibration.
    #[inline]
    pub fn step(self, alpha: u8, calibration: &ChannelCalibration) -> Self {
        let accumulator = integrate(self.accumulator, alpha, calibration);
        Self {
            accumulator,
            fired: accumulator >= calibration.threshold,
        }
    }
}

/// The accumulator recurrence on its own.
#[inline]
pub fn integrate(accumulator: u16, alpha: u8, calibration: &ChannelCalibration) -> u16 {
    let acc = u32::from(accumulator);
    // acc - (acc >> k) >= 0 for any k, so only the top needs clamping
    let next = acc - (acc >> calibration.leak_shift) + calibration.drive(alpha);
    next.min(u32::from(ACCUMULATOR_MAX)) as u16
}

/// One step with no drive.
#[inline]
pub fn decay(accumulator: u16, leak_shift: u8) -> u16 {
    accumulator - (accumulator >> leak_shift)
}
