//! Per-channel calibration and the settle bound.
//!
//! Each channel is tuned to a band of alpha. Inside its band it integrates
//! `gain × α`; outside it only leaks. A channel selects α when its steady
//! state `gain × α × 2^leak_shift` reaches its threshold.
//!
//! Default bands:
//! - AF: 0..=69, steady state 16·α, fires for α ≥ 1
//! - CF: 70..=169, steady state 16·α
//! - DF: 170..=255, steady state 32·α
//!
//! α = 0 drives nothing and never selects.
//!
//! # Settle Bound
//!
//! The worst case after reset is the slowest rise from zero. The worst case
//! after a band change is the slower of the new channel's rise and the old
//! channel's fall from its peak. Both run in parallel, so:
//!
//! ```text
//! settle_bound = 1 + max(max_rise, max_fall)
//! ```
//!
//! The leading 1 is the release cycle, on which no integration happens.

use crate::arbiter::Relay;
use crate::channel::{decay, integrate, ACCUMULATOR_MAX};
use crate::error::CalibrationError;

/// Step cap for convergence searches. Far above anything a valid
/// calibration needs.
pub const SEARCH_LIMIT: u32 = 1 << 21;

/// Largest accepted leak shift.
pub const MAX_LEAK_SHIFT: u8 = 15;

/// Inclusive alpha window a channel responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Band {
    /// Lowest alpha in band
    pub lo: u8,
    /// Highest alpha in band
    pub hi: u8,
}

impl Band {
    /// Every alpha.
    pub const FULL: Self = Self { lo: 0, hi: u8::MAX };

    /// Create a band.
    pub const fn new(lo: u8, hi: u8) -> Self {
        Self { lo, hi }
    }

    /// Whether alpha falls inside the band.
    #[inline]
    pub const fn contains(&self, alpha: u8) -> bool {
        self.lo <= alpha && alpha <= self.hi
    }

    /// An empty band has `lo > hi`.
    pub const fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Iterate the alphas in the band.
    pub fn alphas(&self) -> impl Iterator<Item = u8> {
        self.lo..=self.hi
    }
}

/// Build-time constants for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelCalibration {
    /// Scales alpha's contribution
    pub gain: u16,
    /// Leak per cycle is `acc >> leak_shift`
    pub leak_shift: u8,
    /// Firing boundary
    pub threshold: u16,
    /// Receptive window
    pub band: Band,
}

impl ChannelCalibration {
    /// Create a channel calibration.
    pub const fn new(gain: u16, leak_shift: u8, threshold: u16, band: Band) -> Self {
        Self {
            gain,
            leak_shift,
            threshold,
            band,
        }
    }

    /// Per-cycle input for this alpha.
    #[inline]
    pub const fn drive(&self, alpha: u8) -> u32 {
        if self.band.contains(alpha) {
            self.gain as u32 * alpha as u32
        } else {
            0
        }
    }

    /// Exact fixed point of the recurrence under constant alpha.
    pub const fn steady_state(&self, alpha: u8) -> u16 {
        let ss = (self.drive(alpha) as u64) << self.leak_shift;
        if ss > ACCUMULATOR_MAX as u64 {
            ACCUMULATOR_MAX
        } else {
            ss as u16
        }
    }

    /// Whether constant alpha eventually fires this channel.
    pub const fn selects(&self, alpha: u8) -> bool {
        self.band.contains(alpha) && self.steady_state(alpha) >= self.threshold
    }

    /// Time constant `1 / leak_c` in cycles.
    pub const fn time_constant(&self) -> u32 {
        1 << self.leak_shift
    }

    /// Integration steps from zero until the channel fires under constant
    /// alpha. `None` if it never does.
    pub fn rise_cycles(&self, alpha: u8) -> Option<u32> {
        if !self.selects(alpha) {
            return None;
        }

        let mut acc = 0;
        for cycles in 1..=SEARCH_LIMIT {
            acc = integrate(acc, alpha, self);
            if acc >= self.threshold {
                return Some(cycles);
            }
        }
        None
    }

    /// Undriven steps until an accumulator starting at `from` drops below
    /// threshold. Zero if it already is.
    pub fn fall_cycles(&self, from: u16) -> u32 {
        let mut acc = from;
        let mut cycles = 0;
        while acc >= self.threshold && cycles < SEARCH_LIMIT {
            acc = decay(acc, self.leak_shift);
            cycles += 1;
        }
        cycles
    }

    /// Highest accumulator value this channel can hold under any
    /// in-band history.
    pub fn peak(&self) -> u16 {
        let ss = self
            .band
            .alphas()
            .map(|alpha| self.steady_state(alpha))
            .max()
            .unwrap_or(0);
        let residue = (1u32 << self.leak_shift) - 1;
        (u32::from(ss) + residue).min(u32::from(ACCUMULATOR_MAX)) as u16
    }

    /// Check the constants for defects the core cannot detect at runtime.
    pub fn validate(&self, relay: Relay) -> Result<(), CalibrationError> {
        if self.gain == 0 {
            return Err(CalibrationError::ZeroGain { relay });
        }
        if self.leak_shift == 0 || self.leak_shift > MAX_LEAK_SHIFT {
            return Err(CalibrationError::LeakShiftOutOfRange {
                relay,
                shift: self.leak_shift,
            });
        }
        if self.threshold == 0 {
            return Err(CalibrationError::ZeroThreshold { relay });
        }
        if self.band.is_empty() {
            return Err(CalibrationError::EmptyBand {
                relay,
                lo: self.band.lo,
                hi: self.band.hi,
            });
        }
        // Below 2^k the undriven leak rounds to zero and a fired
        // channel would never release.
        let floor = 1u32 << self.leak_shift;
        if u32::from(self.threshold) < floor {
            return Err(CalibrationError::ThresholdBelowLeakFloor {
                relay,
                threshold: self.threshold,
                floor,
            });
        }
        Ok(())
    }
}

/// Calibration for all three channels, indexed by [`Relay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Calibration {
    channels: [ChannelCalibration; Relay::COUNT],
}

impl Calibration {
    /// AF calibration: 0..=69.
    pub const AF: ChannelCalibration = ChannelCalibration::new(1, 4, 16, Band::new(0, 69));

    /// CF calibration: 70..=169.
    pub const CF: ChannelCalibration = ChannelCalibration::new(2, 3, 560, Band::new(70, 169));

    /// DF calibration: 170..=255.
    pub const DF: ChannelCalibration = ChannelCalibration::new(1, 5, 2720, Band::new(170, 255));

    /// Shipped calibration.
    pub const DEFAULT: Self = Self::new(Self::AF, Self::CF, Self::DF);

    /// Assemble a calibration. Call [`validate`](Self::validate) before use.
    pub const fn new(af: ChannelCalibration, cf: ChannelCalibration, df: ChannelCalibration) -> Self {
        Self {
            channels: [af, cf, df],
        }
    }

    /// One channel's constants.
    #[inline]
    pub const fn channel(&self, relay: Relay) -> &ChannelCalibration {
        &self.channels[relay.index()]
    }

    /// All channels in priority order.
    pub const fn channels(&self) -> &[ChannelCalibration; Relay::COUNT] {
        &self.channels
    }

    /// Validate every channel.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        for relay in Relay::ALL {
            self.channel(relay).validate(relay)?;
        }
        Ok(())
    }

    /// The relay constant alpha settles to, if any.
    pub fn expected(&self, alpha: u8) -> Option<Relay> {
        Relay::ALL
            .into_iter()
            .find(|&relay| self.channel(relay).selects(alpha))
    }

    /// Slowest rise from reset over every selectable alpha.
    pub fn max_rise_cycles(&self) -> u32 {
        (0..=u8::MAX)
            .filter_map(|alpha| {
                self.expected(alpha)
                    .and_then(|relay| self.channel(relay).rise_cycles(alpha))
            })
            .max()
            .unwrap_or(0)
    }

    /// Slowest release of any channel from its peak.
    pub fn max_fall_cycles(&self) -> u32 {
        self.channels
            .iter()
            .map(|channel| channel.fall_cycles(channel.peak()))
            .max()
            .unwrap_or(0)
    }

    /// Largest time constant among the channels.
    pub fn slowest_time_constant(&self) -> u32 {
        self.channels
            .iter()
            .map(ChannelCalibration::time_constant)
            .max()
            .unwrap_or(0)
    }

    /// Cycles a consumer must be willing to wait for the steady-state code
    /// after reset release or after alpha moves to a new band.
    ///
    /// Assumes disjoint bands.
    pub fn settle_bound(&self) -> u32 {
        1 + self.max_rise_cycles().max(self.max_fall_cycles())
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(Calibration::DEFAULT.validate().is_ok());
    }

    #[test]
    fn fixed_points_select_expected_band() {
        let cal = Calibration::DEFAULT;
        assert_eq!(cal.expected(20), Some(Relay::Af));
        assert_eq!(cal.expected(120), Some(Relay::Cf));
        assert_eq!(cal.expected(220), Some(Relay::Df));
    }

    #[test]
    fn only_one_channel_selects_each_fixed_point() {
        let cal = Calibration::DEFAULT;
        for (alpha, winner) in [(20, Relay::Af), (120, Relay::Cf), (220, Relay::Df)] {
            for relay in Relay::ALL {
                assert_eq!(
                    cal.channel(relay).selects(alpha),
                    relay == winner,
                    "alpha {} channel {}",
                    alpha,
                    relay
                );
            }
        }
    }

    #[test]
    fn every_nonzero_alpha_has_exactly_one_band() {
        let cal = Calibration::DEFAULT;
        assert_eq!(cal.expected(0), None);

        for alpha in 1..=u8::MAX {
            let selecting = Relay::ALL
                .into_iter()
                .filter(|&r| cal.channel(r).selects(alpha))
                .count();
            assert_eq!(selecting, 1, "alpha {} selected by {} channels", alpha, selecting);
        }
    }

    #[test]
    fn band_edges() {
        let cal = Calibration::DEFAULT;
        let cases = [
            (1, Relay::Af),
            (69, Relay::Af),
            (70, Relay::Cf),
            (169, Relay::Cf),
            (170, Relay::Df),
            (255, Relay::Df),
        ];
        for (alpha, expected) in cases {
            assert_eq!(cal.expected(alpha), Some(expected), "alpha {}", alpha);
        }
    }

    #[test]
    fn steady_states() {
        assert_eq!(Calibration::AF.steady_state(20), 320);
        assert_eq!(Calibration::CF.steady_state(120), 1920);
        assert_eq!(Calibration::DF.steady_state(220), 7040);

        // Out of band
        assert_eq!(Calibration::AF.steady_state(120), 0);
        assert_eq!(Calibration::DF.steady_state(20), 0);
    }

    #[test]
    fn rise_cycles_at_fixed_points() {
        assert_eq!(Calibration::AF.rise_cycles(20), Some(1));
        assert_eq!(Calibration::CF.rise_cycles(120), Some(3));
        assert_eq!(Calibration::DF.rise_cycles(220), Some(16));
        assert_eq!(Calibration::AF.rise_cycles(0), None);
        assert_eq!(Calibration::AF.rise_cycles(120), None);
    }

    #[test]
    fn fall_cycles_from_peak() {
        assert_eq!(Calibration::AF.peak(), 1119);
        assert_eq!(Calibration::CF.peak(), 2711);
        assert_eq!(Calibration::DF.peak(), 8191);

        assert_eq!(Calibration::AF.fall_cycles(0), 0);
        assert_eq!(Calibration::AF.fall_cycles(Calibration::AF.peak()), 76);
        assert_eq!(Calibration::CF.fall_cycles(Calibration::CF.peak()), 12);
        assert_eq!(Calibration::DF.fall_cycles(Calibration::DF.peak()), 35);
    }

    #[test]
    fn default_settle_bound() {
        let cal = Calibration::DEFAULT;
        assert_eq!(cal.max_rise_cycles(), 22);
        assert_eq!(cal.max_fall_cycles(), 76);
        assert_eq!(cal.settle_bound(), 77);
        assert_eq!(cal.slowest_time_constant(), 32);
    }

    #[test]
    fn validate_rejects_defects() {
        let base = Calibration::AF;

        let zero_gain = ChannelCalibration { gain: 0, ..base };
        assert_eq!(
            zero_gain.validate(Relay::Af),
            Err(CalibrationError::ZeroGain { relay: Relay::Af })
        );

        let no_leak = ChannelCalibration { leak_shift: 0, ..base };
        assert!(matches!(
            no_leak.validate(Relay::Af),
            Err(CalibrationError::LeakShiftOutOfRange { shift: 0, .. })
        ));

        let wide_leak = ChannelCalibration { leak_shift: 16, threshold: u16::MAX, ..base };
        assert!(matches!(
            wide_leak.validate(Relay::Af),
            Err(CalibrationError::LeakShiftOutOfRange { shift: 16, .. })
        ));

        let zero_threshold = ChannelCalibration { threshold: 0, ..base };
        assert_eq!(
            zero_threshold.validate(Relay::Cf),
            Err(CalibrationError::ZeroThreshold { relay: Relay::Cf })
        );

        let empty = ChannelCalibration { band: Band::new(10, 9), ..base };
        assert!(matches!(
            empty.validate(Relay::Df),
            Err(CalibrationError::EmptyBand { lo: 10, hi: 9, .. })
        ));

        let sticky = ChannelCalibration { threshold: 15, ..base };
        assert_eq!(
            sticky.validate(Relay::Af),
            Err(CalibrationError::ThresholdBelowLeakFloor {
                relay: Relay::Af,
                threshold: 15,
                floor: 16
            })
        );
    }

    #[test]
    fn calibration_validate_reports_first_bad_channel() {
        let bad_cf = ChannelCalibration { gain: 0, ..Calibration::CF };
        let cal = Calibration::new(Calibration::AF, bad_cf, Calibration::DF);
        assert_eq!(cal.validate(), Err(CalibrationError::ZeroGain { relay: Relay::Cf }));
    }

    #[test]
    fn band_contains() {
        let band = Band::new(70, 169);
        assert!(!band.contains(69));
        assert!(band.contains(70));
        assert!(band.contains(169));
        assert!(!band.contains(170));
        assert_eq!(band.alphas().count(), 100);
        assert!(Band::FULL.contains(0) && Band::FULL.contains(255));
    }
}
