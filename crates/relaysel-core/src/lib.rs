//! Relay Selection Core
//!
//! An 8-bit stimulus ("alpha") picks one of three relay paths (AF, CF, DF)
//! through a race between leaky integrators. No lookup table: the code is
//! whatever channel the input drives over its threshold at steady state.
//!
//! # Observed Contract
//!
//! | alpha | relay | code |
//! |-------|-------|------|
//! | 20    | AF    | `00` |
//! | 120   | CF    | `10` |
//! | 220   | DF    | `01` |
//!
//! # Pipeline
//!
//! 1. Three channels integrate alpha in parallel, each from the previous
//!    cycle's snapshot
//! 2. Each channel compares its accumulator to its threshold
//! 3. A fixed-priority encoder (AF > CF > DF) picks a winner
//! 4. The selection latch keeps the last winner when nothing fires
//!
//! Reset zeroes everything. `valid` stays false from reset until the first
//! firing and is sticky after that.
//!
//! # Settle Time
//!
//! Every valid calibration has a finite settle bound, computed from the
//! recurrence itself. For [`Calibration::DEFAULT`] it is 77 cycles.

mod arbiter;
mod calibration;
mod channel;
mod controller;
mod error;

pub use arbiter::{arbitrate, Relay, SelectionState};
pub use calibration::{Band, Calibration, ChannelCalibration, MAX_LEAK_SHIFT, SEARCH_LIMIT};
pub use channel::{decay, integrate, ChannelState, ACCUMULATOR_MAX};
pub use controller::{CoreSnapshot, CycleInputs, DecisionCore, Mode};
pub use error::CalibrationError;

/// Width of the relay code on the output bus.
pub const CODE_BITS: u32 = 2;

/// Mask for the relay code on the output bus.
pub const CODE_MASK: u8 = (1 << CODE_BITS) - 1;

// Every code must fit in its field
const _: () = assert!(
    Relay::Af.code() <= CODE_MASK && Relay::Cf.code() <= CODE_MASK && Relay::Df.code() <= CODE_MASK
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_contract() {
        let cases = [(20u8, 0b00u8), (120, 0b10), (220, 0b01)];

        for (alpha, code) in cases {
            let mut core = DecisionCore::new();
            core.tick(CycleInputs::reset());
            for _ in 0..=Calibration::DEFAULT.settle_bound() {
                core.tick(CycleInputs::running(alpha));
            }
            assert_eq!(core.selection().bus_bits(), code, "alpha {}", alpha);
        }
    }

    #[test]
    fn code_mask() {
        assert_eq!(CODE_MASK, 0b11);
    }
}
