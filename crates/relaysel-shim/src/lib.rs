//! Relay Selection I/O Shim
//!
//! Wraps [`DecisionCore`] in the pin interface of a small tile:
//!
//! - `ui_in[7:0]` → alpha
//! - `rst_n` → reset (active low), `ena` → enable
//! - `uo_out[1:0]` ← relay code, `uo_out[7:2]` ← 0
//! - `uio_out`, `uio_oe` ← 0 (the bidirectional bus is not owned)
//!
//! Outputs are registered: they change only on [`RelayModule::clock`].

mod pins;

pub use pins::{PinInputs, PinOutputs};

use relaysel_core::{Calibration, CalibrationError, DecisionCore};

/// The module as seen from its pins.
#[derive(Debug, Clone, Default)]
pub struct RelayModule {
    core: DecisionCore,
    outputs: PinOutputs,
}

impl RelayModule {
    /// Module with the shipped calibration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Module with a custom calibration.
    pub fn with_calibration(calibration: Calibration) -> Result<Self, CalibrationError> {
        Ok(Self {
            core: DecisionCore::with_calibration(calibration)?,
            outputs: PinOutputs::default(),
        })
    }

    /// One rising clock edge.
    pub fn clock(&mut self, pins: PinInputs) -> PinOutputs {
        self.core.tick(pins.to_cycle());
        self.outputs = PinOutputs::from_selection(self.core.selection());
        self.outputs
    }

    /// Registered outputs, without clocking.
    pub fn outputs(&self) -> PinOutputs {
        self.outputs
    }

    /// The wrapped core.
    pub fn core(&self) -> &DecisionCore {
        &self.core
    }
}
