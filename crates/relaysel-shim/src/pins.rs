//! Pin buses in and out of the module.

use relaysel_core::{CycleInputs, SelectionState, CODE_MASK};

/// Levels on the input pins at a clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinInputs {
    /// Dedicated input bus; carries alpha
    pub ui_in: u8,
    /// Bidirectional bus input side; unused
    pub uio_in: u8,
    /// Module enable
    pub ena: bool,
    /// Active-low reset
    pub rst_n: bool,
}

impl PinInputs {
    /// Enabled, out of reset, `ui_in = alpha`.
    pub const fn drive(alpha: u8) -> Self {
        Self {
            ui_in: alpha,
            uio_in: 0,
            ena: true,
            rst_n: true,
        }
    }

    /// Enabled, reset held low, inputs zeroed.
    pub const fn in_reset() -> Self {
        Self {
            ui_in: 0,
            uio_in: 0,
            ena: true,
            rst_n: false,
        }
    }

    /// What the core sees. `uio_in` is dropped here.
    pub const fn to_cycle(self) -> CycleInputs {
        CycleInputs {
            alpha: self.ui_in,
            reset_n: self.rst_n,
            enable: self.ena,
        }
    }
}

/// Levels on the output pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinOutputs {
    /// `[1:0]` relay code, `[7:2]` zero
    pub uo_out: u8,
    /// Bidirectional bus output side; always zero
    pub uio_out: u8,
    /// Bidirectional bus output enable; always zero
    pub uio_oe: u8,
}

impl PinOutputs {
    /// Pack a selection onto the output bus.
    pub const fn from_selection(selection: SelectionState) -> Self {
        Self {
            uo_out: selection.bus_bits() & CODE_MASK,
            uio_out: 0,
            uio_oe: 0,
        }
    }

    /// The code bits of `uo_out`.
    pub const fn code(&self) -> u8 {
        self.uo_out & CODE_MASK
    }

    /// Whether every bit outside the code field and the whole
    /// bidirectional bus are zero.
    pub const fn padding_is_zero(&self) -> bool {
        self.uo_out & !CODE_MASK == 0 && self.uio_out == 0 && self.uio_oe == 0
    }
}
