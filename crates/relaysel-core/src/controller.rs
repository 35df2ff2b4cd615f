//! Reset/settle controller: the cycle-accurate decision core.
//!
//! # States
//!
//! ```text
//!            reset_n = 0 (any state, any duration)
//!        ┌────────────────────────────────────────┐
//!        ▼                                        │
//!   RESETTING ──── reset_n = 1 (release cycle) ──► RUNNING ─┐
//!                                                    ▲      │ integrate,
//!                                                    └──────┘ arbitrate, latch
//! ```
//!
//! RESETTING zeroes every accumulator, clears every `fired` flag and the
//! selection. The release cycle moves to RUNNING without integrating, so
//! the output stays indeterminate for at least one cycle after release.
//!
//! In RUNNING every channel steps from the same previous-cycle snapshot.
//! No channel ever sees another's updated value.
//!
//! # Enable
//!
//! With `enable` low nothing changes. Reset is unconditional and still
//! applies.

use tracing::debug;

use crate::arbiter::{arbitrate, Relay, SelectionState};
use crate::calibration::Calibration;
use crate::channel::ChannelState;
use crate::error::CalibrationError;

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// Held in (or just out of) reset; output indeterminate
    Resetting,
    /// Integrating every enabled cycle
    Running,
}

/// Levels sampled at one clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleInputs {
    /// Stimulus
    pub alpha: u8,
    /// Active-low reset
    pub reset_n: bool,
    /// Module enable
    pub enable: bool,
}

impl CycleInputs {
    /// Enabled, out of reset, driving `alpha`.
    pub const fn running(alpha: u8) -> Self {
        Self {
            alpha,
            reset_n: true,
            enable: true,
        }
    }

    /// Reset asserted with zero stimulus.
    pub const fn reset() -> Self {
        Self {
            alpha: 0,
            reset_n: false,
            enable: true,
        }
    }
}

/// Full observable state of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreSnapshot {
    pub mode: Mode,
    pub channels: [ChannelState; Relay::COUNT],
    pub selection: SelectionState,
    pub cycles_since_release: u64,
}

/// Three racing channels, the arbiter and the reset controller.
#[derive(Debug, Clone)]
pub struct DecisionCore {
    calibration: Calibration,
    channels: [ChannelState; Relay::COUNT],
    selection: SelectionState,
    mode: Mode,
    cycles_since_release: u64,
}

impl DecisionCore {
    /// Core with the shipped calibration, powered up in reset.
    pub fn new() -> Self {
        Self::from_parts(Calibration::DEFAULT)
    }

    /// Core with a custom calibration.
    pub fn with_calibration(calibration: Calibration) -> Result<Self, CalibrationError> {
        calibration.validate()?;
        Ok(Self::from_parts(calibration))
    }

    fn from_parts(calibration: Calibration) -> Self {
        Self {
            calibration,
            channels: [ChannelState::ZERO; Relay::COUNT],
            selection: SelectionState::CLEARED,
            mode: Mode::Resetting,
            cycles_since_release: 0,
        }
    }

    /// Advance one clock edge. Returns the decided relay afterwards.
    pub fn tick(&mut self, inputs: CycleInputs) -> Option<Relay> {
        if !inputs.reset_n {
            self.assert_reset();
            return None;
        }
        if !inputs.enable {
            return self.selection.decided();
        }

        match self.mode {
            Mode::Resetting => {
                self.mode = Mode::Running;
                self.cycles_since_release = 0;
                debug!("reset released");
            }
            Mode::Running => self.integrate(inputs.alpha),
        }
        self.selection.decided()
    }

    /// Asynchronous reset assertion. Takes effect immediately and
    /// unconditionally; repeating it is a no-op.
    pub fn assert_reset(&mut self) {
        if self.mode == Mode::Running {
            debug!(
                cycles = self.cycles_since_release,
                "reset asserted"
            );
        }
        self.channels = [ChannelState::ZERO; Relay::COUNT];
        self.selection = SelectionState::CLEARED;
        self.mode = Mode::Resetting;
        self.cycles_since_release = 0;
    }

    fn integrate(&mut self, alpha: u8) {
        let previous = self.channels;
        let calibration = &self.calibration;
        self.channels = Relay::ALL.map(|relay| {
            previous[relay.index()].step(alpha, calibration.channel(relay))
        });
        self.cycles_since_release += 1;

        let winner = arbitrate(self.channels.map(|c| c.fired));
        let was_valid = self.selection.is_valid();
        if self.selection.latch(winner) {
            if let Some(relay) = winner {
                debug!(
                    %relay,
                    code = relay.code(),
                    alpha,
                    cycle = self.cycles_since_release,
                    first = !was_valid,
                    "selection latched"
                );
            }
        }
    }

    /// Current controller state.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Latched selection.
    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    /// Decided relay, `None` while indeterminate.
    pub fn decided(&self) -> Option<Relay> {
        self.selection.decided()
    }

    /// Whether the output is decided.
    pub fn is_valid(&self) -> bool {
        self.selection.is_valid()
    }

    /// Channel states in priority order.
    pub fn channels(&self) -> &[ChannelState; Relay::COUNT] {
        &self.channels
    }

    /// One channel's state.
    pub fn channel(&self, relay: Relay) -> ChannelState {
        self.channels[relay.index()]
    }

    /// Active calibration.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Integration cycles since the last release.
    pub fn cycles_since_release(&self) -> u64 {
        self.cycles_since_release
    }

    /// Copy out the full state.
    pub fn snapshot(&self) -> CoreSnapshot {
        CoreSnapshot {
            mode: self.mode,
            channels: self.channels,
            selection: self.selection,
            cycles_since_release: self.cycles_since_release,
        }
    }
}

impl Default for DecisionCore {
    fn default() -> Self {
        Self::new()
    }
}
