//! Harness events for the run timeline.

use relaysel_core::{ChannelState, Mode, Relay};
use relaysel_shim::{PinInputs, PinOutputs};
use serde::{Deserialize, Serialize};

/// Events that occur during a harness run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// `rst_n` went low
    ResetAsserted { cycle: u64 },

    /// Core left reset and started integrating
    ResetReleased { cycle: u64 },

    /// `ui_in` changed while out of reset
    AlphaChanged { from: u8, to: u8, cycle: u64 },

    /// First valid selection after reset
    SelectionLatched {
        relay: Relay,
        code: u8,
        cycle: u64,
        /// Integration cycles since release
        settle_cycles: u64,
    },

    /// The latched relay moved to another one
    SelectionChanged { from: Relay, to: Relay, cycle: u64 },

    /// A poll ran out of budget
    SettleTimeout { alpha: u8, budget: u32, cycle: u64 },
}

impl SimEvent {
    /// Harness cycle the event happened on.
    pub fn cycle(&self) -> u64 {
        match self {
            SimEvent::ResetAsserted { cycle }
            | SimEvent::ResetReleased { cycle }
            | SimEvent::AlphaChanged { cycle, .. }
            | SimEvent::SelectionLatched { cycle, .. }
            | SimEvent::SelectionChanged { cycle, .. }
            | SimEvent::SettleTimeout { cycle, .. } => *cycle,
        }
    }
}

/// Pins on one clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle: u64,
    pub inputs: PinInputs,
    pub outputs: PinOutputs,
    pub valid: bool,
}

/// Harness state at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessSnapshot {
    pub cycle: u64,
    pub elapsed_us: u64,
    pub mode: Mode,
    pub alpha: u8,
    pub decided: Option<Relay>,
    pub channels: [ChannelState; Relay::COUNT],
    pub outputs: PinOutputs,
    pub event_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = SimEvent::SelectionLatched {
            relay: Relay::Cf,
            code: 0b10,
            cycle: 14,
            settle_cycles: 3,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"SelectionLatched\""));
        assert!(json.contains("\"relay\":\"Cf\""));

        let back: SimEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn cycle_accessor() {
        let events = [
            SimEvent::ResetAsserted { cycle: 1 },
            SimEvent::ResetReleased { cycle: 2 },
            SimEvent::AlphaChanged { from: 0, to: 20, cycle: 3 },
            SimEvent::SelectionChanged { from: Relay::Af, to: Relay::Df, cycle: 4 },
            SimEvent::SettleTimeout { alpha: 0, budget: 77, cycle: 5 },
        ];
        let cycles: Vec<_> = events.iter().map(SimEvent::cycle).collect();
        assert_eq!(cycles, vec![1, 2, 3, 4, 5]);
    }
}
