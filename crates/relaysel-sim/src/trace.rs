//! Recorded timeline of a run and its digest.
//!
//! Two runs with the same stimulus and the same reset timing must produce
//! bit-identical pin traces. The digest makes that cheap to compare:
//!
//! ```text
//! digest = blake3(‖ cycle ‖ ui_in ‖ uio_in ‖ ena ‖ rst_n ‖ uo_out ‖ uio_out ‖ uio_oe ‖ ...)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::events::{CycleRecord, SimEvent};

/// Event timeline plus optional per-cycle pin records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    events: Vec<SimEvent>,
    cycles: Vec<CycleRecord>,
}

impl Trace {
    /// Empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub(crate) fn push_cycle(&mut self, record: CycleRecord) {
        self.cycles.push(record);
    }

    /// All recorded events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// All recorded cycles.
    pub fn cycles(&self) -> &[CycleRecord] {
        &self.cycles
    }

    /// Number of events recorded.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of cycles recorded.
    pub fn cycle_count(&self) -> usize {
        self.cycles.len()
    }

    /// Hex blake3 digest of the per-cycle pin records.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for record in &self.cycles {
            let i = record.inputs;
            let o = record.outputs;
            hasher.update(&record.cycle.to_le_bytes());
            hasher.update(&[
                i.ui_in,
                i.uio_in,
                u8::from(i.ena),
                u8::from(i.rst_n),
                o.uo_out,
                o.uio_out,
                o.uio_oe,
            ]);
        }
        hex::encode(hasher.finalize().as_bytes())
    }

    /// Pretty JSON of the whole trace.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
