//! Relay Selection Harness
//!
//! Drives the module the way a bench testbench does: a reset pulse, then
//! one stimulus at a time, polling the output until it is decided.
//!
//! # Architecture
//!
//! - **Harness**: clocks the pin-level module, enforces the settle budget
//! - **Trace**: records events and per-cycle pin levels, digests the run
//! - **Config**: reset length, budget, clock period (env overridable)
//!
//! # Usage
//!
//! ```
//! use relaysel_sim::{Harness, HarnessConfig};
//! use relaysel_core::Relay;
//!
//! let mut harness = Harness::new(HarnessConfig::default())?;
//! harness.reset();
//! harness.poll_until(20, Relay::Af)?;
//! harness.poll_until(120, Relay::Cf)?;
//! harness.poll_until(220, Relay::Df)?;
//! assert_eq!(harness.outputs().uio_oe, 0);
//! # Ok::<(), relaysel_sim::Error>(())
//! ```

mod config;
mod error;
mod events;
mod harness;
mod trace;

pub use config::{HarnessConfig, DEFAULT_CLOCK_PERIOD_US, DEFAULT_RESET_CYCLES};
pub use error::{Error, Result};
pub use events::{CycleRecord, HarnessSnapshot, SimEvent};
pub use harness::Harness;
pub use trace::Trace;
