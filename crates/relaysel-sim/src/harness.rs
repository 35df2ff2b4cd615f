//! Clocked harness: reset, drive, poll.

use relaysel_core::{Calibration, Mode, Relay};
use relaysel_shim::{PinInputs, PinOutputs, RelayModule};
use tracing::{debug, info, warn};

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use crate::events::{CycleRecord, HarnessSnapshot, SimEvent};
use crate::trace::Trace;

/// Drives a [`RelayModule`] one clock edge at a time and records what
/// happened.
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
    module: RelayModule,
    trace: Trace,
    cycle: u64,
    alpha: u8,
    reset_held: bool,
    last_decided: Option<Relay>,
}

impl Harness {
    /// Harness around the shipped calibration.
    pub fn new(config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_module(config, RelayModule::new()))
    }

    /// Harness around a custom calibration.
    pub fn with_calibration(config: HarnessConfig, calibration: Calibration) -> Result<Self> {
        config.validate()?;
        let module = RelayModule::with_calibration(calibration)?;
        Ok(Self::from_module(config, module))
    }

    fn from_module(config: HarnessConfig, module: RelayModule) -> Self {
        Self {
            config,
            module,
            trace: Trace::new(),
            cycle: 0,
            alpha: 0,
            reset_held: false,
            last_decided: None,
        }
    }

    /// Hold `rst_n` low for the configured number of cycles with `ena`
    /// high and `ui_in` zero. The next clock releases.
    pub fn reset(&mut self) {
        info!(cycles = self.config.reset_cycles, "reset");
        for _ in 0..self.config.reset_cycles {
            self.apply(PinInputs::in_reset());
        }
    }

    /// One clock edge, enabled, out of reset.
    pub fn clock(&mut self, alpha: u8) -> PinOutputs {
        self.apply(PinInputs::drive(alpha))
    }

    /// One clock edge with explicit pin levels.
    pub fn clock_pins(&mut self, pins: PinInputs) -> PinOutputs {
        self.apply(pins)
    }

    /// `cycles` clock edges with constant alpha.
    pub fn run(&mut self, alpha: u8, cycles: u32) -> PinOutputs {
        let mut outputs = self.module.outputs();
        for _ in 0..cycles {
            outputs = self.clock(alpha);
        }
        outputs
    }

    /// Clock until the output is valid. Returns the first decided relay,
    /// which after a band change may still be the old one; use
    /// [`poll_until`](Self::poll_until) to wait for a specific relay.
    pub fn poll_until_valid(&mut self, alpha: u8) -> Result<Relay> {
        let budget = self.budget();
        for waited in 1..=budget {
            self.clock(alpha);
            if let Some(relay) = self.decided() {
                debug!(alpha, %relay, waited, "selection valid");
                return Ok(relay);
            }
        }
        self.timed_out(alpha, budget);
        Err(Error::SettleTimeout { alpha, budget })
    }

    /// Clock until the decided relay is `expected`. Returns the number of
    /// cycles waited.
    pub fn poll_until(&mut self, alpha: u8, expected: Relay) -> Result<u32> {
        let budget = self.budget();
        for waited in 1..=budget {
            self.clock(alpha);
            if self.decided() == Some(expected) {
                debug!(alpha, relay = %expected, waited, "selection reached");
                return Ok(waited);
            }
        }
        self.timed_out(alpha, budget);
        Err(Error::SelectionMismatch {
            alpha,
            expected,
            got: self.decided(),
            budget,
        })
    }

    /// Hold alpha for the full budget and return the steady-state relay.
    pub fn settle(&mut self, alpha: u8) -> Result<Relay> {
        let budget = self.budget();
        self.run(alpha, budget);
        match self.decided() {
            Some(relay) => Ok(relay),
            None => {
                self.timed_out(alpha, budget);
                Err(Error::SettleTimeout { alpha, budget })
            }
        }
    }

    fn timed_out(&mut self, alpha: u8, budget: u32) {
        warn!(alpha, budget, decided = ?self.decided(), "settle budget exhausted");
        self.trace.push_event(SimEvent::SettleTimeout {
            alpha,
            budget,
            cycle: self.cycle,
        });
    }

    fn apply(&mut self, pins: PinInputs) -> PinOutputs {
        let mode_before = self.module.core().mode();
        let outputs = self.module.clock(pins);
        self.cycle += 1;

        if pins.rst_n && pins.ui_in != self.alpha {
            self.trace.push_event(SimEvent::AlphaChanged {
                from: self.alpha,
                to: pins.ui_in,
                cycle: self.cycle,
            });
        }
        self.alpha = pins.ui_in;

        if !pins.rst_n {
            if !self.reset_held {
                self.trace.push_event(SimEvent::ResetAsserted { cycle: self.cycle });
            }
            self.reset_held = true;
        } else {
            self.reset_held = false;
            if mode_before == Mode::Resetting && self.module.core().mode() == Mode::Running {
                self.trace.push_event(SimEvent::ResetReleased { cycle: self.cycle });
            }
        }

        let decided = self.module.core().decided();
        match (self.last_decided, decided) {
            (None, Some(relay)) => self.trace.push_event(SimEvent::SelectionLatched {
                relay,
                code: relay.code(),
                cycle: self.cycle,
                settle_cycles: self.module.core().cycles_since_release(),
            }),
            (Some(from), Some(to)) if from != to => {
                self.trace.push_event(SimEvent::SelectionChanged {
                    from,
                    to,
                    cycle: self.cycle,
                })
            }
            _ => {}
        }
        self.last_decided = decided;

        if self.config.record_cycles {
            self.trace.push_cycle(CycleRecord {
                cycle: self.cycle,
                inputs: pins,
                outputs,
                valid: decided.is_some(),
            });
        }
        outputs
    }

    /// Polling budget in cycles.
    pub fn budget(&self) -> u32 {
        self.config.budget_for(self.module.core().calibration())
    }

    /// Decided relay, `None` while indeterminate.
    pub fn decided(&self) -> Option<Relay> {
        self.module.core().decided()
    }

    /// Current registered outputs.
    pub fn outputs(&self) -> PinOutputs {
        self.module.outputs()
    }

    /// Clock edges applied so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Simulated time in microseconds.
    pub fn elapsed_us(&self) -> u64 {
        self.cycle * self.config.clock_period_us
    }

    /// The module under test.
    pub fn module(&self) -> &RelayModule {
        &self.module
    }

    /// Active configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Recorded timeline.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Consume the harness, keeping the timeline.
    pub fn into_trace(self) -> Trace {
        self.trace
    }

    /// Harness state at this point.
    pub fn snapshot(&self) -> HarnessSnapshot {
        let core = self.module.core();
        HarnessSnapshot {
            cycle: self.cycle,
            elapsed_us: self.elapsed_us(),
            mode: core.mode(),
            alpha: self.alpha,
            decided: core.decided(),
            channels: *core.channels(),
            outputs: self.module.outputs(),
            event_count: self.trace.event_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harness() -> Harness {
        Harness::new(HarnessConfig::default()).unwrap()
    }

    #[test]
    fn starts_empty() {
        let h = harness();
        assert_eq!(h.cycle(), 0);
        assert_eq!(h.trace().event_count(), 0);
        assert_eq!(h.decided(), None);
    }

    #[test]
    fn reset_records_one_assert_event() {
        let mut h = harness();
        h.reset();

        assert_eq!(h.cycle(), 10);
        assert_eq!(h.trace().cycle_count(), 10);
        let asserts = h
            .trace()
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::ResetAsserted { .. }))
            .count();
        assert_eq!(asserts, 1);
    }

    #[test]
    fn release_and_latch_are_recorded() {
        let mut h = harness();
        h.reset();
        let relay = h.poll_until_valid(120).unwrap();
        assert_eq!(relay, Relay::Cf);

        let events = h.trace().events();
        assert!(events.contains(&SimEvent::ResetReleased { cycle: 11 }));
        assert!(events.contains(&SimEvent::AlphaChanged { from: 0, to: 120, cycle: 11 }));
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::SelectionLatched { relay: Relay::Cf, settle_cycles: 3, .. })));
    }

    #[test]
    fn poll_until_counts_cycles() {
        let mut h = harness();
        h.reset();
        // Release cycle + one integration
        assert_eq!(h.poll_until(20, Relay::Af).unwrap(), 2);
    }

    #[test]
    fn zero_alpha_times_out() {
        let mut h = harness();
        h.reset();
        let err = h.poll_until_valid(0).unwrap_err();
        assert!(matches!(err, Error::SettleTimeout { alpha: 0, budget: 77 }));
        assert!(h
            .trace()
            .events()
            .iter()
            .any(|e| matches!(e, SimEvent::SettleTimeout { .. })));
    }

    #[test]
    fn wrong_expectation_reports_mismatch() {
        let mut h = harness();
        h.reset();
        let err = h.poll_until(220, Relay::Af).unwrap_err();
        match err {
            Error::SelectionMismatch { expected, got, .. } => {
                assert_eq!(expected, Relay::Af);
                assert_eq!(got, Some(Relay::Df));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn band_change_emits_selection_changed() {
        let mut h = harness();
        h.reset();
        assert_eq!(h.settle(20).unwrap(), Relay::Af);
        assert_eq!(h.settle(220).unwrap(), Relay::Df);

        assert!(h.trace().events().iter().any(|e| matches!(
            e,
            SimEvent::SelectionChanged { from: Relay::Af, to: Relay::Df, .. }
        )));
    }

    #[test]
    fn elapsed_time_follows_clock_period() {
        let mut h = harness();
        h.reset();
        h.run(20, 5);
        assert_eq!(h.elapsed_us(), 150);
        assert_eq!(h.snapshot().elapsed_us, 150);
    }

    #[test]
    fn record_cycles_can_be_disabled() {
        let config = HarnessConfig {
            record_cycles: false,
            ..HarnessConfig::default()
        };
        let mut h = Harness::new(config).unwrap();
        h.reset();
        h.run(120, 20);
        assert_eq!(h.trace().cycle_count(), 0);
        assert!(h.trace().event_count() > 0);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = HarnessConfig {
            reset_cycles: 0,
            ..HarnessConfig::default()
        };
        assert!(matches!(Harness::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn explicit_budget_overrides_bound() {
        let config = HarnessConfig {
            settle_budget: Some(5),
            ..HarnessConfig::default()
        };
        let mut h = Harness::new(config).unwrap();
        h.reset();
        // DF needs 16 integration cycles at 220
        assert!(h.poll_until_valid(220).is_err());
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut h = harness();
        h.reset();
        h.settle(220).unwrap();
        let snap = h.snapshot();
        assert_eq!(snap.mode, Mode::Running);
        assert_eq!(snap.alpha, 220);
        assert_eq!(snap.decided, Some(Relay::Df));
        assert_eq!(snap.outputs.uo_out, 0b01);
        assert!(snap.channels[Relay::Df.index()].fired);
    }
}
