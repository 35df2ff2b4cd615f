//! Harness configuration.

use relaysel_core::Calibration;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reset length used when nothing else is configured.
pub const DEFAULT_RESET_CYCLES: u32 = 10;

/// 100 kHz clock.
pub const DEFAULT_CLOCK_PERIOD_US: u64 = 10;

/// Configuration for a harness run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Cycles to hold `rst_n` low on [`Harness::reset`](crate::Harness::reset)
    pub reset_cycles: u32,
    /// Cycles to wait for a selection; `None` uses the calibration's settle bound
    pub settle_budget: Option<u32>,
    /// Clock period, for reporting elapsed time
    pub clock_period_us: u64,
    /// Keep a per-cycle pin record in the trace
    pub record_cycles: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            reset_cycles: DEFAULT_RESET_CYCLES,
            settle_budget: None,
            clock_period_us: DEFAULT_CLOCK_PERIOD_US,
            record_cycles: true,
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by environment variables:
    ///
    /// - `RELAYSEL_RESET_CYCLES`
    /// - `RELAYSEL_SETTLE_BUDGET`
    /// - `RELAYSEL_CLOCK_PERIOD_US`
    /// - `RELAYSEL_RECORD_CYCLES` (`0`/`1`, `false`/`true`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "RELAYSEL_RESET_CYCLES")? {
            config.reset_cycles = v;
        }
        if let Some(v) = parse_var(&lookup, "RELAYSEL_SETTLE_BUDGET")? {
            config.settle_budget = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "RELAYSEL_CLOCK_PERIOD_US")? {
            config.clock_period_us = v;
        }
        if let Some(raw) = lookup("RELAYSEL_RECORD_CYCLES") {
            config.record_cycles = match raw.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                other => {
                    return Err(Error::Config(format!(
                        "RELAYSEL_RECORD_CYCLES: expected bool, got {:?}",
                        other
                    )))
                }
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the harness cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.reset_cycles == 0 {
            return Err(Error::Config("reset_cycles must be > 0".into()));
        }
        if self.clock_period_us == 0 {
            return Err(Error::Config("clock_period_us must be > 0".into()));
        }
        if self.settle_budget == Some(0) {
            return Err(Error::Config("settle_budget must be > 0".into()));
        }
        Ok(())
    }

    /// Effective polling budget for a calibration.
    pub fn budget_for(&self, calibration: &Calibration) -> u32 {
        self.settle_budget
            .unwrap_or_else(|| calibration.settle_bound())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{}: {}", key, e))),
    }
}
