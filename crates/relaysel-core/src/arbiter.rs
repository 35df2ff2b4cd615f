//! Fixed-priority arbitration and the 2-bit relay code.
//!
//! Every cycle the arbiter looks at the `fired` flags of the three channels
//! and picks a winner by declaration order, never by magnitude:
//!
//! ```text
//! winner = first_{c ∈ [AF, CF, DF]} fired(c)
//! ```
//!
//! This is a hardware priority encoder. With overlapping bands it still gives
//! a deterministic answer, it just may not be the one you wanted.
//!
//! # Code Mapping
//!
//! | relay | code |
//! |-------|------|
//! | AF    | `00` |
//! | CF    | `10` |
//! | DF    | `01` |
//!
//! `11` has no constructor and never leaves the encoder.

use std::fmt;

/// One of the three candidate output paths, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relay {
    /// Low band, highest priority
    Af,
    /// Middle band
    Cf,
    /// High band, lowest priority
    Df,
}

impl Relay {
    /// Number of channels racing.
    pub const COUNT: usize = 3;

    /// All relays, highest priority first.
    pub const ALL: [Self; Self::COUNT] = [Self::Af, Self::Cf, Self::Df];

    /// Position in channel arrays (equals priority rank, 0 = highest).
    pub const fn index(self) -> usize {
        match self {
            Self::Af => 0,
            Self::Cf => 1,
            Self::Df => 2,
        }
    }

    /// The 2-bit code placed on the output bus.
    pub const fn code(self) -> u8 {
        match self {
            Self::Af => 0b00,
            Self::Cf => 0b10,
            Self::Df => 0b01,
        }
    }

    /// Decode a 2-bit code. `0b11` and anything wider decode to `None`.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0b00 => Some(Self::Af),
            0b10 => Some(Self::Cf),
            0b01 => Some(Self::Df),
            _ => None,
        }
    }

    /// Short uppercase name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Af => "AF",
            Self::Cf => "CF",
            Self::Df => "DF",
        }
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve this cycle's firing set to a single winner.
///
/// Pure function of the flags. Returns `None` when nothing fired.
pub fn arbitrate(fired: [bool; Relay::COUNT]) -> Option<Relay> {
    Relay::ALL.into_iter().find(|relay| fired[relay.index()])
}

/// The latched selection.
///
/// Holds `None` only between reset and the first firing. After that a cycle
/// with no winner keeps the last winner (sticky-last-valid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionState {
    latched: Option<Relay>,
}

impl SelectionState {
    /// Post-reset state: nothing decided.
    pub const CLEARED: Self = Self { latched: None };

    /// Latch this cycle's winner. Returns true if the latched relay changed.
    pub fn latch(&mut self, winner: Option<Relay>) -> bool {
        match winner {
            Some(relay) if self.latched != Some(relay) => {
                self.latched = Some(relay);
                true
            }
            _ => false,
        }
    }

    /// Whether any channel has fired since the last reset.
    pub const fn is_valid(&self) -> bool {
        self.latched.is_some()
    }

    /// The decided relay, if valid.
    pub const fn decided(&self) -> Option<Relay> {
        self.latched
    }

    /// Bits for `uo_out[1:0]`. Reads as `00` while indeterminate; check
    /// [`is_valid`](Self::is_valid) before trusting it.
    pub const fn bus_bits(&self) -> u8 {
        match self.latched {
            Some(relay) => relay.code(),
            None => 0,
        }
    }
}
