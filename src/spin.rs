//! 🎡 Spin and dozen primitives
//!
//! A `Spin` is a validated wheel number in 0..=36. Zero is the house number
//! and belongs to no dozen.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};

/// Highest number on a single-zero wheel
pub const MAX_NUMBER: u8 = 36;

/// A recorded wheel outcome. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Spin(u8);

impl Spin {
    pub fn new(value: i64) -> EngineResult<Self> {
        if !(0..=MAX_NUMBER as i64).contains(&value) {
            return Err(EngineError::InvalidSpin { value });
        }
        Ok(Spin(value as u8))
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Dozen this spin falls in, `None` for zero
    pub fn dozen(&self) -> Option<Dozen> {
        Dozen::of(self.0)
    }
}

impl TryFrom<i64> for Spin {
    type Error = EngineError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Spin::new(value)
    }
}

impl FromStr for Spin {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.parse::<i64>() {
            Ok(value) => Spin::new(value),
            Err(_) => Err(EngineError::NonIntegerSpin {
                input: trimmed.to_string(),
            }),
        }
    }
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the three groups of 12 consecutive numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Dozen {
    First,
    Second,
    Third,
}

impl Dozen {
    /// Iteration order used for scoring and tie-breaking
    pub const ALL: [Dozen; 3] = [Dozen::First, Dozen::Second, Dozen::Third];

    /// ceil(n / 12) for n in 1..=36
    pub fn of(number: u8) -> Option<Dozen> {
        match number {
            1..=12 => Some(Dozen::First),
            13..=24 => Some(Dozen::Second),
            25..=36 => Some(Dozen::Third),
            _ => None,
        }
    }

    /// 1, 2 or 3
    pub fn index(&self) -> u8 {
        match self {
            Dozen::First => 1,
            Dozen::Second => 2,
            Dozen::Third => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Dozen> {
        match index {
            1 => Some(Dozen::First),
            2 => Some(Dozen::Second),
            3 => Some(Dozen::Third),
            _ => None,
        }
    }

    /// Zero-based slot for per-dozen arrays
    pub(crate) fn slot(&self) -> usize {
        self.index() as usize - 1
    }

    /// The 12 numbers of this dozen in ascending order
    pub fn numbers(&self) -> impl Iterator<Item = u8> {
        let start = (self.index() - 1) * 12 + 1;
        start..start + 12
    }

    pub fn contains(&self, number: u8) -> bool {
        Dozen::of(number) == Some(*self)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dozen::First => "1-12",
            Dozen::Second => "13-24",
            Dozen::Third => "25-36",
        }
    }
}

impl fmt::Display for Dozen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{} ({})", self.index(), self.label())
    }
}
