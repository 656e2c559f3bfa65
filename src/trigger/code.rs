//! Trigger codes
//!
//! The TriggerBox treats the byte on the line as an event marker: `0` is
//! the resting state, `1..=254` are trigger codes.

use crate::error::TriggerError;
use std::fmt;
use std::str::FromStr;

/// Byte that returns the line to rest
pub const RESET_BYTE: u8 = 0;

/// A trigger value in `1..=254`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerCode(u8);

impl TriggerCode {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 254;

    pub fn new(value: u8) -> Result<Self, TriggerError> {
        Self::try_from(i64::from(value))
    }

    /// Byte written to the line
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for TriggerCode {
    type Error = TriggerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(TriggerError::InvalidArgument(value.to_string()))
        }
    }
}

impl FromStr for TriggerCode {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| TriggerError::InvalidArgument(format!("{:?}", s)))?;
        Self::try_from(value)
    }
}

impl From<TriggerCode> for u8 {
    fn from(code: TriggerCode) -> u8 {
        code.0
    }
}

impl From<TriggerCode> for i64 {
    fn from(code: TriggerCode) -> i64 {
        i64::from(code.0)
    }
}

impl fmt::Display for TriggerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
