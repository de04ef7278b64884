use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const MINUTES_PER_HOUR: u16 = 60;
const MINUTES_PER_DAY: u16 = 24 * MINUTES_PER_HOUR;

/// Naive wall-clock time of day in `HH:mm` (24-hour, zero padded).
///
/// Stored as minutes since midnight. No timezone: a `WallTime` only has
/// meaning together with the calendar date it is attached to. Ordering is
/// numeric, which matches lexicographic ordering of the rendered form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime(u16);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWallTimeError {
    #[error("time is empty")]
    Empty,

    #[error("time '{0}' is not in HH:mm format")]
    Malformed(String),

    #[error("time '{0}' is out of range")]
    OutOfRange(String),
}

impl WallTime {
    pub const MIDNIGHT: WallTime = WallTime(0);

    /// Build from hours and minutes; `None` when outside `00:00..=23:59`.
    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if hours < 24 && minutes < MINUTES_PER_HOUR {
            Some(Self(hours * MINUTES_PER_HOUR + minutes))
        } else {
            None
        }
    }

    /// Build from minutes since midnight; `None` past `23:59`.
    pub fn from_minutes(minutes: i64) -> Option<Self> {
        if (0..i64::from(MINUTES_PER_DAY)).contains(&minutes) {
            Some(Self(minutes as u16))
        } else {
            None
        }
    }

    pub fn minutes_since_midnight(self) -> i64 {
        i64::from(self.0)
    }

    pub fn hours(self) -> u16 {
        self.0 / MINUTES_PER_HOUR
    }

    pub fn minutes(self) -> u16 {
        self.0 % MINUTES_PER_HOUR
    }

    /// Signed distance in minutes from `self` to `later`.
    pub fn minutes_until(self, later: WallTime) -> i64 {
        later.minutes_since_midnight() - self.minutes_since_midnight()
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minutes())
    }
}

impl FromStr for WallTime {
    type Err = ParseWallTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseWallTimeError::Empty);
        }

        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b':'
            && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());
        if !well_formed {
            return Err(ParseWallTimeError::Malformed(s.to_string()));
        }

        let digit = |i: usize| u16::from(bytes[i] - b'0');
        let hours = digit(0) * 10 + digit(1);
        let minutes = digit(3) * 10 + digit(4);

        Self::from_hm(hours, minutes).ok_or_else(|| ParseWallTimeError::OutOfRange(s.to_string()))
    }
}
