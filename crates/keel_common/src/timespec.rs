//! Simulated-time timeout specifications.
//!
//! Test cases declare how much *simulated* time they need through a source
//! pragma such as `-- pragma simulation timeout 10 ms`. The value is handed
//! to the simulator as a stop time; it is not a wall-clock limit.

use std::fmt;
use std::str::FromStr;

/// SI time unit accepted by the timeout pragma.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimeUnit {
    /// Picoseconds.
    Ps,
    /// Nanoseconds.
    Ns,
    /// Microseconds.
    Us,
    /// Milliseconds.
    Ms,
    /// Seconds.
    S,
}

impl TimeUnit {
    fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Ps => "ps",
            TimeUnit::Ns => "ns",
            TimeUnit::Us => "us",
            TimeUnit::Ms => "ms",
            TimeUnit::S => "s",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A simulated-time duration such as `1 ms` or `2.5 us`.
///
/// The numeric part is kept as written (a decimal number with an optional
/// fraction) so the value round-trips exactly into simulator command lines
/// and generated scripts.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TimeSpec {
    value: String,
    unit: TimeUnit,
}

impl TimeSpec {
    /// The default timeout used when a test case carries no pragma.
    pub fn default_timeout() -> Self {
        Self {
            value: "1".to_string(),
            unit: TimeUnit::Ms,
        }
    }

    /// The numeric part, as written in the source.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The time unit.
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Renders without the separating space (`1ms`), the form GHDL's
    /// `--stop-time` switch expects.
    pub fn compact(&self) -> String {
        format!("{}{}", self.value, self.unit)
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Error produced for a malformed timeout specification.
#[derive(Debug, thiserror::Error)]
#[error("invalid time specification '{input}': expected NUMBER [pnum]?s")]
pub struct ParseTimeSpecError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for TimeSpec {
    type Err = ParseTimeSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimeSpecError {
            input: s.to_string(),
        };
        let mut parts = s.split_whitespace();
        let value = parts.next().ok_or_else(err)?;
        let unit = parts.next().ok_or_else(err)?;
        if parts.next().is_some() {
            return Err(err());
        }
        let mut digits = value.splitn(2, '.');
        let whole = digits.next().unwrap_or("");
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        if let Some(frac) = digits.next() {
            if !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(err());
            }
        }
        let unit = match unit {
            "ps" => TimeUnit::Ps,
            "ns" => TimeUnit::Ns,
            "us" => TimeUnit::Us,
            "ms" => TimeUnit::Ms,
            "s" => TimeUnit::S,
            _ => return Err(err()),
        };
        Ok(Self {
            value: value.to_string(),
            unit,
        })
    }
}
