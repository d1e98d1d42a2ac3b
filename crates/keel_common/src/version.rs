//! VHDL language-version arithmetic.
//!
//! VHDL revisions are identified by year. Users and filename tags write them
//! as either two-digit or four-digit years; internally a version is always a
//! full four-digit year. Two-digit years 70–99 map into the 1900s, 00–69
//! into the 2000s, matching how simulators interpret `-93`-style switches.

use std::fmt;
use std::str::FromStr;

/// A VHDL language version, stored as a full four-digit year.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VhdlVersion(u16);

impl VhdlVersion {
    /// VHDL-1987.
    pub const V1987: VhdlVersion = VhdlVersion(1987);
    /// VHDL-1993.
    pub const V1993: VhdlVersion = VhdlVersion(1993);
    /// VHDL-2000.
    pub const V2000: VhdlVersion = VhdlVersion(2000);
    /// VHDL-2002.
    pub const V2002: VhdlVersion = VhdlVersion(2002);
    /// VHDL-2008, the default desired version.
    pub const V2008: VhdlVersion = VhdlVersion(2008);

    /// Normalizes a two- or four-digit year to a full version.
    ///
    /// Values below 70 are taken as 2000-based, values below 100 as
    /// 1900-based, and anything else as a literal year.
    pub fn from_year(year: u16) -> Self {
        if year < 70 {
            Self(year + 2000)
        } else if year < 100 {
            Self(year + 1900)
        } else {
            Self(year)
        }
    }

    /// Returns the full four-digit year of this version.
    pub fn year(self) -> u16 {
        self.0
    }

    /// Absolute distance in years between two versions.
    pub fn distance(self, other: VhdlVersion) -> u16 {
        self.0.abs_diff(other.0)
    }

    /// Picks the candidate closest to `desired`, ties toward the lower year.
    ///
    /// Returns `None` for an empty candidate set.
    pub fn closest_to<I>(candidates: I, desired: VhdlVersion) -> Option<VhdlVersion>
    where
        I: IntoIterator<Item = VhdlVersion>,
    {
        candidates
            .into_iter()
            .min_by_key(|v| (v.distance(desired), v.year()))
    }
}

impl fmt::Display for VhdlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

/// Error produced when a version string is not a 2- or 4-digit year.
#[derive(Debug, thiserror::Error)]
#[error("invalid VHDL version '{input}': expected a 2- or 4-digit year")]
pub struct ParseVersionError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for VhdlVersion {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let valid_len = trimmed.len() == 2 || trimmed.len() == 4;
        match trimmed.parse::<u16>() {
            Ok(year) if valid_len => Ok(Self::from_year(year)),
            _ => Err(ParseVersionError {
                input: s.to_string(),
            }),
        }
    }
}
