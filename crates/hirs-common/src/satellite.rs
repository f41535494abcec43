//! HIRS-carrying satellite platforms.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HirsError;

/// A satellite carrying a HIRS instrument.
///
/// Variants are declared in the same order as their identifiers sort, so the
/// derived `Ord` agrees with ordering by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Satellite {
    MetopA,
    MetopB,
    Noaa06,
    Noaa07,
    Noaa08,
    Noaa09,
    Noaa10,
    Noaa11,
    Noaa12,
    Noaa14,
    Noaa15,
    Noaa16,
    Noaa17,
    Noaa18,
    Noaa19,
}

impl Satellite {
    /// Every supported platform.
    pub const ALL: [Satellite; 15] = [
        Satellite::Noaa06,
        Satellite::Noaa07,
        Satellite::Noaa08,
        Satellite::Noaa09,
        Satellite::Noaa10,
        Satellite::Noaa11,
        Satellite::Noaa12,
        Satellite::Noaa14,
        Satellite::Noaa15,
        Satellite::Noaa16,
        Satellite::Noaa17,
        Satellite::Noaa18,
        Satellite::Noaa19,
        Satellite::MetopA,
        Satellite::MetopB,
    ];

    /// The lower-case identifier used in file names and catalog paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Satellite::MetopA => "metop-a",
            Satellite::MetopB => "metop-b",
            Satellite::Noaa06 => "noaa-06",
            Satellite::Noaa07 => "noaa-07",
            Satellite::Noaa08 => "noaa-08",
            Satellite::Noaa09 => "noaa-09",
            Satellite::Noaa10 => "noaa-10",
            Satellite::Noaa11 => "noaa-11",
            Satellite::Noaa12 => "noaa-12",
            Satellite::Noaa14 => "noaa-14",
            Satellite::Noaa15 => "noaa-15",
            Satellite::Noaa16 => "noaa-16",
            Satellite::Noaa17 => "noaa-17",
            Satellite::Noaa18 => "noaa-18",
            Satellite::Noaa19 => "noaa-19",
        }
    }
}

impl fmt::Display for Satellite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Satellite {
    type Err = HirsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Satellite::ALL
            .iter()
            .copied()
            .find(|sat| sat.as_str() == wanted)
            .ok_or_else(|| HirsError::UnknownSatellite(s.to_string()))
    }
}

impl TryFrom<String> for Satellite {
    type Error = HirsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Satellite> for String {
    fn from(sat: Satellite) -> Self {
        sat.as_str().to_string()
    }
}
