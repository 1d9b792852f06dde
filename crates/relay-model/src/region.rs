//! Distribution network regions served by the settings repository.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Region a settings run is scoped to.
///
/// Each region has its own record conventions: Energex indexes records by
/// switch name and substation, Ergon by asset-name containment and an
/// `active` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    Energex,
    Ergon,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Energex => "Energex",
            Self::Ergon => "Ergon",
        }
    }

    /// Parse a region name or one of its short codes, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ENERGEX" | "SEQ" | "EX" | "EE" => Some(Self::Energex),
            "ERGON" | "REG" => Some(Self::Ergon),
            _ => None,
        }
    }

    /// Whether records in this region carry an `active` flag that filters them.
    pub fn uses_active_flag(self) -> bool {
        matches!(self, Self::Ergon)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| RelayError::UnknownRegion(s.to_string()))
    }
}

impl TryFrom<String> for Region {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.as_str().to_string()
    }
}
