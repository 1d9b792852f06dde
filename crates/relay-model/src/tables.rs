//! Reference tables shared by indexing and matching.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A multi-pole switch suffix and the component names it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixExpansion {
    pub suffix: String,
    pub components: Vec<String>,
}

impl SuffixExpansion {
    pub fn new<I, S>(suffix: impl Into<String>, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffix: suffix.into(),
            components: components.into_iter().map(Into::into).collect(),
        }
    }
}

/// Maps a repository curve code to a target-model curve name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveMapEntry {
    /// Repository-side description, informational only.
    #[serde(default)]
    pub description: String,
    pub code: String,
    pub curve: String,
}

/// Override for a circuit breaker whose repository name differs from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CbAltName {
    pub substation: String,
    pub cb_name: String,
    pub new_name: String,
}

/// Alternate-name values that mean "no usable override".
pub const IGNORED_ALT_NAMES: &[&str] = &["not needed", "no active setting", "wrong sub name", "unknown"];

impl CbAltName {
    pub fn is_usable(&self) -> bool {
        let value = self.new_name.trim().to_lowercase();
        !value.is_empty() && !IGNORED_ALT_NAMES.contains(&value.as_str())
    }
}

/// Tables that drive setting index construction for a region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionTables {
    /// Records whose pattern contains any of these are never indexed.
    pub excluded_patterns: Vec<String>,
    /// Ordered longest suffix first.
    pub suffix_expansions: Vec<SuffixExpansion>,
    /// Numeric substation code to alpha code; `None` marks codes to leave unscoped.
    pub substation_map: BTreeMap<String, Option<String>>,
}

impl RegionTables {
    /// Sort suffix expansions so longer suffixes are tried first.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.suffix_expansions
            .sort_by(|a, b| b.suffix.len().cmp(&a.suffix.len()));
        self
    }

    pub fn is_excluded(&self, pattern: &str) -> bool {
        self.excluded_patterns
            .iter()
            .any(|excluded| pattern.contains(excluded.as_str()))
    }
}
