//! Device to setting record matching strategies.

use relay_model::SettingRecord;
use tracing::debug;

use crate::alt_names::CbAltNameCache;
use crate::expand::SubstationScope;
use crate::index::SettingIndex;
use crate::naming::{MIN_SWITCH_NAME_LEN, base_switch_name};

/// A switch in the target model to find settings for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchQuery {
    pub name: String,
    /// Name of the folder holding the switch.
    pub folder: String,
    /// Coupler switches live directly in a substation folder.
    pub coupler: bool,
}

impl SwitchQuery {
    pub fn station_switch(name: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
            coupler: false,
        }
    }

    pub fn coupler(name: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folder: folder.into(),
            coupler: true,
        }
    }

    pub fn substation_code(&self) -> Option<&str> {
        self.coupler.then_some(self.folder.as_str())
    }
}

/// How a switch candidate was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRoute {
    /// Found under the switch's own substation.
    Substation,
    /// Found by switch name alone.
    Unscoped,
    /// The record's substation segment could not be translated, so it is
    /// accepted for any substation. Records from a sibling substation with
    /// the same numeric code are indistinguishable here.
    NumericPassThrough,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCandidate<'a> {
    pub record: &'a SettingRecord,
    pub route: MatchRoute,
}

/// Outcome of matching one switch.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchMatch<'a> {
    /// Base switch name after any alternate-name override.
    pub switch_name: String,
    pub candidates: Vec<SwitchCandidate<'a>>,
}

impl<'a> SwitchMatch<'a> {
    pub fn records(&self) -> Vec<&'a SettingRecord> {
        self.candidates.iter().map(|c| c.record).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Resolves target devices and switches to setting records.
#[derive(Debug, Clone, Copy)]
pub struct DeviceMatcher<'a> {
    index: &'a SettingIndex,
}

impl<'a> DeviceMatcher<'a> {
    pub fn new(index: &'a SettingIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &'a SettingIndex {
        self.index
    }

    /// Records whose asset name contains the device identifier.
    ///
    /// An exact asset match is returned alone. Otherwise containing records
    /// are kept unless the asset continues the identifier with another digit,
    /// so `RC-12` never picks up `RC-123`.
    pub fn match_by_containment(&self, device: &str) -> Vec<&'a SettingRecord> {
        let exact = self.index.get_by_asset_exact(device);
        if !exact.is_empty() {
            return exact;
        }
        let keep = |records: Vec<&'a SettingRecord>| -> Vec<&'a SettingRecord> {
            records
                .into_iter()
                .filter(|record| !extends_with_digit(&record.asset_name, device))
                .collect()
        };
        let prefixed = keep(self.index.get_by_asset_prefix(device));
        if !prefixed.is_empty() {
            return prefixed;
        }
        keep(self.index.get_by_asset_substring(device))
    }

    /// Records for a switch, keyed by its base name and substation.
    pub fn match_switch(&self, query: &SwitchQuery, alt_names: &CbAltNameCache) -> Option<SwitchMatch<'a>> {
        let display_name = alt_names
            .lookup(&query.folder, &query.name)
            .unwrap_or(&query.name);
        let switch_name = base_switch_name(display_name);
        if switch_name.chars().count() < MIN_SWITCH_NAME_LEN {
            debug!(switch = %query.name, "switch name too short to match");
            return None;
        }

        let substation = query.substation_code();
        let candidates = match substation {
            Some(code) if self.index.has_substation(code) => self.scoped_candidates(switch_name, code),
            _ => self
                .index
                .get_by_switch_name(switch_name, None)
                .into_iter()
                .map(|record| SwitchCandidate {
                    record,
                    route: MatchRoute::Unscoped,
                })
                .collect(),
        };

        Some(SwitchMatch {
            switch_name: switch_name.to_string(),
            candidates,
        })
    }

    fn scoped_candidates(&self, switch_name: &str, code: &str) -> Vec<SwitchCandidate<'a>> {
        let scoped: Vec<SwitchCandidate<'a>> = self
            .index
            .get_switch_entries(switch_name, Some(code))
            .into_iter()
            .filter(|(_, scope)| scope.code() == Some(code))
            .map(|(record, _)| SwitchCandidate {
                record,
                route: MatchRoute::Substation,
            })
            .collect();
        if !scoped.is_empty() {
            return scoped;
        }

        self.index
            .get_switch_entries(switch_name, None)
            .into_iter()
            .filter_map(|(record, scope)| {
                let route = match scope {
                    SubstationScope::Scoped(_) => return None,
                    SubstationScope::Untranslatable(_) => MatchRoute::NumericPassThrough,
                    SubstationScope::Unknown => MatchRoute::Unscoped,
                };
                Some(SwitchCandidate { record, route })
            })
            .collect()
    }
}

fn extends_with_digit(asset_name: &str, device: &str) -> bool {
    if device.is_empty() {
        return false;
    }
    asset_name.match_indices(device).all(|(offset, _)| {
        asset_name[offset + device.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_extension_guard() {
        assert!(extends_with_digit("RC-123", "RC-12"));
        assert!(!extends_with_digit("RC-12 Pole", "RC-12"));
        assert!(!extends_with_digit("RC-12A", "RC-12"));
        assert!(!extends_with_digit("RC-123 RC-12", "RC-12"));
    }
}
