//! Multi-key lookup structures over setting records.
//!
//! The index is built in one pass and is read-only afterwards. Records are
//! stored once and every map holds positions into that store, in insertion
//! order, so lookups return records in repository order.

use std::collections::HashMap;

use relay_model::{RawRow, Region, RegionTables, SettingRecord};
use tracing::{debug, warn};

use crate::expand::{SubstationScope, derive_substation, expand_double_box};
use crate::naming::base_switch_name;

/// Shortest prefix length indexed for asset names.
pub const MIN_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub indexed: usize,
    pub excluded: usize,
    pub inactive: usize,
    pub malformed: usize,
}

#[derive(Debug, Clone)]
pub struct SettingIndex {
    region: Region,
    records: Vec<SettingRecord>,
    scopes: Vec<SubstationScope>,
    by_setting_id: HashMap<String, usize>,
    by_asset: HashMap<String, Vec<usize>>,
    by_prefix: HashMap<String, Vec<usize>>,
    by_switch: HashMap<String, Vec<usize>>,
    by_substation: HashMap<String, HashMap<String, Vec<usize>>>,
    stats: IndexStats,
}

impl SettingIndex {
    /// Index records for a region, dropping excluded and inactive ones.
    pub fn build<I>(records: I, region: Region, tables: &RegionTables) -> Self
    where
        I: IntoIterator<Item = SettingRecord>,
    {
        let mut index = Self {
            region,
            records: Vec::new(),
            scopes: Vec::new(),
            by_setting_id: HashMap::new(),
            by_asset: HashMap::new(),
            by_prefix: HashMap::new(),
            by_switch: HashMap::new(),
            by_substation: HashMap::new(),
            stats: IndexStats::default(),
        };

        for record in records {
            if tables.is_excluded(&record.pattern_name) {
                index.stats.excluded += 1;
                continue;
            }
            if region.uses_active_flag() && !record.is_active() {
                index.stats.inactive += 1;
                continue;
            }
            index.insert(record, tables);
        }

        debug!(
            region = %region,
            indexed = index.stats.indexed,
            excluded = index.stats.excluded,
            inactive = index.stats.inactive,
            "setting index built"
        );
        index
    }

    /// Index raw repository rows, skipping rows that are not valid records.
    pub fn from_rows(rows: &[RawRow], region: Region, tables: &RegionTables) -> Self {
        let mut malformed = 0;
        let records: Vec<SettingRecord> = rows
            .iter()
            .filter_map(|row| match SettingRecord::from_raw(row) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(%error, "skipping malformed setting row");
                    malformed += 1;
                    None
                }
            })
            .collect();
        let mut index = Self::build(records, region, tables);
        index.stats.malformed = malformed;
        index
    }

    fn insert(&mut self, record: SettingRecord, tables: &RegionTables) {
        let position = self.records.len();
        let scope = derive_substation(record.location_path.as_deref(), &tables.substation_map);

        self.by_setting_id
            .entry(record.setting_id.clone())
            .or_insert(position);

        if !record.asset_name.is_empty() {
            push_unique(&mut self.by_asset, &record.asset_name, position);
            for prefix in prefixes(&record.asset_name) {
                push_unique(&mut self.by_prefix, prefix, position);
            }
        }

        if let Some(switch_name) = record.switch_name.as_deref() {
            for name in switch_keys(switch_name, tables) {
                push_unique(&mut self.by_switch, &name, position);
                if let Some(code) = scope.code() {
                    let scoped = self.by_substation.entry(code.to_string()).or_default();
                    push_unique(scoped, &name, position);
                }
            }
        }

        self.records.push(record);
        self.scopes.push(scope);
        self.stats.indexed += 1;
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SettingRecord] {
        &self.records
    }

    pub fn get_by_setting_id(&self, setting_id: &str) -> Option<&SettingRecord> {
        self.by_setting_id
            .get(setting_id)
            .map(|&position| &self.records[position])
    }

    pub fn get_by_asset_exact(&self, name: &str) -> Vec<&SettingRecord> {
        self.resolve(self.by_asset.get(name))
    }

    /// Records whose asset name contains `name`.
    ///
    /// Tries the exact map, then the prefix map, then a substring scan; the
    /// first non-empty tier wins.
    pub fn get_by_asset_contains(&self, name: &str) -> Vec<&SettingRecord> {
        let exact = self.get_by_asset_exact(name);
        if !exact.is_empty() {
            return exact;
        }
        let prefixed = self.get_by_asset_prefix(name);
        if !prefixed.is_empty() {
            return prefixed;
        }
        self.get_by_asset_substring(name)
    }

    /// Records whose asset name starts with `name`.
    pub fn get_by_asset_prefix(&self, name: &str) -> Vec<&SettingRecord> {
        self.resolve(self.by_prefix.get(name))
    }

    /// Records whose asset name contains `name` anywhere, by full scan.
    pub fn get_by_asset_substring(&self, name: &str) -> Vec<&SettingRecord> {
        if name.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|record| record.asset_name.contains(name))
            .collect()
    }

    /// Records indexed under a switch name, preferring the substation map.
    pub fn get_by_switch_name(&self, name: &str, substation: Option<&str>) -> Vec<&SettingRecord> {
        self.get_switch_entries(name, substation)
            .into_iter()
            .map(|(record, _)| record)
            .collect()
    }

    /// Like [`Self::get_by_switch_name`], paired with each record's substation scope.
    pub fn get_switch_entries(
        &self,
        name: &str,
        substation: Option<&str>,
    ) -> Vec<(&SettingRecord, &SubstationScope)> {
        let positions = substation
            .and_then(|code| self.by_substation.get(code))
            .and_then(|scoped| scoped.get(name))
            .or_else(|| self.by_switch.get(name));
        positions
            .map(|positions| {
                positions
                    .iter()
                    .map(|&p| (&self.records[p], &self.scopes[p]))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether any record is scoped to the substation.
    pub fn has_substation(&self, code: &str) -> bool {
        self.by_substation.contains_key(code)
    }

    fn resolve(&self, positions: Option<&Vec<usize>>) -> Vec<&SettingRecord> {
        positions
            .map(|positions| positions.iter().map(|&p| &self.records[p]).collect())
            .unwrap_or_default()
    }
}

/// Every name a switch record is reachable under.
///
/// The base name (before the first `_`) and its double box expansions, plus
/// the full name when it differs from both.
fn switch_keys(switch_name: &str, tables: &RegionTables) -> Vec<String> {
    let base = base_switch_name(switch_name);
    let mut keys = expand_double_box(base, &tables.suffix_expansions);
    if !keys.iter().any(|key| key == base) {
        keys.push(base.to_string());
    }
    if switch_name != base && !keys.iter().any(|key| key == switch_name) {
        keys.push(switch_name.to_string());
    }
    keys
}

/// Prefixes of at least [`MIN_PREFIX_LEN`] characters, up to the full name.
fn prefixes(name: &str) -> impl Iterator<Item = &str> {
    name.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(name.len()))
        .skip(MIN_PREFIX_LEN)
        .map(move |end| &name[..end])
}

fn push_unique(map: &mut HashMap<String, Vec<usize>>, key: &str, position: usize) {
    let positions = map.entry(key.to_string()).or_default();
    if !positions.contains(&position) {
        positions.push(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_start_at_four_chars() {
        let all: Vec<&str> = prefixes("RC-123").collect();
        assert_eq!(all, ["RC-1", "RC-12", "RC-123"]);
        assert_eq!(prefixes("RC-").count(), 0);
        assert_eq!(prefixes("RC-1").collect::<Vec<_>>(), ["RC-1"]);
    }

    #[test]
    fn switch_keys_include_combined_and_full_names() {
        let tables = RegionTables {
            suffix_expansions: vec![relay_model::SuffixExpansion::new("A+B", ["A", "B"])],
            ..RegionTables::default()
        };
        assert_eq!(
            switch_keys("NIP1A+B_CB", &tables),
            ["NIP1A", "NIP1B", "NIP1A+B", "NIP1A+B_CB"]
        );
        assert_eq!(switch_keys("NIP12", &tables), ["NIP12"]);
    }
}
