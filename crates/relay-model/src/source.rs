//! Collaborator interfaces for settings and rule data.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::error::Result;
use crate::record::RawRow;
use crate::region::Region;
use crate::rule::RuleTable;
use crate::tables::{CbAltName, CurveMapEntry, RegionTables, SuffixExpansion};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("settings repository unavailable: {0}")]
    Unavailable(String),
    #[error("settings query failed: {0}")]
    Query(String),
    #[error("no rows returned for {key}")]
    Empty { key: String },
    #[error("settings query for {key} failed after {attempts} attempts: {source}")]
    Exhausted {
        key: String,
        attempts: u32,
        #[source]
        source: Box<RepositoryError>,
    },
}

/// Source of raw setting rows.
pub trait SettingsRepository {
    fn query(&self, region: Region, filter_key: &str) -> std::result::Result<Vec<RawRow>, RepositoryError>;
}

/// Source of rule tables and the reference tables used around them.
pub trait MappingRuleSource {
    /// Rule table for a device pattern, or `None` when the pattern is unmapped.
    fn load_rules(&self, pattern: &str) -> Result<Option<Arc<RuleTable>>>;

    fn load_curve_mapping(&self) -> Result<Vec<CurveMapEntry>>;

    fn load_cb_alt_names(&self) -> Result<Vec<CbAltName>>;

    fn load_substation_mapping(&self) -> Result<BTreeMap<String, Option<String>>>;

    fn load_excluded_patterns(&self) -> Result<Vec<String>>;

    fn load_suffix_expansions(&self) -> Result<Vec<SuffixExpansion>>;

    /// All tables needed to build a setting index.
    fn load_region_tables(&self) -> Result<RegionTables> {
        Ok(RegionTables {
            excluded_patterns: self.load_excluded_patterns()?,
            suffix_expansions: self.load_suffix_expansions()?,
            substation_map: self.load_substation_mapping()?,
        }
        .normalized())
    }
}
