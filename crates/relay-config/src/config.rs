//! TOML configuration file for a settings run.
//!
//! Every section is optional. Missing reference tables fall back to the
//! built-in tables in [`crate::defaults`], so an empty file is a valid config
//! that simply has no rule tables.
//!
//! ```toml
//! region = "Energex"
//!
//! [retry]
//! max_attempts = 3
//!
//! [tables]
//! tally_lockout_patterns = ["RC01"]
//!
//! [[curve_mapping]]
//! code = "2"
//! curve = "IEC Very Inverse"
//!
//! [patterns."CAPM4"]
//! target_type = "Generic CAPM4"
//! rules = [["Relay Model", "OC1", "Ipset", "Group 1", "Pickup", "use_setting", "primary"]]
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use relay_model::{CbAltName, CurveMapEntry, MappingRule, Region, RuleTable, SuffixExpansion};
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;

/// Environment variable naming the config file to load.
pub const CONFIG_ENV_VAR: &str = "RELAY_SETTINGS_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub region: Option<Region>,
    pub retry: RetrySection,
    pub logging: LoggingSection,
    pub tables: TablesSection,
    pub curve_mapping: Vec<CurveMapEntry>,
    pub cb_alt_names: Vec<CbAltName>,
    pub patterns: BTreeMap<String, PatternSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub multiplier_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier_ms: 1000,
            max_delay_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: String,
    pub with_timestamps: bool,
    pub with_target: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            with_timestamps: false,
            with_target: false,
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesSection {
    pub excluded_patterns: Vec<String>,
    pub suffix_expansions: Vec<SuffixExpansion>,
    /// Empty values leave the numeric code unscoped.
    pub substation_map: BTreeMap<String, String>,
    pub out_of_service_patterns: Vec<String>,
    pub single_phase_patterns: Vec<String>,
    pub multi_phase_patterns: Vec<String>,
    pub tally_lockout_patterns: Vec<String>,
}

impl Default for TablesSection {
    fn default() -> Self {
        Self {
            excluded_patterns: defaults::excluded_patterns(),
            suffix_expansions: defaults::suffix_expansions(),
            substation_map: defaults::substation_map(),
            out_of_service_patterns: defaults::out_of_service_patterns(),
            single_phase_patterns: defaults::single_phase_patterns(),
            multi_phase_patterns: defaults::multi_phase_patterns(),
            tally_lockout_patterns: defaults::tally_lockout_patterns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSection {
    pub target_type: String,
    #[serde(default)]
    pub rules: Vec<Vec<String>>,
}

/// Bounded retry with randomized exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub multiplier: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Policy that retries without sleeping.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Upper bound of the wait before the given retry (1-based).
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.multiplier.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetrySection::default().policy()
    }
}

impl RetrySection {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            multiplier: Duration::from_millis(self.multiplier_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// Device pattern lists consulted while classifying devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternLists {
    pub out_of_service: Vec<String>,
    pub single_phase: Vec<String>,
    pub multi_phase: Vec<String>,
    pub tally_lockout: Vec<String>,
}

impl PatternLists {
    pub fn is_out_of_service(&self, pattern: &str) -> bool {
        self.out_of_service.iter().any(|p| p == pattern)
    }

    pub fn is_single_phase(&self, pattern: &str) -> bool {
        self.single_phase.iter().any(|p| p == pattern)
    }

    pub fn is_multi_phase(&self, pattern: &str) -> bool {
        self.multi_phase.iter().any(|p| p == pattern)
    }

    /// Tally patterns match as substrings of the device pattern.
    pub fn uses_lockout_tally(&self, pattern: &str) -> bool {
        self.tally_lockout
            .iter()
            .any(|p| pattern.contains(p.as_str()))
    }
}

/// Loaded configuration with rule tables ready to share across devices.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub region: Option<Region>,
    pub retry: RetryPolicy,
    pub logging: LoggingSection,
    pub patterns: PatternLists,
    pub(crate) tables: TablesSection,
    pub(crate) curve_mapping: Vec<CurveMapEntry>,
    pub(crate) cb_alt_names: Vec<CbAltName>,
    pub(crate) rule_tables: HashMap<String, Arc<RuleTable>>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        // The default file has no rule tables, so validation cannot fail.
        Self::from_file(ConfigFile::default()).unwrap_or_else(|_| Self::empty())
    }
}

impl RelayConfig {
    fn empty() -> Self {
        Self {
            region: None,
            retry: RetryPolicy::default(),
            logging: LoggingSection::default(),
            patterns: PatternLists::default(),
            tables: TablesSection::default(),
            curve_mapping: Vec::new(),
            cb_alt_names: Vec::new(),
            rule_tables: HashMap::new(),
        }
    }

    /// Load the file named by [`CONFIG_ENV_VAR`], or the built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_file(file)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| ConfigError::Toml {
            path: PathBuf::from("<inline>"),
            source: e,
        })?;
        Self::from_file(file)
    }

    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let mut rule_tables = HashMap::new();
        for (pattern, section) in file.patterns {
            if section.target_type.trim().is_empty() {
                return Err(ConfigError::invalid(format!(
                    "pattern {pattern} has no target_type"
                )));
            }
            let rules = section.rules.into_iter().map(MappingRule::new).collect();
            let table = RuleTable::new(pattern.clone(), section.target_type, rules);
            rule_tables.insert(pattern, Arc::new(table));
        }

        let patterns = PatternLists {
            out_of_service: file.tables.out_of_service_patterns.clone(),
            single_phase: file.tables.single_phase_patterns.clone(),
            multi_phase: file.tables.multi_phase_patterns.clone(),
            tally_lockout: file.tables.tally_lockout_patterns.clone(),
        };

        Ok(Self {
            region: file.region,
            retry: file.retry.policy(),
            logging: file.logging,
            patterns,
            tables: file.tables,
            curve_mapping: file.curve_mapping,
            cb_alt_names: file.cb_alt_names,
            rule_tables,
        })
    }

    /// Register or replace a rule table.
    pub fn register_rules(&mut self, table: RuleTable) {
        self.rule_tables
            .insert(table.pattern.clone(), Arc::new(table));
    }

    /// Patterns with a rule table, sorted.
    pub fn mapped_patterns(&self) -> Vec<&str> {
        let mut patterns: Vec<&str> = self.rule_tables.keys().map(String::as_str).collect();
        patterns.sort_unstable();
        patterns
    }

    pub fn is_mapped(&self, pattern: &str) -> bool {
        self.rule_tables.contains_key(pattern)
    }

    #[must_use]
    pub fn with_curve_mapping(mut self, entries: Vec<CurveMapEntry>) -> Self {
        self.curve_mapping = entries;
        self
    }

    #[must_use]
    pub fn with_cb_alt_names(mut self, entries: Vec<CbAltName>) -> Self {
        self.cb_alt_names = entries;
        self
    }
}
