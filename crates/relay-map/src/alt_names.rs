//! Circuit breaker alternate-name overrides.

use relay_model::{CbAltName, MappingRuleSource, Result};
use tracing::debug;

/// Explicitly scoped cache of circuit breaker alternate names.
///
/// Entries load from the rule source on first use and stay until
/// [`CbAltNameCache::reset`]. Unusable overrides are dropped at load time.
#[derive(Debug, Default)]
pub struct CbAltNameCache {
    entries: Option<Vec<CbAltName>>,
}

impl CbAltNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache primed with entries, bypassing the rule source.
    pub fn with_entries(entries: Vec<CbAltName>) -> Self {
        Self {
            entries: Some(entries.into_iter().filter(CbAltName::is_usable).collect()),
        }
    }

    pub fn ensure_loaded(&mut self, source: &dyn MappingRuleSource) -> Result<&[CbAltName]> {
        if self.entries.is_none() {
            let entries: Vec<CbAltName> = source
                .load_cb_alt_names()?
                .into_iter()
                .filter(CbAltName::is_usable)
                .collect();
            debug!(count = entries.len(), "loaded circuit breaker alternate names");
            self.entries = Some(entries);
        }
        Ok(self.entries.as_deref().unwrap_or_default())
    }

    pub fn is_loaded(&self) -> bool {
        self.entries.is_some()
    }

    /// Override for a breaker in a substation folder, if one is configured.
    pub fn lookup(&self, substation: &str, cb_name: &str) -> Option<&str> {
        self.entries
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|entry| entry.substation == substation && entry.cb_name == cb_name)
            .map(|entry| entry.new_name.as_str())
    }

    /// Forget loaded entries so the next use reloads them.
    pub fn reset(&mut self) {
        self.entries = None;
    }
}
