use std::collections::BTreeMap;
use std::sync::Arc;

use relay_model::{
    CbAltName, CurveMapEntry, MappingRuleSource, Result, RuleTable, SuffixExpansion,
};

use crate::config::RelayConfig;

impl MappingRuleSource for RelayConfig {
    fn load_rules(&self, pattern: &str) -> Result<Option<Arc<RuleTable>>> {
        Ok(self.rule_tables.get(pattern).cloned())
    }

    fn load_curve_mapping(&self) -> Result<Vec<CurveMapEntry>> {
        Ok(self.curve_mapping.clone())
    }

    fn load_cb_alt_names(&self) -> Result<Vec<CbAltName>> {
        Ok(self.cb_alt_names.clone())
    }

    fn load_substation_mapping(&self) -> Result<BTreeMap<String, Option<String>>> {
        Ok(self
            .tables
            .substation_map
            .iter()
            .map(|(code, alpha)| {
                let alpha = alpha.trim();
                let alpha = (!alpha.is_empty()).then(|| alpha.to_string());
                (code.clone(), alpha)
            })
            .collect())
    }

    fn load_excluded_patterns(&self) -> Result<Vec<String>> {
        Ok(self.tables.excluded_patterns.clone())
    }

    fn load_suffix_expansions(&self) -> Result<Vec<SuffixExpansion>> {
        Ok(self.tables.suffix_expansions.clone())
    }
}
