//! Mapping rule rows and per-pattern rule tables.
//!
//! A rule row is a positional tuple:
//!
//! | column | meaning                                   |
//! |--------|-------------------------------------------|
//! | 0      | target folder token                       |
//! | 1      | target element name                       |
//! | 2      | target attribute name                     |
//! | 3..=5  | address-match columns                     |
//! | 6      | adjustment specifier                      |
//! | 7      | adjustment operand                        |
//!
//! Trailing columns carry rule-specific flags and are addressed from the end.
//! Rule tables are shared across every device of a pattern, so rows are never
//! edited in place; lookups work on copies from [`MappingRule::with_element`].

use serde::{Deserialize, Serialize};

/// Address cell that accepts any value and captures it.
pub const USE_SETTING: &str = "use_setting";

/// Folder tokens that stand for the device itself.
pub const DEVICE_FOLDER_PLACEHOLDERS: &[&str] = &["Relay Model", "Default", "default"];

/// Column index of the first address-match column.
pub const ADDRESS_START: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingRule {
    columns: Vec<String>,
}

impl MappingRule {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    pub fn folder(&self) -> &str {
        self.column(0).unwrap_or_default()
    }

    pub fn element(&self) -> &str {
        self.column(1).unwrap_or_default()
    }

    pub fn attribute(&self) -> &str {
        self.column(2).unwrap_or_default()
    }

    /// Address-match cell for a setting field position (0-based).
    pub fn address(&self, position: usize) -> Option<&str> {
        self.column(ADDRESS_START + position)
    }

    pub fn adjustment(&self) -> Option<&str> {
        self.column(6)
    }

    pub fn operand(&self) -> Option<&str> {
        self.column(7)
    }

    /// Column counted from the end; `0` is the last column.
    pub fn from_end(&self, offset: usize) -> &str {
        self.columns
            .len()
            .checked_sub(offset + 1)
            .and_then(|index| self.column(index))
            .unwrap_or_default()
    }

    pub fn last(&self) -> &str {
        self.from_end(0)
    }

    pub fn second_last(&self) -> &str {
        self.from_end(1)
    }

    pub fn third_last(&self) -> &str {
        self.from_end(2)
    }

    /// Setting dictionary key: folder, element and attribute concatenated.
    pub fn key(&self) -> String {
        self.columns.iter().take(3).map(String::as_str).collect()
    }

    /// Copy of this row with a different element name, for lookups.
    #[must_use]
    pub fn with_element(&self, element: impl Into<String>) -> Self {
        let mut copy = self.clone();
        if let Some(cell) = copy.columns.get_mut(1) {
            *cell = element.into();
        }
        copy
    }

    /// Copy of this row with a different folder token.
    #[must_use]
    pub fn with_folder(&self, folder: impl Into<String>) -> Self {
        let mut copy = self.clone();
        if let Some(cell) = copy.columns.get_mut(0) {
            *cell = folder.into();
        }
        copy
    }

    fn is_placeholder_row(&self) -> bool {
        if self.address(0) != Some("None") || self.element().contains("_dip") {
            return false;
        }
        self.address(1).is_none_or(str::is_empty)
    }
}

/// Rule rows for one device pattern plus the target relay type they assume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    pub pattern: String,
    pub target_type: String,
    pub rules: Vec<MappingRule>,
}

impl RuleTable {
    pub fn new(
        pattern: impl Into<String>,
        target_type: impl Into<String>,
        rules: Vec<MappingRule>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            target_type: target_type.into(),
            rules,
        }
    }

    /// Per-device working copy of the table.
    ///
    /// Drops rows too short to address anything and `None` placeholder rows,
    /// substitutes the device name for folder placeholders and trims trailing
    /// empty cells. The table itself is left untouched.
    pub fn prepare_for_device(&self, device_name: &str) -> Vec<MappingRule> {
        self.rules
            .iter()
            .filter(|rule| rule.len() > ADDRESS_START)
            .filter(|rule| !rule.is_placeholder_row())
            .map(|rule| {
                let mut copy = if DEVICE_FOLDER_PLACEHOLDERS.contains(&rule.folder()) {
                    rule.with_folder(device_name)
                } else {
                    rule.clone()
                };
                while copy.columns.last().is_some_and(String::is_empty) {
                    copy.columns.pop();
                }
                copy
            })
            .collect()
    }
}
