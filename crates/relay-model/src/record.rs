//! Raw setting records as returned by the settings repository.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// One untyped repository row keyed by lower-case column name.
pub type RawRow = BTreeMap<String, String>;

/// Column names the record reads from a [`RawRow`].
pub mod columns {
    pub const SETTING_ID: &str = "relaysettingid";
    pub const ASSET_NAME: &str = "assetname";
    pub const PATTERN_NAME: &str = "patternname";
    pub const DATE_SETTING: &str = "datesetting";
    pub const ACTIVE: &str = "active";
    pub const SWITCH_NAME: &str = "nameenu";
    pub const LOCATION_PATH: &str = "locationpathenu";
    pub const DEVICE_ID: &str = "deviceid";
}

/// A single setting record.
///
/// Records are created once from repository output and never mutated.
/// Columns that have no dedicated field are kept in [`SettingRecord::extra`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRecord {
    pub setting_id: String,
    pub asset_name: String,
    pub pattern_name: String,
    pub date_setting: Option<String>,
    pub active: Option<bool>,
    pub switch_name: Option<String>,
    pub location_path: Option<String>,
    pub device_id: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl SettingRecord {
    pub fn new(
        setting_id: impl Into<String>,
        asset_name: impl Into<String>,
        pattern_name: impl Into<String>,
    ) -> Self {
        Self {
            setting_id: setting_id.into(),
            asset_name: asset_name.into(),
            pattern_name: pattern_name.into(),
            date_setting: None,
            active: None,
            switch_name: None,
            location_path: None,
            device_id: None,
            extra: BTreeMap::new(),
        }
    }

    /// Build a record from a repository row.
    ///
    /// The setting id and pattern name are required; everything else is
    /// optional. Blank optional columns are treated as absent.
    pub fn from_raw(row: &RawRow) -> Result<Self> {
        let setting_id = required(row, columns::SETTING_ID)?;
        let pattern_name = required(row, columns::PATTERN_NAME)?;
        let asset_name = optional(row, columns::ASSET_NAME).unwrap_or_default();

        let extra = row
            .iter()
            .filter(|(key, _)| !is_known_column(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Self {
            setting_id,
            asset_name,
            pattern_name,
            date_setting: optional(row, columns::DATE_SETTING),
            active: optional(row, columns::ACTIVE).and_then(|value| parse_flag(&value)),
            switch_name: optional(row, columns::SWITCH_NAME),
            location_path: optional(row, columns::LOCATION_PATH),
            device_id: optional(row, columns::DEVICE_ID),
            extra,
        })
    }

    #[must_use]
    pub fn with_switch_name(mut self, name: impl Into<String>) -> Self {
        self.switch_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_location_path(mut self, path: impl Into<String>) -> Self {
        self.location_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_device_id(mut self, id: impl Into<String>) -> Self {
        self.device_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date_setting = Some(date.into());
        self
    }

    /// Records without an explicit flag count as active.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

fn required(row: &RawRow, key: &str) -> Result<String> {
    optional(row, key).ok_or_else(|| RelayError::missing_field(key))
}

fn optional(row: &RawRow, key: &str) -> Option<String> {
    row.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "t" => Some(true),
        "false" | "0" | "no" | "n" | "f" => Some(false),
        _ => None,
    }
}

fn is_known_column(key: &str) -> bool {
    matches!(
        key,
        columns::SETTING_ID
            | columns::ASSET_NAME
            | columns::PATTERN_NAME
            | columns::DATE_SETTING
            | columns::ACTIVE
            | columns::SWITCH_NAME
            | columns::LOCATION_PATH
            | columns::DEVICE_ID
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parses_known_columns_and_keeps_the_rest() {
        let record = SettingRecord::from_raw(&row(&[
            ("relaysettingid", "42"),
            ("assetname", "RC-001"),
            ("patternname", "CAPM4"),
            ("active", "False"),
            ("feeder", "F12"),
        ]))
        .expect("parse record");

        assert_eq!(record.setting_id, "42");
        assert_eq!(record.active, Some(false));
        assert!(!record.is_active());
        assert_eq!(record.get("feeder"), Some("F12"));
        assert!(record.switch_name.is_none());
    }

    #[test]
    fn missing_pattern_is_an_error() {
        let err = SettingRecord::from_raw(&row(&[("relaysettingid", "1")]))
            .expect_err("pattern is required");
        assert!(matches!(err, RelayError::MissingField { ref field } if field == "patternname"));
    }

    #[test]
    fn blank_optional_columns_are_absent() {
        let record = SettingRecord::from_raw(&row(&[
            ("relaysettingid", "7"),
            ("patternname", "SEL351"),
            ("deviceid", "  "),
        ]))
        .expect("parse record");
        assert!(record.device_id.is_none());
        assert!(record.is_active());
    }
}
