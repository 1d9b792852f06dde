//! Per-device setting rows and the values resolved from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::RawRow;

/// One proposed setting for a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingRow {
    pub block_path: String,
    pub param_name: String,
    pub proposed_value: String,
    pub unit: String,
}

impl SettingRow {
    /// Number of leading fields that take part in rule address matching.
    pub const ADDRESS_WIDTH: usize = 3;

    pub fn new(
        block_path: impl Into<String>,
        param_name: impl Into<String>,
        proposed_value: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            block_path: block_path.into(),
            param_name: param_name.into(),
            proposed_value: proposed_value.into(),
            unit: unit.into(),
        }
    }

    pub fn from_raw(row: &RawRow) -> Self {
        let field = |key: &str| row.get(key).cloned().unwrap_or_default();
        Self {
            block_path: field("blockpathenu"),
            param_name: field("paramnameenu"),
            proposed_value: field("proposedsetting"),
            unit: field("unitenu"),
        }
    }

    /// Address field by position: block path, parameter name, proposed value.
    pub fn address(&self, position: usize) -> Option<&str> {
        match position {
            0 => Some(&self.block_path),
            1 => Some(&self.param_name),
            2 => Some(&self.proposed_value),
            _ => None,
        }
    }

    /// Proposed value normalised by its unit tag.
    ///
    /// Milli-units are scaled down and kilo-amps scaled up so values land in
    /// base units. Unparseable values are kept verbatim.
    pub fn normalized_value(&self) -> SettingValue {
        normalize_unit(&self.proposed_value, &self.unit)
    }
}

/// Scale a raw value according to its unit tag.
pub fn normalize_unit(value: &str, unit: &str) -> SettingValue {
    if !matches!(unit, "mA" | "ms" | "kA") {
        return SettingValue::Text(value.to_string());
    }
    match value.trim().parse::<f64>() {
        Ok(number) if unit == "kA" => SettingValue::Number(number * 1000.0),
        Ok(number) => SettingValue::Number(number / 1000.0),
        Err(_) => SettingValue::Text(value.to_string()),
    }
}

/// A value stored in the setting dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Number(f64),
    Text(String),
}

impl SettingValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Integer view; numbers truncate, text must be an integer literal.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(number) if number.is_finite() => Some(number.trunc() as i64),
            Self::Number(_) => None,
            Self::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Blank text and numeric zero both count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Number(number) => *number == 0.0,
            Self::Text(text) => text.is_empty(),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{}", format_number(*number)),
        }
    }
}

/// Render a float with at least one decimal place, e.g. `1.0`, `0.25`.
pub fn format_number(number: f64) -> String {
    if number.is_finite() && number.fract() == 0.0 && number.abs() < 1e16 {
        format!("{number:.1}")
    } else {
        number.to_string()
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// An instrument transformer reading attached to a setting id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentReading {
    pub setting_id: String,
    pub name: String,
    pub value: String,
}

impl InstrumentReading {
    pub fn new(
        setting_id: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            setting_id: setting_id.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}
