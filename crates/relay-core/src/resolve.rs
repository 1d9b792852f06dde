//! Value resolution helpers used while applying mapping rules.

use relay_model::{AttrValue, CurveMapEntry, MappingRule, ObjectId, SettingValue, TransformerRatio};

use crate::engine::SettingDictionary;
use crate::error::{CoreError, Result};
use crate::model::{TYPE_ATTR, TargetDeviceModel};

/// Enabled state returned by [`determine_on_off`].
pub const ENABLED: i64 = 0;
/// Disabled state returned by [`determine_on_off`].
pub const DISABLED: i64 = 1;

/// Leading zeros prepended before bit positions are read.
const BINARY_PADDING: usize = 13;

/// Value written when a direct setting cannot be coerced to a number.
pub const COERCION_SENTINEL: i64 = 9999;

const CURVE_KEYWORDS: &[(&str, &str)] = &[
    ("Extreme", "Extreme"),
    ("Standard", "Standard"),
    ("Very", "Very"),
    ("Definite", "DT"),
    ("Curve A", "Curve A"),
    ("Curve B", "Curve B"),
    ("Curve C", "Curve C"),
    ("Curve D", "Curve D"),
];

/// Rebuild a value from selected bits of its binary form.
///
/// Each digit of `positions` names a bit counted from the right (1-based);
/// the selected characters are concatenated in the order given. Returns
/// `None` when the value is not an integer.
pub fn convert_binary(value: &SettingValue, positions: &str) -> Option<String> {
    let number = match value {
        SettingValue::Number(n) if n.fract() == 0.0 => *n as i64,
        SettingValue::Number(_) => return None,
        SettingValue::Text(text) => text.trim().parse::<i64>().ok()?,
    };
    let binary = format!("{}{:b}", "0".repeat(BINARY_PADDING), number.unsigned_abs());
    let bits = binary.as_bytes();
    Some(
        positions
            .chars()
            .map(|c| {
                let offset = c.to_digit(10).unwrap_or(0) as usize;
                let index = if offset == 0 { Some(0) } else { bits.len().checked_sub(offset) };
                index
                    .and_then(|i| bits.get(i))
                    .map_or('0', |b| char::from(*b))
            })
            .collect(),
    )
}

/// Resolve a setting against a disable condition to [`ENABLED`] or [`DISABLED`].
///
/// The condition is either an integer bit index into the value's digit
/// string, the `ON`/`OFF` sentinels, a bracketed list such as
/// `[off, disabled]`, or a single string. Empty values are enabled only
/// against `ON`.
pub fn determine_on_off(value: Option<&SettingValue>, condition: &str) -> i64 {
    let value = value.filter(|v| !v.is_empty());
    let Some(value) = value else {
        return if condition == "ON" { ENABLED } else { DISABLED };
    };

    if let Ok(bit) = condition.trim().parse::<i64>() {
        return match bit_at(&value.to_string(), bit) {
            Some('1') => ENABLED,
            _ => DISABLED,
        };
    }

    let rendered = value.to_string().to_lowercase();
    if disable_list(condition).iter().any(|item| *item == rendered) {
        DISABLED
    } else {
        ENABLED
    }
}

/// Bit character at `index` of a binary digit string, or `None` if the
/// string is not binary.
fn bit_at(rendered: &str, index: i64) -> Option<char> {
    let width = match rendered.find('e') {
        Some(_) => rendered
            .chars()
            .last()
            .and_then(|c| c.to_digit(10))
            .map_or(rendered.len(), |d| d as usize + 1),
        None => rendered.len(),
    };
    let mut digits: Vec<char> = rendered
        .chars()
        .take_while(|c| *c != 'e')
        .filter(|c| *c != '.')
        .collect();
    while digits.len() < width {
        digits.push('0');
    }
    if digits.iter().any(|c| !matches!(c, '0' | '1')) {
        return None;
    }
    let position = if index < 0 {
        digits.len().checked_sub(index.unsigned_abs() as usize)
    } else {
        Some(index as usize)
    };
    Some(position.and_then(|p| digits.get(p).copied()).unwrap_or('0'))
}

fn disable_list(condition: &str) -> Vec<String> {
    let Some(start) = condition.find('[') else {
        return vec![condition.to_lowercase()];
    };
    if !condition[start..].contains(']') {
        return vec![condition.to_lowercase()];
    }
    let inner = &condition[start + 1..];
    let inner = inner.split(']').next().unwrap_or_default();
    inner
        .split(',')
        .map(|item| item.replace(' ', "").to_lowercase())
        .collect()
}

/// How a rule scales or offsets its setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// Divide by the CT primary.
    Primary,
    /// Divide by the CT secondary.
    Secondary,
    /// Multiply by secondary over primary.
    Ctr,
    /// Percent of the CT secondary.
    PercPu,
    Add(f64),
    Subtract(f64),
    Multiply(f64),
    Divide(f64),
    Unchanged,
}

impl Adjustment {
    pub fn from_rule(rule: &MappingRule) -> Result<Self> {
        let kind = match rule.last() {
            "primary" => return Ok(Self::Primary),
            "secondary" => return Ok(Self::Secondary),
            "ctr" => return Ok(Self::Ctr),
            "perc_pu" => return Ok(Self::PercPu),
            _ => rule.adjustment().unwrap_or_default(),
        };
        let build: fn(f64) -> Self = match kind {
            "+" => Self::Add,
            "-" => Self::Subtract,
            "*" => Self::Multiply,
            "/" => Self::Divide,
            _ => return Ok(Self::Unchanged),
        };
        let operand = rule.operand().unwrap_or_default();
        operand
            .trim()
            .parse::<f64>()
            .map(build)
            .map_err(|_| CoreError::Operand {
                key: rule.key(),
                operand: operand.to_string(),
            })
    }

    pub fn apply(self, value: f64, ct: TransformerRatio) -> f64 {
        let primary = ct.primary as f64;
        let secondary = ct.secondary as f64;
        match self {
            Self::Primary => divide(value, primary),
            Self::Secondary => divide(value, secondary),
            Self::Ctr => divide(value * secondary, primary),
            Self::PercPu => value / 100.0 * secondary,
            Self::Add(operand) => value + operand,
            Self::Subtract(operand) => value - operand,
            Self::Multiply(operand) => value * operand,
            Self::Divide(operand) => divide(value, operand),
            Self::Unchanged => value,
        }
    }
}

fn divide(value: f64, divisor: f64) -> f64 {
    if divisor == 0.0 { 0.0 } else { value / divisor }
}

/// Adjusted value for a rule.
///
/// Non-numeric settings resolve through [`determine_on_off`] using the
/// rule's adjustment column as the disable condition. A missing setting
/// adjusts from zero.
pub fn setting_adjustment(
    rule: &MappingRule,
    dictionary: &SettingDictionary,
    ct: TransformerRatio,
) -> Result<AttrValue> {
    let raw = dictionary.get(&rule.key());
    let value = match raw {
        Some(setting) => match setting.as_f64() {
            Some(number) => number,
            None => match rule.adjustment() {
                Some(condition) => return Ok(AttrValue::Int(determine_on_off(Some(setting), condition))),
                None => 0.0,
            },
        },
        None => 0.0,
    };
    Ok(AttrValue::Float(Adjustment::from_rule(rule)?.apply(value, ct)))
}

/// Coerce a stored setting for a direct write.
///
/// Text targets keep the raw string. Otherwise float parsing is tried before
/// integer parsing, and values that are neither become [`COERCION_SENTINEL`].
pub fn coerce_direct(value: &SettingValue, existing: &AttrValue) -> AttrValue {
    if let (AttrValue::Text(_), SettingValue::Text(text)) = (existing, value) {
        return AttrValue::text(text.as_str());
    }
    match value {
        SettingValue::Number(number) => AttrValue::Float(*number),
        SettingValue::Text(text) => {
            let text = text.trim();
            if let Ok(number) = text.parse::<f64>() {
                AttrValue::Float(number)
            } else if let Ok(number) = text.parse::<i64>() {
                AttrValue::Int(number)
            } else {
                AttrValue::Int(COERCION_SENTINEL)
            }
        }
    }
}

/// Whether writing `candidate` would change `existing`.
///
/// Numeric values compare against the existing value rounded to three
/// decimals.
pub fn differs(candidate: &AttrValue, existing: &AttrValue) -> bool {
    match (candidate.as_f64(), existing.as_f64()) {
        (Some(new), Some(old)) => new != round3(old),
        _ => candidate != existing,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Curve object on an element's type matching a repository curve setting.
///
/// Tries an exact name, then containment (setting within curve name first),
/// then the curve mapping table, then family keywords, then any `Standard`
/// curve, then the first curve.
pub fn resolve_curve(
    model: &dyn TargetDeviceModel,
    element: ObjectId,
    setting: &str,
    curve_mapping: &[CurveMapEntry],
) -> Result<Option<ObjectId>> {
    let Some(element_type) = model.reference(element, TYPE_ATTR)? else {
        return Ok(None);
    };
    let mut curves = Vec::new();
    for item in model.get_attribute(element_type, "pcharac")?.as_list().unwrap_or_default() {
        if let Some(curve) = item.as_ref() {
            curves.push((model.name(curve)?, curve));
        }
    }
    Ok(pick_curve(&curves, setting, curve_mapping))
}

fn pick_curve(curves: &[(String, ObjectId)], setting: &str, curve_mapping: &[CurveMapEntry]) -> Option<ObjectId> {
    let find = |predicate: &dyn Fn(&str) -> bool| {
        curves
            .iter()
            .find(|(name, _)| predicate(name.as_str()))
            .map(|(_, id)| *id)
    };

    find(&|name| name == setting)
        .or_else(|| find(&|name| name.contains(setting)))
        .or_else(|| find(&|name| setting.contains(name)))
        .or_else(|| {
            let mapped = mapped_curve(setting, curve_mapping)?;
            find(&|name| name == mapped)
        })
        .or_else(|| {
            find(&|name| {
                CURVE_KEYWORDS
                    .iter()
                    .any(|(curve_kw, setting_kw)| name.contains(curve_kw) && setting.contains(setting_kw))
            })
        })
        .or_else(|| find(&|name| name.contains("Standard")))
        .or_else(|| curves.first().map(|(_, id)| *id))
}

/// Target curve name for a repository code; numeric codes are zero padded
/// to the setting's width before comparison.
fn mapped_curve<'a>(setting: &str, curve_mapping: &'a [CurveMapEntry]) -> Option<&'a str> {
    curve_mapping
        .iter()
        .find(|entry| {
            let code = entry.code.as_str();
            if code.parse::<i64>().is_ok() && code.len() < setting.len() {
                format!("{code:0>width$}", width = setting.len()) == setting
            } else {
                code == setting
            }
        })
        .map(|entry| entry.curve.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_positions_read_from_the_right() {
        let value = SettingValue::text("5");
        assert_eq!(convert_binary(&value, "1").as_deref(), Some("1"));
        assert_eq!(convert_binary(&value, "2").as_deref(), Some("0"));
        assert_eq!(convert_binary(&value, "31").as_deref(), Some("11"));
        assert_eq!(convert_binary(&value, "0").as_deref(), Some("0"));
        assert_eq!(convert_binary(&SettingValue::text("abc"), "1"), None);
    }

    #[test]
    fn bit_index_conditions() {
        let value = SettingValue::text("0100");
        assert_eq!(determine_on_off(Some(&value), "1"), ENABLED);
        assert_eq!(determine_on_off(Some(&value), "0"), DISABLED);
        assert_eq!(determine_on_off(Some(&value), "9"), DISABLED);
        assert_eq!(determine_on_off(Some(&SettingValue::text("0102")), "1"), DISABLED);
    }

    #[test]
    fn exponent_values_expand_to_width() {
        assert_eq!(bit_at("1e3", 0), Some('1'));
        assert_eq!(bit_at("1e3", 3), Some('0'));
        assert_eq!(bit_at("1.1", 1), Some('1'));
    }

    #[test]
    fn empty_values_depend_on_sentinel() {
        let empty = SettingValue::text("");
        assert_eq!(determine_on_off(Some(&empty), "ON"), ENABLED);
        assert_eq!(determine_on_off(Some(&empty), "OFF"), DISABLED);
        assert_eq!(determine_on_off(None, "[off]"), DISABLED);
        assert_eq!(determine_on_off(None, "2"), DISABLED);
    }

    #[test]
    fn disable_lists() {
        assert_eq!(disable_list("[off, Disabled]"), ["off", "disabled"]);
        assert_eq!(disable_list("Blocked"), ["blocked"]);
    }

    #[test]
    fn numeric_curve_codes_are_zero_padded() {
        let mapping = vec![CurveMapEntry {
            description: String::new(),
            code: "1".to_string(),
            curve: "IEC Standard Inverse".to_string(),
        }];
        assert_eq!(mapped_curve("001", &mapping), Some("IEC Standard Inverse"));
        assert_eq!(mapped_curve("1", &mapping), Some("IEC Standard Inverse"));
        assert_eq!(mapped_curve("002", &mapping), None);
    }
}
