//! Setting dictionary construction and rule application.
//!
//! Setting rows narrow the prepared rule table one address column at a time
//! until a rule captures the value through a `use_setting` cell. Captured
//! values are keyed by the rule's folder, element and attribute columns and
//! later written to the matching element of the target device.

use std::collections::BTreeMap;

use relay_model::{
    AttrValue, CurveMapEntry, MappingRule, ObjectId, ProtectionDeviceContext, SettingRow,
    SettingValue, USE_SETTING, normalize_unit,
};
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::{ContentFilter, TargetDeviceModel};
use crate::resolve::{coerce_direct, convert_binary, determine_on_off, differs, resolve_curve, setting_adjustment};

/// Resolved settings keyed by [`MappingRule::key`].
pub type SettingDictionary = BTreeMap<String, SettingValue>;

const ON_OFF_SENTINELS: &[&str] = &["None", "ON", "On", "OFF", "Off"];

/// Element name markers handled by dedicated builders.
const BUILDER_MARKERS: &[&str] = &["_logic", "_dip", "_Trips"];

/// Build the setting dictionary for one device.
///
/// Rows that narrow the table to nothing contribute no entries. Later rows
/// overwrite earlier captures of the same key.
pub fn build_setting_dictionary(settings: &[SettingRow], rules: &[MappingRule]) -> SettingDictionary {
    let mut dictionary = SettingDictionary::new();
    let participating: Vec<&MappingRule> = rules.iter().filter(|rule| takes_part(rule)).collect();

    for row in settings {
        let mut candidates = participating.clone();
        let mut captured = false;
        for position in 0..SettingRow::ADDRESS_WIDTH {
            let Some(value) = row.address(position) else {
                break;
            };
            let mut narrowed = Vec::new();
            for rule in candidates {
                match rule.address(position) {
                    Some(USE_SETTING) => {
                        dictionary.insert(rule.key(), normalize_unit(value, &row.unit));
                        captured = true;
                    }
                    Some(cell) if address_matches(cell, value) => narrowed.push(rule),
                    _ => {}
                }
            }
            if narrowed.is_empty() {
                break;
            }
            candidates = narrowed;
        }
        if !captured {
            debug!(
                block = %row.block_path,
                param = %row.param_name,
                "setting row not mapped"
            );
        }
    }
    dictionary
}

/// On/off sentinel rows only address settings when they carry a fifth column.
fn takes_part(rule: &MappingRule) -> bool {
    let sentinel = rule.address(0).is_some_and(|cell| ON_OFF_SENTINELS.contains(&cell));
    !(sentinel && rule.len() < 5)
}

/// Repository addresses sometimes drop a leading zero.
fn address_matches(cell: &str, value: &str) -> bool {
    cell == value || (value.len() == cell.len() + 1 && value.starts_with('0') && &value[1..] == cell)
}

/// Element a rule addresses: a descendant named like the rule's element
/// whose parent folder is named like the rule's folder.
pub fn find_element(
    model: &dyn TargetDeviceModel,
    device: ObjectId,
    rule: &MappingRule,
) -> Result<Option<ObjectId>> {
    let candidates = model.get_contents(device, &ContentFilter::named(rule.element()), true)?;
    for candidate in candidates {
        let Some(parent) = model.parent(candidate)? else {
            continue;
        };
        if model.name(parent)? == rule.folder() {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Shared inputs for writing one device's settings.
#[derive(Debug, Clone, Copy)]
pub struct ApplyContext<'a> {
    pub device: &'a ProtectionDeviceContext,
    pub target: ObjectId,
    pub rules: &'a [MappingRule],
    pub dictionary: &'a SettingDictionary,
    pub curve_mapping: &'a [CurveMapEntry],
}

/// Write every ordinary rule's value to the device. Returns whether any
/// attribute changed.
pub fn apply_settings(model: &mut dyn TargetDeviceModel, ctx: &ApplyContext<'_>) -> Result<bool> {
    let mut updated = false;
    for rule in ctx.rules {
        if BUILDER_MARKERS.iter().any(|marker| rule.element().contains(marker)) {
            continue;
        }
        let Some(element) = find_element(model, ctx.target, rule)? else {
            warn!(rule = %rule.key(), "no element found for rule");
            continue;
        };
        let setting = ctx.dictionary.get(&rule.key());
        if setting.is_none() && rule.attribute() != "outserv" {
            continue;
        }
        updated |= set_attribute(model, ctx, rule, element, setting)?;
    }
    Ok(updated)
}

fn set_attribute(
    model: &mut dyn TargetDeviceModel,
    ctx: &ApplyContext<'_>,
    rule: &MappingRule,
    element: ObjectId,
    setting: Option<&SettingValue>,
) -> Result<bool> {
    let attribute = rule.attribute();
    match attribute {
        "pcharac" => {
            let Some(setting) = setting else {
                return Ok(false);
            };
            let name = if rule.last() == "binary" {
                convert_binary(setting, rule.second_last()).unwrap_or_else(|| setting.to_string())
            } else {
                setting.to_string()
            };
            let Some(curve) = resolve_curve(model, element, &name, ctx.curve_mapping)? else {
                warn!(rule = %rule.key(), setting = %name, "element type offers no curves");
                return Ok(false);
            };
            if model.reference(element, attribute)? != Some(curve) {
                model.set_attribute(element, attribute, AttrValue::Ref(curve))?;
            }
            Ok(true)
        }
        "outserv" => {
            let state = if rule.last() == "binary" {
                let bit = setting.and_then(|s| convert_binary(s, rule.second_last()));
                if bit.as_deref() == Some("1") {
                    determine_on_off(Some(&SettingValue::text("OFF")), "OFF")
                } else {
                    determine_on_off(Some(&SettingValue::text("ON")), "NF")
                }
            } else {
                determine_on_off(setting, rule.last())
            };
            model.set_attribute(element, attribute, AttrValue::Int(state))?;
            Ok(false)
        }
        _ => {
            let existing = model.get_attribute(element, attribute)?;
            let candidate = if rule.adjustment() == Some("None") {
                match setting {
                    Some(value) => coerce_direct(value, &existing),
                    None => return Ok(false),
                }
            } else {
                setting_adjustment(rule, ctx.dictionary, ctx.device.ct)?
            };
            if differs(&candidate, &existing) {
                model.set_attribute(element, attribute, candidate)?;
                return Ok(true);
            }
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_zero_addresses_match() {
        assert!(address_matches("120", "0120"));
        assert!(address_matches("0120", "0120"));
        assert!(!address_matches("120", "00120"));
        assert!(!address_matches("121", "0120"));
    }

    #[test]
    fn short_sentinel_rows_sit_out() {
        assert!(!takes_part(&MappingRule::new(["F", "E", "outserv", "OFF"])));
        assert!(takes_part(&MappingRule::new(["F", "E", "outserv", "OFF", "G1"])));
        assert!(takes_part(&MappingRule::new(["F", "E", "Ipset", "G1"])));
    }
}
