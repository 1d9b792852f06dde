//! Dip-switch logic element construction.

use relay_model::{AttrValue, MappingRule, ObjectId, SettingValue};
use tracing::warn;

use crate::engine::{SettingDictionary, find_element};
use crate::error::Result;
use crate::model::{TYPE_ATTR, TargetDeviceModel};

pub const DIP_CLASS: &str = "RelLogdip";
const DIP_MARKER: &str = "_dip";
/// Legacy multi-flag token that switches a dip on.
const LEGACY_ON_TOKEN: &str = "32";

/// Dip-switch string written to one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DipUpdate {
    pub element: ObjectId,
    pub name: String,
    pub switches: String,
}

/// Rebuild every dip-switch element named in the rules.
///
/// Elements whose existing switch string does not have one position per
/// rule row are left untouched.
pub fn update_logic_elements(
    model: &mut dyn TargetDeviceModel,
    target: ObjectId,
    rules: &[MappingRule],
    dictionary: &SettingDictionary,
) -> Result<Vec<DipUpdate>> {
    let mut names: Vec<&str> = Vec::new();
    for rule in rules.iter().filter(|rule| rule.element().contains(DIP_MARKER)) {
        if !names.contains(&rule.element()) {
            names.push(rule.element());
        }
    }

    let mut updates = Vec::new();
    for name in names {
        let element_rules: Vec<&MappingRule> = rules
            .iter()
            .filter(|rule| rule.element().contains(name))
            .collect();
        let Some(element) = locate(model, target, &element_rules)? else {
            warn!(element = %name, "dip-switch element could not be found");
            continue;
        };

        let existing = model.get_attribute(element, "aDipset")?;
        let existing = existing.as_str().unwrap_or_default();
        if existing.chars().count() != element_rules.len() {
            warn!(
                element = %name,
                switches = existing.chars().count(),
                rows = element_rules.len(),
                "dip-switch width does not match rule rows"
            );
            continue;
        }

        let dip_names = input_names(model, element)?;
        let mut switches = vec!['0'; element_rules.len()];
        for rule in &element_rules {
            let Some(index) = dip_names.iter().position(|dip| dip == rule.attribute()) else {
                continue;
            };
            if let Some(slot) = switches.get_mut(index) {
                *slot = switch_state(dictionary.get(&rule.key()), rule.last());
            }
        }
        let switches: String = switches.into_iter().collect();
        model.set_attribute(element, "aDipset", AttrValue::text(switches.as_str()))?;
        updates.push(DipUpdate {
            element,
            name: name.to_string(),
            switches,
        });
    }
    Ok(updates)
}

/// First rule whose element lookup resolves to a dip-switch element.
fn locate(
    model: &dyn TargetDeviceModel,
    target: ObjectId,
    rules: &[&MappingRule],
) -> Result<Option<ObjectId>> {
    for rule in rules {
        let lookup = rule.with_element(rule.element().replace(DIP_MARKER, ""));
        if let Some(candidate) = find_element(model, target, &lookup)?
            && model.class_name(candidate)? == DIP_CLASS
        {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Ordered dip-switch names from the element type's first input definition.
fn input_names(model: &dyn TargetDeviceModel, element: ObjectId) -> Result<Vec<String>> {
    let Some(element_type) = model.reference(element, TYPE_ATTR)? else {
        return Ok(Vec::new());
    };
    let inputs = model.get_attribute(element_type, "sInput")?;
    let first = match &inputs {
        AttrValue::List(items) => items.first().and_then(AttrValue::as_str),
        other => other.as_str(),
    };
    Ok(first
        .map(|names| names.split(',').map(str::to_string).collect())
        .unwrap_or_default())
}

/// `'1'` or `'0'` for one dip row's setting.
pub fn switch_state(setting: Option<&SettingValue>, token: &str) -> char {
    let Some(setting) = setting else {
        return '0';
    };
    match setting.as_i64() {
        Some(1) => return '1',
        Some(0) => return '0',
        _ => {}
    }
    let rendered = setting.to_string();
    if rendered.contains(token) || rendered.contains(LEGACY_ON_TOKEN) {
        '1'
    } else {
        '0'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_states() {
        assert_eq!(switch_state(None, "Trip"), '0');
        assert_eq!(switch_state(Some(&SettingValue::text("1")), "Trip"), '1');
        assert_eq!(switch_state(Some(&SettingValue::text("0")), "Trip"), '0');
        assert_eq!(switch_state(Some(&SettingValue::text("Trip+Alarm")), "Trip"), '1');
        assert_eq!(switch_state(Some(&SettingValue::text("Flags 32")), "Trip"), '1');
        assert_eq!(switch_state(Some(&SettingValue::text("Alarm")), "Trip"), '0');
    }
}
