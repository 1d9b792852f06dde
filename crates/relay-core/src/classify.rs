//! Device function, phase and relay type checks run before settings are applied.

use relay_config::PatternLists;
use relay_model::{AttrValue, ObjectId, ProtectionDeviceContext};
use tracing::warn;

use crate::error::Result;
use crate::model::{ContentFilter, TYPE_ATTR, TargetDeviceModel};
use crate::types::TypeIndex;

/// Pilot-wire pattern that is a protection relay even without setting rows.
const PILOT_WIRE_PATTERN: &str = "SOLKOR-RF_Energex";
const MEASUREMENT_CLASS: &str = "RelMeasure";
const EARTH_SUFFIX: &str = "_Earth";

/// Name suffix tokens, tried in order against the last six characters.
const PHASE_TOKENS: &[(&str, i64)] = &[
    ("_A", 0),
    ("A-A", 0),
    ("-A", 0),
    ("-R", 0),
    ("_B", 1),
    ("B-B", 1),
    ("-B", 1),
    ("-W", 1),
    ("C-C", 2),
    ("-C", 2),
    ("_C", 2),
];

const EARTH_FAULT_TOKENS: &[&str] = &["N-E", "N", "EF-E", "E-E", "DEF", "-EF"];

/// Prefix the pattern with the device's function.
///
/// `swer_` for devices on a cubicle with fewer than three phases, `switch_`
/// for devices without protection settings or with detection switched on,
/// `sect_` for sectionalisers.
pub fn update_device_function(
    model: &dyn TargetDeviceModel,
    device: &mut ProtectionDeviceContext,
    target: ObjectId,
) -> Result<()> {
    let phases = match model.parent(target)? {
        Some(cubicle) => model.get_attribute(cubicle, "nphase")?.as_i64().unwrap_or(3),
        None => 3,
    };
    if phases < 3 {
        device.pattern = format!("swer_{}", device.pattern);
    }

    if device.settings.is_empty() && device.pattern != PILOT_WIRE_PATTERN {
        device.pattern = format!("switch_{}", device.pattern);
        return Ok(());
    }
    let mut prefix = None;
    for row in &device.settings {
        let value = row.proposed_value.to_lowercase();
        match row.param_name.as_str() {
            "Sectionaliser" => {
                if value == "on" || value == "auto" {
                    prefix = Some("sect_");
                }
                break;
            }
            "Detection" if value == "on" => prefix = Some("switch_"),
            _ => {}
        }
    }
    if let Some(prefix) = prefix {
        device.pattern = format!("{prefix}{}", device.pattern);
    }
    Ok(())
}

/// Measured phase for a single-phase relay, or `None` when the relay is
/// multi-phase or an earth-fault relay.
///
/// Earth-fault relays have `_Earth` appended to their pattern.
pub fn determine_phase(device: &mut ProtectionDeviceContext, patterns: &PatternLists) -> Option<i64> {
    if patterns.is_multi_phase(&device.pattern) || !patterns.is_single_phase(&device.pattern) {
        return None;
    }
    let name = if device.asset_name.is_empty() { &device.name } else { &device.asset_name };
    let tail = tail(name, 6);

    if let Some((_, phase)) = PHASE_TOKENS.iter().find(|(token, _)| tail.contains(token)) {
        return Some(*phase);
    }
    if EARTH_FAULT_TOKENS.iter().any(|token| tail.contains(token)) || name.ends_with('E') {
        device.pattern.push_str(EARTH_SUFFIX);
        return None;
    }
    Some(0)
}

/// Set the measured phase on the relay's first measurement element.
pub fn apply_phase(model: &mut dyn TargetDeviceModel, target: ObjectId, phase: i64) -> Result<bool> {
    let measurements = model.get_contents(target, &ContentFilter::class(MEASUREMENT_CLASS), false)?;
    let Some(measurement) = measurements.first() else {
        return Ok(false);
    };
    model.set_attribute(*measurement, "iphase", AttrValue::Int(phase))?;
    Ok(true)
}

/// Outcome of checking a relay's type against its rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCheck {
    Correct,
    Assigned,
    NotFound,
}

/// Make sure the relay carries the rule table's target type.
///
/// The relay is placed in service unless the type cannot be found.
pub fn check_relay_type(
    model: &mut dyn TargetDeviceModel,
    target: ObjectId,
    target_type: &str,
    types: &TypeIndex,
) -> Result<TypeCheck> {
    let check = if model.reference_name(target, TYPE_ATTR)?.as_deref() == Some(target_type) {
        TypeCheck::Correct
    } else {
        match types.relay(target_type).filter(|_| !target_type.is_empty()) {
            Some(relay_type) => {
                model.set_attribute(target, TYPE_ATTR, AttrValue::Ref(relay_type))?;
                TypeCheck::Assigned
            }
            None => {
                warn!(relay_type = target_type, "relay type not found");
                TypeCheck::NotFound
            }
        }
    };
    let outserv = i64::from(check == TypeCheck::NotFound);
    model.set_attribute(target, "outserv", AttrValue::Int(outserv))?;
    Ok(check)
}

fn tail(name: &str, chars: usize) -> &str {
    let skip = name.chars().count().saturating_sub(chars);
    name.char_indices().nth(skip).map_or("", |(index, _)| &name[index..])
}
