//! Placing matched setting records onto target model devices.
//!
//! Energex devices are created or reused next to the switch they protect;
//! Ergon devices already exist and are claimed by plant number.

use relay_map::{DeviceMatcher, DeviceNamer, SwitchMatch, SwitchQuery, plant_number};
use relay_model::{FuseKind, ObjectId, ProtectionDeviceContext, SettingRecord};
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{ContentFilter, TargetDeviceModel};

pub const RELAY_CLASS: &str = "ElmRelay";
pub const FUSE_CLASS: &str = "RelFuse";
pub const SWITCH_CLASS: &str = "StaSwitch";
pub const COUPLER_CLASS: &str = "ElmCoup";
const CT_CLASS: &str = "StaCt";

/// Target class of a protection device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Relay,
    Fuse,
}

impl DeviceClass {
    /// Fuses are recognised by their pattern name.
    pub fn for_pattern(pattern: &str) -> Self {
        if pattern.to_lowercase().contains("fuse") {
            Self::Fuse
        } else {
            Self::Relay
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Self::Relay => RELAY_CLASS,
            Self::Fuse => FUSE_CLASS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub object: ObjectId,
    pub created: bool,
}

/// Reuse the cubicle's device with this exact name and class, or create it.
pub fn find_or_create(
    model: &mut dyn TargetDeviceModel,
    cubicle: ObjectId,
    name: &str,
    class: DeviceClass,
) -> Result<Placement> {
    if let Some(object) = model.find_child(cubicle, name, class.class_name())? {
        return Ok(Placement {
            object,
            created: false,
        });
    }
    let object = model.create_object(cubicle, class.class_name(), name)?;
    debug!(device = name, class = class.class_name(), "created protection device");
    Ok(Placement {
        object,
        created: true,
    })
}

/// Cubicle that holds the protection for a switch.
///
/// Station switches live inside their cubicle; couplers reference their
/// first connected cubicle through `bus1`.
pub fn switch_cubicle(model: &dyn TargetDeviceModel, switch: ObjectId) -> Result<Option<ObjectId>> {
    match model.class_name(switch)?.as_str() {
        SWITCH_CLASS => Ok(model.parent(switch)?),
        COUPLER_CLASS => Ok(model.reference(switch, "bus1")?),
        _ => Ok(None),
    }
}

/// Matching query for a switch object.
pub fn switch_query(model: &dyn TargetDeviceModel, switch: ObjectId) -> Result<SwitchQuery> {
    let name = model.name(switch)?;
    let folder = match model.parent(switch)? {
        Some(parent) => model.name(parent)?,
        None => String::new(),
    };
    Ok(if model.class_name(switch)? == COUPLER_CLASS {
        SwitchQuery::coupler(name, folder)
    } else {
        SwitchQuery::station_switch(name, folder)
    })
}

/// Create or reuse one device per matched record beside the switch.
pub fn place_switch_devices(
    model: &mut dyn TargetDeviceModel,
    switch: ObjectId,
    matched: &SwitchMatch<'_>,
    namer: &mut DeviceNamer,
) -> Result<Vec<ProtectionDeviceContext>> {
    let Some(cubicle) = switch_cubicle(model, switch)? else {
        return Ok(Vec::new());
    };
    let query = switch_query(model, switch)?;
    let closed = model.get_attribute(switch, "on_off")?.as_i64().map(|state| state != 0);

    let mut devices = Vec::new();
    for candidate in &matched.candidates {
        let record = candidate.record;
        let switch_name = record.switch_name.as_deref().unwrap_or(&matched.switch_name);
        let name = namer.next_name(switch_name, record.device_id.as_deref(), &record.asset_name);
        let placement = find_or_create(model, cubicle, &name, DeviceClass::for_pattern(&record.pattern_name))?;

        let mut device = ProtectionDeviceContext::from_record(record, name).with_target(placement.object);
        device.substation = query.substation_code().map(str::to_string);
        device.switch_closed = closed;
        devices.push(device);
    }
    Ok(devices)
}

/// Remove protection devices and CTs from a switch with no matching settings.
pub fn clear_unmatched(model: &mut dyn TargetDeviceModel, switch: ObjectId) -> Result<usize> {
    let Some(cubicle) = switch_cubicle(model, switch)? else {
        return Ok(0);
    };
    let mut removed = 0;
    for class in [RELAY_CLASS, FUSE_CLASS, CT_CLASS] {
        for object in model.get_contents(cubicle, &ContentFilter::class(class), false)? {
            model.delete(object)?;
            removed += 1;
        }
    }
    if removed > 0 {
        info!(switch = %model.name(switch)?, removed, "cleared unmatched switch cubicle");
    }
    Ok(removed)
}

/// Device in the cubicle to carry an Ergon record.
///
/// A device already named after the asset is reused; otherwise the original
/// device is renamed to the asset, and only if neither exists is a new one
/// created.
pub fn claim_ergon_device(
    model: &mut dyn TargetDeviceModel,
    cubicle: ObjectId,
    original_name: &str,
    asset_name: &str,
    class: DeviceClass,
) -> Result<Placement> {
    for object in model.get_contents(cubicle, &ContentFilter::class(class.class_name()), false)? {
        let name = model.name(object)?;
        if name == asset_name {
            return Ok(Placement {
                object,
                created: false,
            });
        }
        if name == original_name {
            model.rename(object, asset_name)?;
            return Ok(Placement {
                object,
                created: false,
            });
        }
    }
    let object = model.create_object(cubicle, class.class_name(), asset_name)?;
    Ok(Placement {
        object,
        created: true,
    })
}

/// Resolve an existing Ergon device to one context per matching record.
///
/// Devices without a plant number are not protection devices and yield
/// nothing. A device with no matching record yields a context without a
/// setting id.
pub fn place_ergon_device(
    model: &mut dyn TargetDeviceModel,
    device: ObjectId,
    matcher: &DeviceMatcher<'_>,
) -> Result<Vec<ProtectionDeviceContext>> {
    let name = model.name(device)?;
    let Some(plant) = plant_number(&name) else {
        debug!(device = %name, "not a protection device");
        return Ok(Vec::new());
    };
    let class = match model.class_name(device)?.as_str() {
        FUSE_CLASS => DeviceClass::Fuse,
        _ => DeviceClass::Relay,
    };

    let records = matcher.match_by_containment(plant);
    if records.is_empty() {
        let mut unmatched = ProtectionDeviceContext::new(String::new(), name.clone()).with_target(device);
        unmatched.plant_number = Some(plant.to_string());
        return Ok(vec![unmatched]);
    }

    let cubicle = model.parent(device)?;
    let mut contexts = Vec::new();
    for record in records {
        let target = match cubicle {
            Some(cubicle) if record.asset_name != plant => {
                claim_ergon_device(model, cubicle, &name, &record.asset_name, class)?.object
            }
            _ => device,
        };
        contexts.push(ergon_context(record, &name, plant, target, class));
    }
    Ok(contexts)
}

fn ergon_context(
    record: &SettingRecord,
    name: &str,
    plant: &str,
    target: ObjectId,
    class: DeviceClass,
) -> ProtectionDeviceContext {
    let display = if record.asset_name.is_empty() { name } else { record.asset_name.as_str() };
    let mut device = ProtectionDeviceContext::from_record(record, display).with_target(target);
    device.plant_number = Some(plant.to_string());
    if class == DeviceClass::Fuse && device.fuse.is_none() {
        device.fuse = Some(FuseKind::Line);
    }
    device
}
