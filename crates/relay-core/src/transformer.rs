//! Current and voltage transformer resolution.
//!
//! A relay type declares slots (`pblk`) and the relay holds the objects
//! assigned to them (`pdiselm`). Resolving a transformer finds or creates a
//! type with the right taps in the project library, then finds, renames or
//! creates the instance in the relay's cubicle and assigns it to its slot.

use relay_model::{AttrValue, ObjectId, ProtectionDeviceContext, TransformerLink, TransformerRatio};
use tracing::debug;

use crate::error::Result;
use crate::model::{ContentFilter, TYPE_ATTR, TargetDeviceModel};

const RECLOSER_TYPE_FOLDER: &str = "Reclosers";
const REMOTE_CT_SLOTS: &[&str] = &["Ct-3P(remote)", "Winding 2 Ct"];
const MEASUREMENT_CLASS: &str = "RelMeasure";
const FOLDER_CLASS: &str = "IntFolder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformerKind {
    Current,
    Voltage,
}

impl TransformerKind {
    pub fn instance_class(self) -> &'static str {
        match self {
            Self::Current => "StaCt",
            Self::Voltage => "StaVt",
        }
    }

    pub fn type_class(self) -> &'static str {
        match self {
            Self::Current => "TypCt",
            Self::Voltage => "TypVt",
        }
    }

    pub fn library_folder(self) -> &'static str {
        match self {
            Self::Current => "Current Transformers",
            Self::Voltage => "Voltage Transformers",
        }
    }

    fn slot_filters(self) -> &'static [&'static str] {
        match self {
            Self::Current => &["StaCt*", "StaCt*,StaCombi"],
            Self::Voltage => &["StaVt*"],
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Current => "_CT",
            Self::Voltage => "_VT",
        }
    }

    fn nominal_attribute(self) -> &'static str {
        match self {
            Self::Current => "Inom",
            Self::Voltage => "Unom",
        }
    }
}

/// Link the device's current transformer.
pub fn update_ct(
    model: &mut dyn TargetDeviceModel,
    device: &ProtectionDeviceContext,
    target: ObjectId,
) -> Result<TransformerLink> {
    let kind = TransformerKind::Current;
    if is_recloser(model, target)? {
        let library = library_folder(model, kind)?;
        let Some(instance) = update_slots(model, device, target, kind)? else {
            return Ok(TransformerLink::NoSlot);
        };
        if model.reference(instance, TYPE_ATTR)?.is_none() {
            let internal = select_type(model, library, kind, TransformerRatio::default())?;
            model.set_attribute(instance, TYPE_ATTR, AttrValue::Ref(internal))?;
        }
        if device.pattern.contains("swer_") {
            model.set_attribute(instance, "iphase", AttrValue::Int(1))?;
        }
        return Ok(TransformerLink::Internal {
            name: format!("{}{}", model.name(target)?, kind.suffix()),
        });
    }

    if !device.ct.is_linked() {
        clear_slot(model, target, kind)?;
        return Ok(TransformerLink::NotLinked);
    }
    let library = library_folder(model, kind)?;
    link(model, device, target, kind, library)
}

/// Link the device's voltage transformer.
pub fn update_vt(
    model: &mut dyn TargetDeviceModel,
    device: &ProtectionDeviceContext,
    target: ObjectId,
) -> Result<TransformerLink> {
    let kind = TransformerKind::Voltage;
    if !device.vt.is_linked() {
        clear_slot(model, target, kind)?;
        return Ok(TransformerLink::NotLinked);
    }
    let library = library_folder(model, kind)?;
    link(model, device, target, kind, library)
}

fn link(
    model: &mut dyn TargetDeviceModel,
    device: &ProtectionDeviceContext,
    target: ObjectId,
    kind: TransformerKind,
    library: ObjectId,
) -> Result<TransformerLink> {
    let ratio = ratio_of(device, kind);
    let Some(instance) = update_slots(model, device, target, kind)? else {
        debug!(device = %device.name, class = kind.instance_class(), "relay type has no slot");
        return Ok(TransformerLink::NoSlot);
    };
    let required = select_type(model, library, kind, ratio)?;
    if model.reference_name(instance, TYPE_ATTR)? != Some(model.name(required)?) {
        model.set_attribute(instance, TYPE_ATTR, AttrValue::Ref(required))?;
    }
    model.set_attribute(instance, "ptapset", AttrValue::Int(ratio.primary))?;
    model.set_attribute(instance, "stapset", AttrValue::Int(ratio.secondary))?;
    if op_id_of(device, kind).is_some()
        && let Some(date) = device.date.as_deref()
    {
        model.set_attribute(instance, "sernum", AttrValue::text(date))?;
    }

    for measurement in model.get_contents(target, &ContentFilter::class(MEASUREMENT_CLASS), false)? {
        model.set_attribute(measurement, kind.nominal_attribute(), AttrValue::Int(ratio.secondary))?;
    }

    Ok(TransformerLink::Linked {
        name: model.name(instance)?,
    })
}

fn ratio_of(device: &ProtectionDeviceContext, kind: TransformerKind) -> TransformerRatio {
    match kind {
        TransformerKind::Current => device.ct,
        TransformerKind::Voltage => device.vt,
    }
}

fn op_id_of(device: &ProtectionDeviceContext, kind: TransformerKind) -> Option<&str> {
    match kind {
        TransformerKind::Current => device.ct_op_id.as_deref(),
        TransformerKind::Voltage => device.vt_op_id.as_deref(),
    }
    .filter(|id| !id.is_empty())
}

fn is_recloser(model: &dyn TargetDeviceModel, target: ObjectId) -> Result<bool> {
    let Some(device_type) = model.reference(target, TYPE_ATTR)? else {
        return Ok(false);
    };
    let Some(folder) = model.parent(device_type)? else {
        return Ok(false);
    };
    Ok(model.name(folder)? == RECLOSER_TYPE_FOLDER)
}

/// Library folder for a transformer kind, created on first use.
pub fn library_folder(model: &mut dyn TargetDeviceModel, kind: TransformerKind) -> Result<ObjectId> {
    let library = model.local_library()?;
    let filter = ContentFilter::named(kind.library_folder()).with_class(FOLDER_CLASS);
    if let Some(folder) = model.get_contents(library, &filter, true)?.into_iter().next() {
        return Ok(folder);
    }
    Ok(model.create_object(library, FOLDER_CLASS, kind.library_folder())?)
}

/// Type whose tap lists already hold the ratio, or a new `{primary}/{secondary}` type.
pub fn select_type(
    model: &mut dyn TargetDeviceModel,
    folder: ObjectId,
    kind: TransformerKind,
    ratio: TransformerRatio,
) -> Result<ObjectId> {
    for candidate in model.get_contents(folder, &ContentFilter::class(kind.type_class()), false)? {
        let primary_ok = has_tap(&model.get_attribute(candidate, "primtaps")?, ratio.primary);
        let secondary_ok = kind == TransformerKind::Voltage
            || has_tap(&model.get_attribute(candidate, "sectaps")?, ratio.secondary);
        if primary_ok && secondary_ok {
            return Ok(candidate);
        }
    }

    let name = format!("{}/{}", ratio.primary, ratio.secondary);
    let created = model.create_object(folder, kind.type_class(), &name)?;
    model.set_attribute(created, "primtaps", AttrValue::List(vec![AttrValue::Int(ratio.primary)]))?;
    match kind {
        TransformerKind::Current => {
            model.set_attribute(created, "sectaps", AttrValue::List(vec![AttrValue::Int(ratio.secondary)]))?;
        }
        TransformerKind::Voltage => {
            model.set_attribute(created, "iopt_mod", AttrValue::Int(0))?;
        }
    }
    Ok(created)
}

fn has_tap(taps: &AttrValue, value: i64) -> bool {
    taps.numbers().contains(&(value as f64))
}

fn slot_blocks(model: &dyn TargetDeviceModel, target: ObjectId) -> Result<Vec<AttrValue>> {
    let Some(device_type) = model.reference(target, TYPE_ATTR)? else {
        return Ok(Vec::new());
    };
    Ok(model
        .get_attribute(device_type, "pblk")?
        .as_list()
        .map(<[AttrValue]>::to_vec)
        .unwrap_or_default())
}

fn slot_assignments(model: &dyn TargetDeviceModel, target: ObjectId, width: usize) -> Result<Vec<AttrValue>> {
    let mut slots = model
        .get_attribute(target, "pdiselm")?
        .as_list()
        .map(<[AttrValue]>::to_vec)
        .unwrap_or_default();
    if slots.len() < width {
        slots.resize(width, AttrValue::Null);
    }
    Ok(slots)
}

/// Empty the first slot reserved for this transformer kind.
fn clear_slot(model: &mut dyn TargetDeviceModel, target: ObjectId, kind: TransformerKind) -> Result<()> {
    let blocks = slot_blocks(model, target)?;
    let mut slots = slot_assignments(model, target, blocks.len())?;
    for (index, block) in blocks.iter().enumerate() {
        let Some(block) = block.as_ref() else {
            continue;
        };
        if model.get_attribute(block, "filtmod")?.as_str() == Some(kind.slot_filters()[0]) {
            slots[index] = AttrValue::Null;
            break;
        }
    }
    model.set_attribute(target, "pdiselm", AttrValue::List(slots))?;
    Ok(())
}

/// Assign the transformer instance to every matching slot of the relay.
///
/// The instance is the one already assigned under the wanted name, else a
/// cubicle instance with that name, else a cubicle instance with matching
/// taps (renamed after the relay), else a new one.
fn update_slots(
    model: &mut dyn TargetDeviceModel,
    device: &ProtectionDeviceContext,
    target: ObjectId,
    kind: TransformerKind,
) -> Result<Option<ObjectId>> {
    let Some(cubicle) = model.parent(target)? else {
        return Ok(None);
    };
    let relay_name = model.name(target)?;
    let op_id = op_id_of(device, kind);
    let wanted = op_id.map_or_else(|| format!("{relay_name}{}", kind.suffix()), str::to_string);
    let ratio = ratio_of(device, kind);

    let blocks = slot_blocks(model, target)?;
    let mut slots = slot_assignments(model, target, blocks.len())?;
    let mut instance = None;

    for (index, block) in blocks.iter().enumerate() {
        let Some(block) = block.as_ref() else {
            continue;
        };
        let filter = model.get_attribute(block, "filtmod")?;
        if !filter.as_str().is_some_and(|f| kind.slot_filters().contains(&f)) {
            continue;
        }
        if kind == TransformerKind::Current && REMOTE_CT_SLOTS.contains(&model.name(block)?.as_str()) {
            slots[index] = AttrValue::Null;
            continue;
        }

        if let Some(assigned) = slots[index].as_ref()
            && model.name(assigned)? == wanted
        {
            instance = Some(assigned);
            continue;
        }

        let mut chosen = None;
        for candidate in model.get_contents(cubicle, &ContentFilter::class(kind.instance_class()), false)? {
            if model.name(candidate)? == wanted {
                chosen = Some(candidate);
                break;
            }
            if op_id.is_none() && taps_match(model, candidate, ratio)? {
                let base = relay_name.split('_').next().unwrap_or(&relay_name);
                model.rename(candidate, &format!("{base}{}", kind.suffix()))?;
                chosen = Some(candidate);
                break;
            }
        }
        let chosen = match chosen {
            Some(found) => found,
            None => model.create_object(cubicle, kind.instance_class(), &wanted)?,
        };
        slots[index] = AttrValue::Ref(chosen);
        instance = Some(chosen);
    }

    model.set_attribute(target, "pdiselm", AttrValue::List(slots))?;
    Ok(instance)
}

fn taps_match(model: &dyn TargetDeviceModel, candidate: ObjectId, ratio: TransformerRatio) -> Result<bool> {
    let primary = model.get_attribute(candidate, "ptapset")?.as_f64();
    let secondary = model.get_attribute(candidate, "stapset")?.as_f64();
    Ok(primary == Some(ratio.primary as f64) && secondary == Some(ratio.secondary as f64))
}
