//! Fuse typing from repository curve and rating settings.

use relay_model::{
    AttrValue, DeviceOutcome, FuseKind, ObjectId, ProtectionDeviceContext, SettingRow, UpdateStatus,
};
use tracing::debug;

use crate::error::Result;
use crate::model::{TYPE_ATTR, TargetDeviceModel};
use crate::types::TypeIndex;

const DUAL_RATED: &str = "Dual Rated";

/// Curve letter and rating fragment read from a line fuse's setting rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuseParameters {
    pub curve: String,
    /// Fragment searched for in fuse type names, e.g. ` 100A` or ` 25/`.
    pub rating: String,
}

impl FuseParameters {
    pub fn from_settings(settings: &[SettingRow]) -> Self {
        let mut params = Self::default();
        for row in settings {
            let value = row.proposed_value.as_str();
            if row.param_name.to_lowercase() == "curve" {
                params.curve = if value.contains(DUAL_RATED) {
                    "K".to_string()
                } else {
                    value.to_string()
                };
            } else if row.param_name == "MAX" && value.contains(DUAL_RATED) {
                params.rating = format!(" {value}/");
            } else if row.param_name == "MAX" || row.param_name == "In" {
                let whole: String = value.chars().take_while(|c| *c != '.' && *c != ',').collect();
                params.rating = format!(" {whole}A");
            }
        }
        params
    }

    fn is_complete(&self) -> bool {
        !self.curve.is_empty() && !self.rating.is_empty()
    }
}

/// Library fuse type for a device: curve and rating first, then fuse size.
pub fn select_fuse_type(
    device: &ProtectionDeviceContext,
    params: &FuseParameters,
    types: &TypeIndex,
) -> Option<ObjectId> {
    params
        .is_complete()
        .then(|| types.fuse_by_curve_and_rating(&params.curve, &params.rating))
        .flatten()
        .or_else(|| device.fuse_size.as_deref().and_then(|size| types.fuse_by_size(size)))
}

/// Type a fuse and place it in service.
pub fn update_fuse(
    model: &mut dyn TargetDeviceModel,
    device: &ProtectionDeviceContext,
    target: ObjectId,
    types: &TypeIndex,
) -> Result<DeviceOutcome> {
    let outcome = DeviceOutcome::from_device(device);
    let line_fuse = device.fuse == Some(FuseKind::Line);
    if line_fuse && device.setting_id.is_none() {
        return Ok(outcome.with_status(UpdateStatus::NotInRepository));
    }

    let params = if line_fuse {
        FuseParameters::from_settings(&device.settings)
    } else {
        FuseParameters::default()
    };
    let Some(fuse_type) = select_fuse_type(device, &params, types) else {
        debug!(device = %device.name, curve = %params.curve, rating = %params.rating, "no fuse type matched");
        return Ok(outcome.with_status(UpdateStatus::TypeMatchingError));
    };

    let date = device.date.clone().unwrap_or_default();
    model.set_attribute(target, "chr_name", AttrValue::text(date))?;
    let mut outcome = outcome;
    outcome.date_setting = device.date.clone();

    let wanted = model.name(fuse_type)?;
    if model.reference_name(target, TYPE_ATTR)?.as_deref() == Some(wanted.as_str()) {
        outcome.status = UpdateStatus::TypeCorrect;
    } else {
        model.set_attribute(target, TYPE_ATTR, AttrValue::Ref(fuse_type))?;
    }
    model.set_attribute(target, "outserv", AttrValue::Int(0))?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dual_rated_fuses_read_as_k_curve() {
        let params = FuseParameters::from_settings(&[
            SettingRow::new("Fuse", "Curve", "Dual Rated 25/40", ""),
            SettingRow::new("Fuse", "MAX", "Dual Rated 25", ""),
        ]);
        assert_eq!(params.curve, "K");
        assert_eq!(params.rating, " Dual Rated 25/");
    }

    #[test]
    fn rating_keeps_integer_part() {
        let params = FuseParameters::from_settings(&[
            SettingRow::new("Fuse", "curve", "T", ""),
            SettingRow::new("Fuse", "In", "63,0", ""),
        ]);
        assert_eq!(params, FuseParameters { curve: "T".into(), rating: " 63A".into() });
    }
}
