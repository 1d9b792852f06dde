//! Per-device outcome records produced by a settings run.

use serde::{Deserialize, Serialize};

use crate::device::ProtectionDeviceContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateStatus {
    Updated,
    NotInRepository,
    NotMapped,
    ScriptFailed,
    TypeNotFound,
    TypeMatchingError,
    TypeCorrect,
}

impl UpdateStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Updated => "Updated",
            Self::NotInRepository => "Not in IPS",
            Self::NotMapped => "Not mapped",
            Self::ScriptFailed => "Script Failed",
            Self::TypeNotFound => "Unable to find the appropriate type",
            Self::TypeMatchingError => "Type Matching Error",
            Self::TypeCorrect => "Type Correct",
        }
    }

    /// Whether the device ends the run forced out of service.
    pub fn forces_out_of_service(self) -> bool {
        matches!(self, Self::NotMapped | Self::ScriptFailed | Self::TypeNotFound)
    }
}

/// What happened to a device's current or voltage transformer link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformerLink {
    /// Primary rating of 1: the slot was cleared.
    NotLinked,
    /// The device type has no slot for this transformer class.
    NoSlot,
    /// An instance was linked and updated.
    Linked { name: String },
    /// Recloser with an internal transformer.
    Internal { name: String },
}

impl TransformerLink {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Linked { name } | Self::Internal { name } => Some(name),
            Self::NotLinked | Self::NoSlot => None,
        }
    }
}

/// Result record for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceOutcome {
    pub device: String,
    pub substation: Option<String>,
    pub plant_number: Option<String>,
    pub relay_pattern: String,
    pub used_pattern: String,
    pub date_setting: Option<String>,
    pub status: UpdateStatus,
    pub ct: Option<TransformerLink>,
    pub vt: Option<TransformerLink>,
    pub cb_name: Option<String>,
    pub error_detail: Option<String>,
}

impl DeviceOutcome {
    pub fn from_device(device: &ProtectionDeviceContext) -> Self {
        Self {
            device: device.name.clone(),
            substation: device.substation.clone(),
            plant_number: device.plant_number.clone(),
            relay_pattern: device.pattern.clone(),
            used_pattern: device.pattern.clone(),
            date_setting: None,
            status: UpdateStatus::Updated,
            ct: None,
            vt: None,
            cb_name: None,
            error_detail: None,
        }
    }

    pub fn not_in_repository(device: &ProtectionDeviceContext) -> Self {
        Self {
            status: UpdateStatus::NotInRepository,
            ..Self::from_device(device)
        }
    }

    pub fn script_failed(device: &ProtectionDeviceContext, error: &str) -> Self {
        Self {
            status: UpdateStatus::ScriptFailed,
            error_detail: Some(error.to_string()),
            ..Self::from_device(device)
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: UpdateStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_outcome_serializes() {
        let mut device = ProtectionDeviceContext::new("CAPM4", "RC-12_A1");
        device.substation = Some("GYM".to_string());
        let outcome = DeviceOutcome::script_failed(&device, "element lookup failed");

        insta::assert_json_snapshot!(outcome, @r#"
        {
          "device": "RC-12_A1",
          "substation": "GYM",
          "plant_number": null,
          "relay_pattern": "CAPM4",
          "used_pattern": "CAPM4",
          "date_setting": null,
          "status": "ScriptFailed",
          "ct": null,
          "vt": null,
          "cb_name": null,
          "error_detail": "element lookup failed"
        }
        "#);
        assert!(outcome.status.forces_out_of_service());
    }

    #[test]
    fn linked_transformer_reads_back() {
        let json = r#"{"Linked":{"name":"RC-12_A1_CT"}}"#;
        let link: TransformerLink = serde_json::from_str(json).expect("parse link");

        assert_eq!(link.name(), Some("RC-12_A1_CT"));
        assert_eq!(serde_json::to_string(&link).expect("serialize link"), json);
        assert_eq!(TransformerLink::NoSlot.name(), None);
    }
}
