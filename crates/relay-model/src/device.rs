//! Working context for one physical protection device.

use serde::{Deserialize, Serialize};

use crate::record::SettingRecord;
use crate::region::Region;
use crate::setting::{InstrumentReading, SettingRow};
use crate::value::ObjectId;

const CT_PRIMARY_PARAMS: &[&str] = &["0120", "Iprim", "0A07"];
const CT_SECONDARY_PARAMS: &[&str] = &["0121", "In", "0A08"];

/// Primary and secondary ratings of an instrument transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerRatio {
    pub primary: i64,
    pub secondary: i64,
}

impl TransformerRatio {
    pub fn new(primary: i64, secondary: i64) -> Self {
        Self { primary, secondary }
    }

    /// Primary of 1 means no transformer is linked.
    pub fn is_linked(&self) -> bool {
        self.primary != 1
    }

    pub fn ratio(&self) -> f64 {
        if self.secondary == 0 {
            1.0
        } else {
            self.primary as f64 / self.secondary as f64
        }
    }
}

impl Default for TransformerRatio {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuseKind {
    /// Line fuse typed from repository curve and rating settings.
    Line,
    /// Transformer fuse typed from its nominal size.
    Transformer,
}

/// Everything known about one device while its settings are resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionDeviceContext {
    /// Device pattern; may be prefixed by device classification.
    pub pattern: String,
    /// Display name of the target object.
    pub name: String,
    /// Asset name of the matched record.
    pub asset_name: String,
    pub setting_id: Option<String>,
    pub date: Option<String>,
    pub device_id: Option<String>,
    pub ct: TransformerRatio,
    pub vt: TransformerRatio,
    pub ct_op_id: Option<String>,
    pub vt_op_id: Option<String>,
    pub fuse: Option<FuseKind>,
    pub fuse_size: Option<String>,
    pub settings: Vec<SettingRow>,
    pub substation: Option<String>,
    pub plant_number: Option<String>,
    /// Whether the associated switch is closed, when known.
    pub switch_closed: Option<bool>,
    pub target: Option<ObjectId>,
}

impl ProtectionDeviceContext {
    pub fn new(pattern: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            pattern: pattern.into(),
            asset_name: name.clone(),
            name,
            setting_id: None,
            date: None,
            device_id: None,
            ct: TransformerRatio::default(),
            vt: TransformerRatio::default(),
            ct_op_id: None,
            vt_op_id: None,
            fuse: None,
            fuse_size: None,
            settings: Vec::new(),
            substation: None,
            plant_number: None,
            switch_closed: None,
            target: None,
        }
    }

    /// Context for a device matched to a record.
    pub fn from_record(record: &SettingRecord, name: impl Into<String>) -> Self {
        let mut device = Self::new(record.pattern_name.clone(), name);
        device.asset_name = record.asset_name.clone();
        device.setting_id = Some(record.setting_id.clone());
        device.date = record.date_setting.clone();
        device.device_id = record.device_id.clone();
        if record.pattern_name.to_lowercase().contains("fuse") {
            device.fuse = Some(FuseKind::Line);
        }
        device
    }

    #[must_use]
    pub fn with_target(mut self, target: ObjectId) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, rows: Vec<SettingRow>) -> Self {
        self.associate_settings(rows);
        self
    }

    pub fn is_fuse(&self) -> bool {
        self.fuse.is_some()
    }

    /// Attach setting rows, picking up the CT ratio they carry.
    pub fn associate_settings(&mut self, rows: Vec<SettingRow>) {
        for row in &rows {
            let param = row.param_name.as_str();
            let Some(value) = parse_rating(&row.proposed_value) else {
                continue;
            };
            if CT_PRIMARY_PARAMS.contains(&param) {
                self.ct.primary = value;
            } else if CT_SECONDARY_PARAMS.contains(&param) {
                self.ct.secondary = value;
            }
        }
        self.settings = rows;
    }

    /// Apply instrument transformer readings for this device's setting id.
    ///
    /// Energex readings are named `Iprim`/`Isec`/`Vprim`/`Vsec` and only ever
    /// raise the CT primary; Ergon readings use `CT Primary` style names.
    pub fn apply_instrument_readings(&mut self, region: Region, readings: &[InstrumentReading]) {
        let Some(setting_id) = self.setting_id.as_deref() else {
            return;
        };
        for reading in readings.iter().filter(|r| r.setting_id == setting_id) {
            let Some(value) = parse_rating(&reading.value) else {
                continue;
            };
            let name = reading.name.as_str();
            match region {
                Region::Energex => {
                    if name.contains("Iprim") {
                        self.ct.primary = self.ct.primary.max(value);
                    } else if name.contains("Isec") {
                        self.ct.secondary = value;
                    } else if name.contains("Vprim") {
                        self.vt.primary = value;
                    } else if name.contains("Vsec") {
                        self.vt.secondary = value;
                    }
                }
                Region::Ergon => {
                    if name.contains("CT Primary") {
                        self.ct.primary = value;
                    } else if name.contains("CT Secondary") {
                        self.ct.secondary = value;
                    } else if name.contains("VT Primary") {
                        self.vt.primary = value;
                    } else if name.contains("VT Secondary") {
                        self.vt.secondary = value;
                    }
                }
            }
        }
    }
}

/// Float-then-truncate parse used for transformer ratings.
fn parse_rating(value: &str) -> Option<i64> {
    let number = value.trim().parse::<f64>().ok()?;
    number.is_finite().then(|| number.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn associates_ct_ratio_from_rows() {
        let mut device = ProtectionDeviceContext::new("SEL351", "RC-1");
        device.associate_settings(vec![
            SettingRow::new("CT", "Iprim", "400.0", "A"),
            SettingRow::new("CT", "In", "5", "A"),
            SettingRow::new("OC", "0120", "bogus", ""),
        ]);
        assert_eq!(device.ct, TransformerRatio::new(400, 5));
        assert_eq!(device.settings.len(), 3);
        assert_eq!(device.vt, TransformerRatio::default());
    }

    #[test]
    fn energex_primary_only_increases() {
        let mut device = ProtectionDeviceContext::new("SEL351", "RC-1");
        device.setting_id = Some("9".to_string());
        device.ct.primary = 800;
        device.apply_instrument_readings(
            Region::Energex,
            &[
                InstrumentReading::new("9", "CT Iprim", "400"),
                InstrumentReading::new("9", "CT Isec", "1"),
                InstrumentReading::new("8", "VT Vprim", "11000"),
            ],
        );
        assert_eq!(device.ct, TransformerRatio::new(800, 1));
        assert_eq!(device.vt, TransformerRatio::default());
    }

    #[test]
    fn fuse_patterns_mark_line_fuses() {
        let record = SettingRecord::new("5", "FU-22", "Line Fuse_Ergon");
        let device = ProtectionDeviceContext::from_record(&record, "FU-22");
        assert_eq!(device.fuse, Some(FuseKind::Line));
        assert_eq!(device.setting_id.as_deref(), Some("5"));
    }
}
