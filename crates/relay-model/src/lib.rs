//! Data model for protection relay settings resolution.

pub mod device;
pub mod error;
pub mod outcome;
pub mod record;
pub mod region;
pub mod rule;
pub mod setting;
pub mod source;
pub mod tables;
pub mod value;

pub use device::{FuseKind, ProtectionDeviceContext, TransformerRatio};
pub use error::{RelayError, Result};
pub use outcome::{DeviceOutcome, TransformerLink, UpdateStatus};
pub use record::{RawRow, SettingRecord};
pub use region::Region;
pub use rule::{MappingRule, RuleTable, USE_SETTING};
pub use setting::{InstrumentReading, SettingRow, SettingValue, format_number, normalize_unit};
pub use source::{MappingRuleSource, RepositoryError, SettingsRepository};
pub use tables::{CbAltName, CurveMapEntry, RegionTables, SuffixExpansion};
pub use value::{AttrValue, ObjectId};
