#![deny(unsafe_code)]

//! Setting record indexing and device matching.

pub mod alt_names;
pub mod expand;
pub mod index;
pub mod matcher;
pub mod naming;

pub use alt_names::CbAltNameCache;
pub use expand::{SubstationScope, derive_substation, expand_double_box};
pub use index::{IndexStats, MIN_PREFIX_LEN, SettingIndex};
pub use matcher::{DeviceMatcher, MatchRoute, SwitchCandidate, SwitchMatch, SwitchQuery};
pub use naming::{DeviceNamer, MIN_SWITCH_NAME_LEN, base_switch_name, clean_device_id, plant_number};
