//! Name handling for switches, devices and plant numbers.

use std::collections::HashSet;

/// Switch names shorter than this are too ambiguous to look up.
pub const MIN_SWITCH_NAME_LEN: usize = 4;

/// Characters stripped from repository device ids.
const DEVICE_ID_NOISE: &[char] = &[':', ' ', '/', ','];

const PLANT_PREFIXES: &[&str] = &["RC-", "RE-", "DO-", "FU-", "DL-"];

/// Portion of a switch name before the first underscore.
pub fn base_switch_name(name: &str) -> &str {
    name.split('_').next().unwrap_or(name)
}

pub fn clean_device_id(device_id: &str) -> String {
    device_id
        .chars()
        .filter(|c| !DEVICE_ID_NOISE.contains(c))
        .collect()
}

/// Plant number of a regional device name, if it follows a known scheme.
///
/// Substation relays look like `ABCDSS-12-X`, reclosers and fuses start with
/// a `RC-`, `RE-`, `DO-`, `FU-` or `DL-` prefix. The plant number is the
/// name up to the first space.
pub fn plant_number(device_name: &str) -> Option<&str> {
    let substation_relay = device_name.get(4..7) == Some("SS-");
    let prefixed = PLANT_PREFIXES
        .iter()
        .any(|prefix| device_name.starts_with(prefix));
    if !substation_relay && !prefixed {
        return None;
    }
    device_name.split(' ').next()
}

/// Allocates target device names for one run.
///
/// Names are `{switch}_{device id}`; a repeat within the run is extended
/// with the record's asset name. Devices without an id use the asset name
/// directly.
#[derive(Debug, Default)]
pub struct DeviceNamer {
    used: HashSet<String>,
}

impl DeviceNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&mut self, switch_name: &str, device_id: Option<&str>, asset_name: &str) -> String {
        let name = match device_id.map(clean_device_id).filter(|id| !id.is_empty()) {
            None => format!("{switch_name}_{asset_name}"),
            Some(id) => {
                let base = format!("{switch_name}_{id}");
                if self.used.contains(base.trim_end()) {
                    format!("{switch_name}_{id}_{asset_name}")
                } else {
                    base
                }
            }
        };
        let name = name.trim_end().to_string();
        self.used.insert(name.clone());
        name
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    pub fn reset(&mut self) {
        self.used.clear();
    }
}
