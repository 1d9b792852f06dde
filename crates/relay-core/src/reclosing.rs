//! Reclosing logic table construction.
//!
//! A reclosing element holds one vector per named logic row, one position
//! per trip up to the operations-to-lockout ceiling. Each position is
//! [`DISABLED_STEP`], [`RECLOSE`] or [`LOCKOUT`].

use std::collections::BTreeMap;

use relay_config::PatternLists;
use relay_model::{AttrValue, MappingRule, ObjectId, ProtectionDeviceContext, SettingValue};
use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::{SettingDictionary, find_element};
use crate::error::Result;
use crate::model::{TYPE_ATTR, TargetDeviceModel};
use crate::resolve::setting_adjustment;

pub const DISABLED_STEP: f64 = 0.0;
pub const RECLOSE: f64 = 1.0;
pub const LOCKOUT: f64 = 2.0;

pub const RECLOSING_CLASS: &str = "RelRecl";
/// Element that receives the tally ceiling for devices without a trips-to-lockout setting.
pub const TALLY_ELEMENT: &str = "Reclosing Element";

const LOGIC_MARKER: &str = "_logic";
const TRIPS_MARKER: &str = "_TripstoLockout";
const NO_RECLOSE_FLAG: &str = "N";

/// Which trips a logic row applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripSelector {
    All,
    Trip(usize),
    /// Unrecognised trip token; the row stays disabled.
    Other,
}

impl TripSelector {
    pub fn parse(token: &str) -> Self {
        if token == "ALL" {
            return Self::All;
        }
        token.trim().parse().map_or(Self::Other, Self::Trip)
    }
}

/// One resolved logic row.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicRow {
    pub name: String,
    pub trips: TripSelector,
    pub on_off_key: String,
    pub recloses: bool,
    pub setting: SettingValue,
}

impl LogicRow {
    /// Trip state per position for a given ceiling.
    pub fn vector(&self, ceiling: usize) -> Vec<f64> {
        if !self.recloses {
            let level = if self.setting.to_string().to_lowercase() == self.on_off_key.to_lowercase() {
                DISABLED_STEP
            } else {
                LOCKOUT
            };
            return (1..=ceiling)
                .map(|trip| match self.trips {
                    TripSelector::All => level,
                    TripSelector::Trip(t) if t == trip => level,
                    _ => DISABLED_STEP,
                })
                .collect();
        }

        match self.trips {
            TripSelector::All => {
                let count = match &self.setting {
                    SettingValue::Text(text) if text == "None" => 1.0,
                    other => other.as_f64().unwrap_or(1.0),
                };
                (1..=ceiling)
                    .map(|trip| {
                        let position = trip as f64;
                        if trip < ceiling && position < count {
                            RECLOSE
                        } else if trip == ceiling || position == count {
                            LOCKOUT
                        } else {
                            DISABLED_STEP
                        }
                    })
                    .collect()
            }
            TripSelector::Trip(t) => (1..=ceiling)
                .map(|trip| match trip {
                    _ if trip != t => DISABLED_STEP,
                    _ if t < ceiling => RECLOSE,
                    _ => LOCKOUT,
                })
                .collect(),
            TripSelector::Other => vec![DISABLED_STEP; ceiling],
        }
    }
}

/// What the builder wrote to a device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReclosingUpdate {
    pub element: ObjectId,
    pub ceiling: usize,
    pub rows: BTreeMap<String, Vec<f64>>,
}

/// Trips-to-lockout tally: one plus each trips row whose setting equals its key.
pub fn trip_tally(rules: &[MappingRule], dictionary: &SettingDictionary) -> usize {
    1 + rules
        .iter()
        .filter(|rule| rule.element().contains(TRIPS_MARKER))
        .filter(|rule| {
            matches!(dictionary.get(&rule.key()), Some(SettingValue::Text(text)) if text == rule.last())
        })
        .count()
}

/// Build and write the reclosing logic for one device.
pub fn update_reclosing_logic(
    model: &mut dyn TargetDeviceModel,
    device: &ProtectionDeviceContext,
    target: ObjectId,
    rules: &[MappingRule],
    dictionary: &SettingDictionary,
    patterns: &PatternLists,
) -> Result<Option<ReclosingUpdate>> {
    let tally = trip_tally(rules, dictionary);

    if patterns.uses_lockout_tally(&device.pattern) {
        let lookup = MappingRule::new([model.name(target)?, TALLY_ELEMENT.to_string()]);
        match find_element(model, target, &lookup)? {
            Some(element) => model.set_attribute(element, "oplockout", AttrValue::Int(tally as i64))?,
            None => debug!(device = %device.name, "no tally reclosing element"),
        }
    }

    let mut element: Option<(ObjectId, String)> = None;
    let mut ceiling = tally;
    let mut rows = BTreeMap::new();

    for rule in rules.iter().filter(|rule| rule.element().contains(LOGIC_MARKER)) {
        if element.is_none() {
            let lookup = rule.with_element(rule.element().replace(LOGIC_MARKER, ""));
            let Some(candidate) = find_element(model, target, &lookup)? else {
                continue;
            };
            if model.class_name(candidate)? != RECLOSING_CLASS {
                continue;
            }
            ceiling = match model.get_attribute(candidate, "oplockout")?.as_i64() {
                Some(value) if value > 0 => value as usize,
                _ => tally,
            };
            element = Some((candidate, model.name(candidate)?));
        }
        let Some((_, element_name)) = &element else {
            continue;
        };
        if !rule.element().contains(element_name.as_str()) {
            continue;
        }
        let row = logic_row(rule, dictionary, device, tally);
        rows.insert(row.name.clone(), row.vector(ceiling));
    }

    let Some((element, _)) = element else {
        return Ok(None);
    };
    write_logic(model, element, &rows)?;
    if model.get_attribute(element, "reclnotactive")?.is_truthy() {
        model.set_attribute(element, "oplockout", AttrValue::Int(1))?;
    }
    Ok(Some(ReclosingUpdate {
        element,
        ceiling,
        rows,
    }))
}

fn logic_row(
    rule: &MappingRule,
    dictionary: &SettingDictionary,
    device: &ProtectionDeviceContext,
    tally: usize,
) -> LogicRow {
    let mut row = LogicRow {
        name: rule.attribute().to_string(),
        trips: TripSelector::parse(rule.third_last()),
        on_off_key: rule.second_last().to_string(),
        recloses: rule.last() != NO_RECLOSE_FLAG,
        setting: dictionary
            .get(&rule.key())
            .cloned()
            .unwrap_or_else(|| SettingValue::text(rule.second_last())),
    };

    let adjusted = match rule.adjustment() {
        Some("None") => return row,
        Some(_) => setting_adjustment(rule, dictionary, device.ct).ok(),
        None => None,
    };
    match adjusted.as_ref().and_then(AttrValue::as_f64) {
        Some(value) => row.setting = SettingValue::Number(value),
        None if rule.address(0) == Some("ON") => {
            row.trips = TripSelector::All;
            row.setting = SettingValue::Number(tally as f64);
        }
        None => {
            warn!(rule = %rule.key(), "reclosing row could not be adjusted, disabling");
            row.trips = TripSelector::All;
            row.setting = SettingValue::text("off");
            row.recloses = false;
            row.on_off_key = "off".to_string();
        }
    }
    row
}

/// Replace named rows of the element's logic block, keeping the others.
fn write_logic(
    model: &mut dyn TargetDeviceModel,
    element: ObjectId,
    rows: &BTreeMap<String, Vec<f64>>,
) -> Result<()> {
    let block_names = match model.reference(element, TYPE_ATTR)? {
        Some(element_type) => model.get_attribute(element_type, "blockid")?,
        None => AttrValue::Null,
    };
    let existing = model.get_attribute(element, "ilogic")?;
    let existing = existing.as_list().unwrap_or_default();

    let merged: Vec<AttrValue> = block_names
        .as_list()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(index, name)| {
            match name.as_str().and_then(|name| rows.get(name)) {
                Some(vector) => AttrValue::List(vector.iter().copied().map(AttrValue::Float).collect()),
                None => existing
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| AttrValue::List(Vec::new())),
            }
        })
        .collect();
    model.set_attribute(element, "ilogic", AttrValue::List(merged))?;
    Ok(())
}
