//! Integration tests for device and switch matching.

use proptest::prelude::*;
use relay_config::RelayConfig;
use relay_map::{CbAltNameCache, DeviceMatcher, MatchRoute, SettingIndex, SwitchQuery};
use relay_model::{CbAltName, MappingRuleSource, Region, RegionTables, SettingRecord};

fn tables() -> RegionTables {
    RelayConfig::default()
        .load_region_tables()
        .expect("built-in tables load")
}

fn switch_record(id: &str, switch: &str, path: &str) -> SettingRecord {
    SettingRecord::new(id, format!("{switch} relay"), "7SR1")
        .with_switch_name(switch)
        .with_location_path(path)
}

#[test]
fn exact_asset_short_circuits_containment() {
    let records = vec![
        SettingRecord::new("S1", "RC-12", "7SR1"),
        SettingRecord::new("S2", "RC-12 Bypass", "7SR1"),
    ];
    let index = SettingIndex::build(records, Region::Ergon, &tables());
    let matcher = DeviceMatcher::new(&index);

    let found = matcher.match_by_containment("RC-12");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].setting_id, "S1");
}

#[test]
fn containment_rejects_digit_extensions() {
    let records = vec![
        SettingRecord::new("S1", "RC-123", "7SR1"),
        SettingRecord::new("S2", "RC-12 Bypass", "7SR1"),
    ];
    let index = SettingIndex::build(records, Region::Ergon, &tables());
    let matcher = DeviceMatcher::new(&index);

    let ids: Vec<&str> = matcher
        .match_by_containment("RC-12")
        .iter()
        .map(|r| r.setting_id.as_str())
        .collect();
    assert_eq!(ids, ["S2"]);
    assert!(matcher.match_by_containment("RC-99").is_empty());
}

#[test]
fn containment_falls_through_to_substring_scan() {
    let records = vec![
        SettingRecord::new("S1", "RC-123", "7SR1"),
        SettingRecord::new("S2", "Pole RC-12", "7SR1"),
    ];
    let index = SettingIndex::build(records, Region::Ergon, &tables());
    let matcher = DeviceMatcher::new(&index);

    let ids: Vec<&str> = matcher
        .match_by_containment("RC-12")
        .iter()
        .map(|r| r.setting_id.as_str())
        .collect();
    assert_eq!(ids, ["S2"]);
}

#[test]
fn coupler_switches_match_within_their_substation() {
    let records = vec![
        switch_record("S1", "NIP1A", "/Energex/NIP/Feeders"),
        switch_record("S2", "NIP1A", "/Energex/ABC/Feeders"),
    ];
    let index = SettingIndex::build(records, Region::Energex, &tables());
    let matcher = DeviceMatcher::new(&index);

    let found = matcher
        .match_switch(&SwitchQuery::coupler("NIP1A_CB", "NIP"), &CbAltNameCache::new())
        .expect("name long enough");
    assert_eq!(found.switch_name, "NIP1A");
    assert_eq!(found.candidates.len(), 1);
    assert_eq!(found.candidates[0].record.setting_id, "S1");
    assert_eq!(found.candidates[0].route, MatchRoute::Substation);
}

#[test]
fn station_switches_match_without_substation() {
    let records = vec![
        switch_record("S1", "NIP1A", "/Energex/NIP/Feeders"),
        switch_record("S2", "NIP1A", "/Energex/ABC/Feeders"),
    ];
    let index = SettingIndex::build(records, Region::Energex, &tables());
    let matcher = DeviceMatcher::new(&index);

    let found = matcher
        .match_switch(&SwitchQuery::station_switch("NIP1A", "Cubicle 1"), &CbAltNameCache::new())
        .expect("name long enough");
    assert_eq!(found.records().len(), 2);
    assert!(found.candidates.iter().all(|c| c.route == MatchRoute::Unscoped));
}

#[test]
fn untranslatable_substations_pass_through() {
    let records = vec![
        switch_record("S1", "GYM12", "/Energex/T124/Feeders"),
        switch_record("S2", "GYM12", "/Energex/ABC/Feeders"),
        switch_record("S3", "NIP99", "/Energex/NIP/Feeders"),
    ];
    let index = SettingIndex::build(records, Region::Energex, &tables());
    let matcher = DeviceMatcher::new(&index);

    let found = matcher
        .match_switch(&SwitchQuery::coupler("GYM12", "NIP"), &CbAltNameCache::new())
        .expect("name long enough");
    assert_eq!(found.candidates.len(), 1);
    assert_eq!(found.candidates[0].record.setting_id, "S1");
    assert_eq!(found.candidates[0].route, MatchRoute::NumericPassThrough);
}

#[test]
fn short_switch_names_are_rejected() {
    let index = SettingIndex::build(Vec::new(), Region::Energex, &tables());
    let matcher = DeviceMatcher::new(&index);
    assert!(
        matcher
            .match_switch(&SwitchQuery::coupler("AB1_CB", "NIP"), &CbAltNameCache::new())
            .is_none()
    );
}

#[test]
fn alternate_names_override_switch_name() {
    let records = vec![switch_record("S1", "NIP7B", "/Energex/NIP/Feeders")];
    let index = SettingIndex::build(records, Region::Energex, &tables());
    let matcher = DeviceMatcher::new(&index);
    let alt_names = CbAltNameCache::with_entries(vec![
        CbAltName {
            substation: "NIP".into(),
            cb_name: "CB 7".into(),
            new_name: "NIP7B".into(),
        },
        CbAltName {
            substation: "NIP".into(),
            cb_name: "CB 8".into(),
            new_name: "Not Needed".into(),
        },
    ]);

    let found = matcher
        .match_switch(&SwitchQuery::coupler("CB 7", "NIP"), &alt_names)
        .expect("override is long enough");
    assert_eq!(found.switch_name, "NIP7B");
    assert_eq!(found.candidates.len(), 1);

    assert!(alt_names.lookup("NIP", "CB 8").is_none());
}

#[test]
fn alt_name_cache_resets() {
    let source = RelayConfig::default().with_cb_alt_names(vec![CbAltName {
        substation: "NIP".into(),
        cb_name: "CB 7".into(),
        new_name: "NIP7B".into(),
    }]);
    let mut cache = CbAltNameCache::new();
    assert!(!cache.is_loaded());
    assert_eq!(cache.ensure_loaded(&source).expect("load").len(), 1);
    assert_eq!(cache.lookup("NIP", "CB 7"), Some("NIP7B"));
    cache.reset();
    assert!(!cache.is_loaded());
    assert!(cache.lookup("NIP", "CB 7").is_none());
}

proptest! {
    #[test]
    fn containment_never_returns_digit_extensions(stem in "RC-[0-9]{1,3}", tail in "[0-9]{1,2}") {
        let extended = format!("{stem}{tail}");
        let records = vec![SettingRecord::new("S1", extended.clone(), "7SR1")];
        let index = SettingIndex::build(records, Region::Ergon, &tables());
        let matcher = DeviceMatcher::new(&index);
        prop_assert!(matcher.match_by_containment(&stem).is_empty());
        prop_assert_eq!(matcher.match_by_containment(&extended).len(), 1);
    }
}
