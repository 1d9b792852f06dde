//! Creating, reusing and clearing protection devices in the target model.

use relay_config::RelayConfig;
use relay_core::device::{clear_unmatched, find_or_create, place_ergon_device, place_switch_devices, switch_cubicle};
use relay_core::{DeviceClass, InMemoryModel, TargetDeviceModel};
use relay_map::{CbAltNameCache, DeviceMatcher, DeviceNamer, SettingIndex, SwitchQuery};
use relay_model::{AttrValue, MappingRuleSource, ObjectId, Region, RegionTables, SettingRecord};

fn tables() -> RegionTables {
    RelayConfig::default()
        .load_region_tables()
        .expect("built-in tables load")
}

fn switch_bay(model: &mut InMemoryModel) -> (ObjectId, ObjectId) {
    let root = model.root();
    let site = model.add(root, "ElmSubstat", "GYM");
    let cubicle = model.add(site, "StaCubic", "Cub_3");
    let switch = model.add(cubicle, "StaSwitch", "GYM12_CB");
    model.set(switch, "on_off", 0_i64);
    (cubicle, switch)
}

fn energex_index() -> SettingIndex {
    let records = vec![
        SettingRecord::new("S1", "GYM12 OC", "7SR1")
            .with_switch_name("GYM12")
            .with_location_path("/Energex/GYM/Feeders")
            .with_device_id("52:A"),
        SettingRecord::new("S2", "GYM12 Fuse", "Line Fuse_Energex")
            .with_switch_name("GYM12")
            .with_location_path("/Energex/GYM/Feeders")
            .with_device_id("F1"),
    ];
    SettingIndex::build(records, Region::Energex, &tables())
}

#[test]
fn switch_devices_are_created_once() {
    let mut model = InMemoryModel::new();
    let (cubicle, switch) = switch_bay(&mut model);
    let index = energex_index();
    let matcher = DeviceMatcher::new(&index);
    let query = relay_core::device::switch_query(&model, switch).expect("query builds");
    assert_eq!(query, SwitchQuery::station_switch("GYM12_CB", "Cub_3"));
    let matched = matcher
        .match_switch(&query, &CbAltNameCache::new())
        .expect("switch name long enough");

    let devices = place_switch_devices(&mut model, switch, &matched, &mut DeviceNamer::new())
        .expect("first placement");
    let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["GYM12_52A", "GYM12_F1"]);
    assert_eq!(devices[0].switch_closed, Some(false));
    assert!(devices[1].is_fuse());
    assert_eq!(model.class_name(devices[1].target.expect("target")).expect("class"), "RelFuse");

    let created = model.stats().created;
    assert_eq!(created, 2);
    let before = model.snapshot();

    let again = place_switch_devices(&mut model, switch, &matched, &mut DeviceNamer::new())
        .expect("second placement");
    assert_eq!(model.stats().created, created);
    assert_eq!(model.snapshot(), before);
    assert_eq!(
        again.iter().map(|d| d.target).collect::<Vec<_>>(),
        devices.iter().map(|d| d.target).collect::<Vec<_>>()
    );
    assert_eq!(
        model.get_contents(cubicle, &relay_core::ContentFilter::class("ElmRelay"), false).expect("contents").len(),
        1
    );
}

#[test]
fn unmatched_switch_cubicle_is_cleared() {
    let mut model = InMemoryModel::new();
    let (cubicle, switch) = switch_bay(&mut model);
    model.add(cubicle, "ElmRelay", "GYM12_OLD");
    model.add(cubicle, "RelFuse", "GYM12_FUSE");
    model.add(cubicle, "StaCt", "GYM12_CT");

    let removed = clear_unmatched(&mut model, switch).expect("cleared");

    assert_eq!(removed, 3);
    assert!(model.exists(switch));
    assert_eq!(model.stats().deleted, 3);
}

#[test]
fn coupler_protection_lives_in_bus_cubicle() {
    let mut model = InMemoryModel::new();
    let root = model.root();
    let site = model.add(root, "ElmSubstat", "NIP");
    let cubicle = model.add(site, "StaCubic", "Cub_9");
    let coupler = model.add(site, "ElmCoup", "NIP1A");
    model.set(coupler, "bus1", cubicle);

    assert_eq!(switch_cubicle(&model, coupler).expect("lookup"), Some(cubicle));
    let placed = find_or_create(&mut model, cubicle, "NIP1A_7", DeviceClass::Relay).expect("placed");
    assert!(placed.created);
    let reused = find_or_create(&mut model, cubicle, "NIP1A_7", DeviceClass::Relay).expect("reused");
    assert_eq!(reused.object, placed.object);
    assert!(!reused.created);
}

fn ergon_index() -> SettingIndex {
    let records = vec![
        SettingRecord::new("E1", "RC-1234", "CAPM4").with_date("2022-05-01"),
        SettingRecord::new("E2", "RC-55A", "CAPM4"),
        SettingRecord::new("E3", "RC-55B", "CAPM4"),
    ];
    SettingIndex::build(records, Region::Ergon, &tables())
}

#[test]
fn ergon_exact_match_keeps_device() {
    let mut model = InMemoryModel::new();
    let root = model.root();
    let cubicle = model.add(root, "StaCubic", "Cub_1");
    let device = model.add(cubicle, "ElmRelay", "RC-1234 Recloser");
    let index = ergon_index();

    let contexts = place_ergon_device(&mut model, device, &DeviceMatcher::new(&index)).expect("placed");

    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].target, Some(device));
    assert_eq!(contexts[0].setting_id.as_deref(), Some("E1"));
    assert_eq!(contexts[0].plant_number.as_deref(), Some("RC-1234"));
    assert_eq!(model.stats().created, 0);
}

#[test]
fn ergon_partial_matches_claim_then_create() {
    let mut model = InMemoryModel::new();
    let root = model.root();
    let cubicle = model.add(root, "StaCubic", "Cub_1");
    let device = model.add(cubicle, "ElmRelay", "RC-55 Pole");
    let index = ergon_index();

    let contexts = place_ergon_device(&mut model, device, &DeviceMatcher::new(&index)).expect("placed");

    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[0].target, Some(device));
    assert_eq!(model.attr(device, "loc_name"), AttrValue::text("RC-55A"));
    let created = contexts[1].target.expect("second target");
    assert_ne!(created, device);
    assert_eq!(model.attr(created, "loc_name"), AttrValue::text("RC-55B"));
    assert_eq!(model.stats().created, 1);
}

#[test]
fn ergon_devices_without_records_or_plant_numbers() {
    let mut model = InMemoryModel::new();
    let root = model.root();
    let cubicle = model.add(root, "StaCubic", "Cub_1");
    let unmatched = model.add(cubicle, "ElmRelay", "RC-77");
    let unnamed = model.add(cubicle, "ElmRelay", "Feeder relay");
    let index = ergon_index();
    let matcher = DeviceMatcher::new(&index);

    let contexts = place_ergon_device(&mut model, unmatched, &matcher).expect("placed");
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].setting_id, None);
    assert_eq!(contexts[0].target, Some(unmatched));

    assert!(place_ergon_device(&mut model, unnamed, &matcher).expect("placed").is_empty());
}
