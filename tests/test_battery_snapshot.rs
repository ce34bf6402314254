mod common;
use common::*;

use renogy_modbus::bitfield::QuadState;
use renogy_modbus::prelude::*;
use renogy_modbus::profile::battery::BATTERY_FIELDS;
use renogy_modbus::profile::{Battery, Profile};

fn cells(snapshot: &Snapshot, name: &str) -> Vec<f64> {
    match snapshot.get(name) {
        Some(Value::Cells(cells)) => cells.iter().filter_map(|(_, v)| v.as_f64()).collect(),
        other => panic!("{} is not a cell array: {:?}", name, other),
    }
}

#[test]
fn live_readings() {
    common_setup();

    let mut battery = Battery::new(Factory::battery());
    let snapshot = battery.snapshot().unwrap();

    assert_eq!(snapshot.model(), "battery");
    assert_eq!(cells(&snapshot, "cell_voltages"), vec![3.3, 3.3, 3.4, 3.2]);
    assert_eq!(cells(&snapshot, "cell_temperatures"), vec![25.0, 25.1, -1.0, 24.5]);
    assert_eq!(cells(&snapshot, "heater_temperatures"), vec![-10.0, 5.0]);
    assert_eq!(snapshot.get("module_temperature"), Some(&Value::Number(21.5)));
    assert_eq!(snapshot.get("module_current"), Some(&Value::Number(-12.34)));
    assert_eq!(snapshot.get("module_voltage"), Some(&Value::Number(13.3)));
    assert_eq!(snapshot.get("module_remaining_capacity"), Some(&Value::Number(75.5)));
    assert_eq!(snapshot.get("module_capacity"), Some(&Value::Number(100.0)));
    assert_eq!(snapshot.get("module_cycle_count"), Some(&Value::Integer(12)));
    assert_eq!(snapshot.get("charge_voltage_limit"), Some(&Value::Number(14.4)));
    assert_eq!(snapshot.get("discharge_current_limit"), Some(&Value::Number(100.0)));
}

#[test]
fn alarms_and_status() {
    common_setup();

    let mut battery = Battery::new(Factory::battery());
    let snapshot = battery.snapshot().unwrap();

    let Some(Value::Alarms(cell_alarm)) = snapshot.get("cell_voltage_alarm") else {
        panic!("cell_voltage_alarm is not an alarm set");
    };
    assert_eq!(cell_alarm.len(), 4);
    assert_eq!(cell_alarm.get("cell_1"), Some(QuadState::Normal));
    assert_eq!(cell_alarm.get("cell_2"), Some(QuadState::BelowLowerLimit));
    assert_eq!(cell_alarm.get("cell_4"), Some(QuadState::AboveUpperLimit));
    assert_eq!(cell_alarm.remainder(), 0x100);

    let Some(Value::Alarms(other)) = snapshot.get("other_alarm") else {
        panic!("other_alarm is not an alarm set");
    };
    assert_eq!(other.len(), 7);
    assert_eq!(other.get("reserved_0"), None);
    assert_eq!(other.get("bms_temperature"), Some(QuadState::AboveUpperLimit));
    assert_eq!(other.get("charge_current"), Some(QuadState::Normal));
    assert_eq!(other.remainder(), 0);

    let Some(Value::Flags(status_one)) = snapshot.get("status_one") else {
        panic!("status_one is not a flag set");
    };
    assert_eq!(status_one.get("short_circuit"), Some(false));
    assert_eq!(status_one.get("charge_mosfet"), Some(true));
    assert_eq!(status_one.get("discharge_mosfet"), Some(true));

    let Some(Value::Flags(status_two)) = snapshot.get("status_two") else {
        panic!("status_two is not a flag set");
    };
    assert_eq!(status_two.get("fully_charged"), Some(true));
    assert_eq!(status_two.get("heater_on"), Some(true));
    assert_eq!(status_two.get("reserved_9"), None);
    assert_eq!(status_two.len(), 13);

    let json = serde_json::to_value(snapshot.get("status_charge_discharge").unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "full_charge_request": false,
            "charge_immediately_a": false,
            "charge_immediately_b": false,
            "discharge_enable": true,
            "charge_enable": true,
            "_value": 0
        })
    );
}

#[test]
fn identity_and_limits() {
    common_setup();

    let mut battery = Battery::new(Factory::battery());
    let snapshot = battery.snapshot().unwrap();

    assert_eq!(snapshot.get("module_serial_number").and_then(Value::as_str), Some("BT2024A0001"));
    assert_eq!(snapshot.get("module_manufacture_version").and_then(Value::as_str), Some("A1"));
    assert_eq!(snapshot.get("module_mainline_version").and_then(Value::as_str), Some("0107"));
    assert_eq!(
        snapshot.get("bms_communication_protocol_version").and_then(Value::as_str),
        Some("02")
    );
    assert_eq!(snapshot.get("module_battery_name").and_then(Value::as_str), Some("RBT100LFP12S"));

    assert_eq!(snapshot.get("cell_over_voltage"), Some(&Value::Number(3.8)));
    assert_eq!(snapshot.get("cell_under_temperature"), Some(&Value::Number(5.0)));
    assert_eq!(snapshot.get("charge_current_limit_2"), Some(&Value::Number(110.0)));
    assert_eq!(snapshot.get("discharge_low_temperature"), Some(&Value::Number(-10.0)));
    assert_eq!(snapshot.get("discharge_under_temperature"), Some(&Value::Number(-20.0)));
    assert_eq!(snapshot.get("discharge_high_current"), Some(&Value::Number(110.0)));
}

#[test]
fn unreliable_registers_read_as_null() {
    common_setup();

    let mut image = Factory::battery();
    image.remove(5118);
    let mut battery = Battery::new(image);
    let snapshot = battery.snapshot().unwrap();

    assert_eq!(snapshot.get("environment_temperatures"), Some(&Value::Unsupported));
    assert_eq!(snapshot.get("module_manufacture_version"), Some(&Value::Unsupported));
    assert_eq!(snapshot.get("module_manufacturer_name"), Some(&Value::Unsupported));

    // the manufacturer name is never even asked for
    let image = battery.into_inner();
    assert!(!image.requests().iter().any(|(address, _)| *address == 5132));
}

#[test]
fn fields_in_declared_order() {
    common_setup();

    let mut battery = Battery::new(Factory::battery());
    let snapshot = battery.snapshot().unwrap();

    let names: Vec<_> = snapshot.names().collect();
    let declared: Vec<_> = BATTERY_FIELDS.iter().map(|f| f.name).collect();
    assert_eq!(names, declared);
    assert_eq!(names.first(), Some(&"cell_voltages"));
    assert_eq!(names.last(), Some(&"discharge_high_current"));

    let json = snapshot.to_json(4).unwrap();
    assert!(json.starts_with("{\n    \"cell_voltages\": {\n        \"cell_1\": 3.3,"));
    assert!(json.contains("\"module_manufacturer_name\": null"));
}

#[test]
fn failed_cell_fails_snapshot() {
    common_setup();

    let mut image = Factory::battery();
    image.remove(5003);
    let mut battery = Battery::new(image);

    match battery.snapshot() {
        Err(Error::Transport(TransportError::NoResponse { address })) => assert_eq!(address, 5003),
        other => panic!("expected NoResponse, got {:?}", other),
    }

    // nothing after the failing array was read
    let image = battery.into_inner();
    assert!(!image.requests().iter().any(|(address, _)| *address > 5003));
}

#[test]
fn cell_alarm_names_follow_live_count() {
    common_setup();

    let mut image = Factory::battery();
    image.set_word(5000, 2);
    let mut battery = Battery::new(image);

    let Value::Alarms(alarms) = battery.field("cell_voltage_alarm").unwrap() else {
        panic!("cell_voltage_alarm is not an alarm set");
    };
    assert_eq!(alarms.len(), 2);
    assert_eq!(alarms.get("cell_4"), None);
    assert_eq!(alarms.remainder(), 0x0001_0084 >> 4);
}

#[test]
fn single_fields() {
    common_setup();

    let mut battery = Battery::new(Factory::battery());
    assert_eq!(battery.field("module_voltage").unwrap(), Value::Number(13.3));
    assert_eq!(battery.into_inner().requests(), &[(5043, 1)]);

    let mut battery = Battery::new(Factory::battery());
    assert!(matches!(
        battery.field("module_wattage"),
        Err(Error::Decode(DecodeError::UnknownField(_)))
    ));
}
