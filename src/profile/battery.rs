use crate::prelude::*;
use crate::profile::{self, Decoder, Field, Profile};

use Decoder::*;

const UNSIGNED_0: Decoder = Scalar(Encoding::unsigned(0));
const UNSIGNED_1: Decoder = Scalar(Encoding::unsigned(1));
const SIGNED_1: Decoder = Scalar(Encoding::signed(1));
const SIGNED_2: Decoder = Scalar(Encoding::signed(2));
const SIGNED_CELLS: Decoder = Cells(Encoding::signed(1));

// Bit names {{{
const OTHER_ALARM: &[&str] = &[
    "reserved_0",
    "reserved_1",
    "reserved_2",
    "reserved_3",
    "reserved_4",
    "reserved_5",
    "reserved_6",
    "reserved_7",
    "reserved_8",
    "discharge_current",
    "charge_current",
    "heater_temperature_2",
    "heater_temperature_1",
    "environment_temperature_2",
    "environment_temperature_1",
    "bms_temperature",
];

const STATUS_ONE: &[&str] = &[
    "short_circuit",
    "charge_mosfet",
    "discharge_mosfet",
    "using_module_power",
    "charge_over_current_2",
    "discharge_over_current_2",
    "module_over_voltage",
    "cell_under_voltage",
    "cell_over_voltage",
    "charge_over_current_1",
    "discharge_over_current_1",
    "discharge_under_temp",
    "discharge_over_temp",
    "charge_under_temp",
    "charge_over_temp",
    "module_under_voltage",
];

const STATUS_TWO: &[&str] = &[
    "cell_low_voltage",
    "cell_high_voltage",
    "module_low_voltage",
    "module_high_voltage",
    "charge_low_temp",
    "charge_high_temp",
    "discharge_low_temp",
    "discharge_high_temp",
    "buzzer_on",
    "reserved_9",
    "reserved_10",
    "fully_charged",
    "reserved_12",
    "heater_on",
    "effective_discharge_current",
    "effective_charge_current",
];

const STATUS_THREE: &[&str] = &[
    "cell_voltage_1_error",
    "cell_voltage_2_error",
    "cell_voltage_3_error",
    "cell_voltage_4_error",
    "cell_voltage_5_error",
    "cell_voltage_6_error",
    "cell_voltage_7_error",
    "cell_voltage_8_error",
    "cell_voltage_9_error",
    "cell_voltage_10_error",
    "cell_voltage_11_error",
    "cell_voltage_12_error",
    "cell_voltage_13_error",
    "cell_voltage_14_error",
    "cell_voltage_15_error",
    "cell_voltage_16_error",
];

const STATUS_CHARGE_DISCHARGE: &[&str] = &[
    "reserved_0",
    "reserved_1",
    "reserved_2",
    "full_charge_request",
    "charge_immediately_a",
    "charge_immediately_b",
    "discharge_enable",
    "charge_enable",
    "reserved_8",
    "reserved_9",
    "reserved_10",
    "reserved_11",
    "reserved_12",
    "reserved_13",
    "reserved_14",
    "reserved_15",
];
// }}}

/// Register table of a Renogy smart lithium battery, in snapshot order.
pub const BATTERY_FIELDS: &[Field] = &[
    // live readings
    Field::new("cell_voltages", 5000, Cells(Encoding::unsigned(1))),
    Field::new("cell_temperatures", 5017, SIGNED_CELLS),
    Field::new("module_temperature", 5035, SIGNED_1),
    Field::new("environment_temperatures", 5037, Optional(&SIGNED_CELLS)),
    Field::new("heater_temperatures", 5039, SIGNED_CELLS),
    Field::new("module_current", 5042, SIGNED_2),
    Field::new("module_voltage", 5043, UNSIGNED_1),
    Field::new("module_remaining_capacity", 5044, Scalar(Encoding::unsigned_long(3))),
    Field::new("module_capacity", 5046, Scalar(Encoding::unsigned_long(3))),
    Field::new("module_cycle_count", 5048, UNSIGNED_0),
    Field::new("charge_voltage_limit", 5049, SIGNED_1),
    Field::new("discharge_voltage_limit", 5050, SIGNED_1),
    Field::new("charge_current_limit", 5051, SIGNED_2),
    Field::new("discharge_current_limit", 5052, SIGNED_2),
    // alarms and status
    Field::new("cell_voltage_alarm", 5100, CellQuadStates { count_address: 5000 }),
    Field::new("cell_temperature_alarm", 5102, CellQuadStates { count_address: 5017 }),
    Field::new("other_alarm", 5104, QuadStates(OTHER_ALARM)),
    Field::new("status_one", 5106, Flags(STATUS_ONE)),
    Field::new("status_two", 5107, Flags(STATUS_TWO)),
    Field::new("status_three", 5108, Flags(STATUS_THREE)),
    Field::new("status_charge_discharge", 5109, Flags(STATUS_CHARGE_DISCHARGE)),
    // identity
    Field::new("module_serial_number", 5110, Ascii(8)),
    Field::new("module_manufacture_version", 5118, Optional(&Ascii(1))),
    Field::new("module_mainline_version", 5119, Ascii(2)),
    Field::new("bms_communication_protocol_version", 5121, Ascii(1)),
    Field::new("module_battery_name", 5122, Ascii(8)),
    Field::new("module_manufacturer_name", 5132, Unsupported),
    // protection limits
    Field::new("cell_over_voltage", 5200, UNSIGNED_1),
    Field::new("cell_high_voltage", 5201, UNSIGNED_1),
    Field::new("cell_low_voltage", 5202, UNSIGNED_1),
    Field::new("cell_under_voltage", 5203, UNSIGNED_1),
    Field::new("cell_over_temperature", 5204, UNSIGNED_1),
    Field::new("cell_high_temperature", 5205, UNSIGNED_1),
    Field::new("cell_low_temperature", 5206, UNSIGNED_1),
    Field::new("cell_under_temperature", 5207, UNSIGNED_1),
    Field::new("charge_current_limit_2", 5208, SIGNED_2),
    Field::new("charge_current_limit_1", 5209, SIGNED_2),
    Field::new("charge_high_current_limit", 5210, UNSIGNED_1),
    Field::new("module_over_voltage_limit", 5211, UNSIGNED_1),
    Field::new("module_high_voltage_limit", 5212, UNSIGNED_1),
    Field::new("module_low_voltage_limit", 5213, UNSIGNED_1),
    Field::new("module_under_voltage_limit", 5214, UNSIGNED_1),
    Field::new("discharge_over_temperature", 5215, SIGNED_1),
    Field::new("discharge_high_temperature", 5216, SIGNED_1),
    Field::new("discharge_low_temperature", 5217, SIGNED_1),
    Field::new("discharge_under_temperature", 5218, SIGNED_1),
    Field::new("discharge_over_current_2", 5219, SIGNED_2),
    Field::new("discharge_over_current_1", 5220, SIGNED_2),
    Field::new("discharge_high_current", 5221, SIGNED_2),
];

pub struct Battery<C> {
    client: C,
}

impl<C: RegisterClient> Battery<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn into_inner(self) -> C {
        self.client
    }
}

impl<C: RegisterClient> Profile for Battery<C> {
    fn model(&self) -> &'static str {
        "battery"
    }

    fn fields(&self) -> &'static [Field] {
        BATTERY_FIELDS
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        let model = self.model();
        profile::snapshot(&mut self.client, model, BATTERY_FIELDS)
    }

    fn field(&mut self, name: &str) -> Result<Value> {
        profile::read_field(&mut self.client, BATTERY_FIELDS, name)
    }
}
