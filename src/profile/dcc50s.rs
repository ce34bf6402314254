use crate::prelude::*;
use crate::profile::{self, Decoder, Field, Profile};

use num_enum::{IntoPrimitive, TryFromPrimitive};

use Decoder::*;

const UNSIGNED_0: Decoder = Scalar(Encoding::unsigned(0));
const UNSIGNED_1: Decoder = Scalar(Encoding::unsigned(1));
const UNSIGNED_2: Decoder = Scalar(Encoding::unsigned(2));

// {{{ Register
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum Register {
    RatedVoltageCurrent = 0x0A,
    ProductModel = 0x0C,
    SoftwareVersion = 0x14,
    HardwareVersion = 0x16,
    ProductSerialNumber = 0x18,
    BatteryStateOfCharge = 0x100,
    BatteryVoltage = 0x101,
    ChargeCurrent = 0x102,
    Temperatures = 0x103,
    AlternatorVoltage = 0x104,
    AlternatorCurrent = 0x105,
    AlternatorPower = 0x106,
    SolarVoltage = 0x107,
    SolarCurrent = 0x108,
    SolarPower = 0x109,
    ChargeState = 0x120,
    AlarmA = 0x121,
    AlarmB = 0x122,
    BatteryMaxChargeCurrent = 0xE001, // A, x100
    BatteryNominalCapacity = 0xE002,  // Ah
    BatteryType = 0xE004,
}
// }}}

// {{{ BatteryType
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum BatteryType {
    UserDefined = 0,
    OpenCell = 1,
    Sealed = 2,
    Gel = 3,
    LiFePO4 = 4,
}

impl std::fmt::Display for BatteryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BatteryType::UserDefined => "UserDefined",
            BatteryType::OpenCell => "OpenCell",
            BatteryType::Sealed => "Sealed",
            BatteryType::Gel => "Gel",
            BatteryType::LiFePO4 => "LiFePO4",
        };
        write!(f, "{}", name)
    }
}

/// Name for a battery type code; codes outside the table are kept as `Unknown#<n>`.
pub fn battery_type_name(code: u16) -> String {
    match BatteryType::try_from(code) {
        Ok(battery_type) => battery_type.to_string(),
        Err(_) => format!("Unknown#{}", code),
    }
}
// }}}

const CHARGE_STATE: &[&str] = &[
    "charging_active",
    "reserved_1",
    "mppt_charging",
    "equalizing_charge",
    "boost_charge",
    "float_charge",
    "current_limiting",
    "reserved_7",
    "direct_charge",
];

const ALARM_A: &[&str] = &[
    "battery_over_discharge",
    "battery_over_voltage",
    "battery_under_voltage_warning",
    "load_short_circuit",
    "load_over_power",
    "controller_over_temperature",
    "ambient_over_temperature",
    "solar_input_over_power",
    "solar_input_short_circuit",
    "solar_input_over_voltage",
    "solar_counter_current",
    "solar_working_point_over_voltage",
];

const ALARM_B: &[&str] = &[
    "solar_reverse_connection",
    "anti_reverse_mosfet_short",
    "charge_mosfet_short",
    "alternator_over_voltage",
    "alternator_under_voltage",
    "alternator_over_current",
    "alternator_reverse_connection",
    "battery_over_temperature",
    "battery_low_temperature",
    "bms_overcharge_protection",
    "starter_battery_low_voltage",
    "low_temperature_charge_stop",
    "lithium_battery_activation_failed",
];

/// Register table of the DCC50S DC-DC/MPPT charger, in snapshot order.
pub const DCC50S_FIELDS: &[Field] = &[
    Field::new(
        "rated_voltage_current",
        Register::RatedVoltageCurrent as u16,
        BytePair {
            high: "voltage",
            low: "current",
            signed: false,
        },
    ),
    Field::new("product_model", Register::ProductModel as u16, Ascii(8)),
    Field::new("software_version", Register::SoftwareVersion as u16, Version),
    Field::new("hardware_version", Register::HardwareVersion as u16, Version),
    Field::new("product_serial_number", Register::ProductSerialNumber as u16, SerialHex),
    Field::new("battery_state_of_charge", Register::BatteryStateOfCharge as u16, UNSIGNED_0),
    Field::new("battery_voltage", Register::BatteryVoltage as u16, UNSIGNED_1),
    Field::new("charge_current", Register::ChargeCurrent as u16, UNSIGNED_2),
    Field::new(
        "temperatures",
        Register::Temperatures as u16,
        BytePair {
            high: "internal",
            low: "external",
            signed: true,
        },
    ),
    Field::new("alternator_voltage", Register::AlternatorVoltage as u16, UNSIGNED_1),
    Field::new("alternator_current", Register::AlternatorCurrent as u16, UNSIGNED_2),
    Field::new("alternator_power", Register::AlternatorPower as u16, UNSIGNED_0),
    Field::new("solar_voltage", Register::SolarVoltage as u16, UNSIGNED_1),
    Field::new("solar_current", Register::SolarCurrent as u16, UNSIGNED_2),
    Field::new("solar_power", Register::SolarPower as u16, UNSIGNED_0),
    Field::new("charge_state", Register::ChargeState as u16, Flags(CHARGE_STATE)),
    Field::new("alarm_a", Register::AlarmA as u16, Flags(ALARM_A)),
    Field::new("alarm_b", Register::AlarmB as u16, Flags(ALARM_B)),
    Field::new(
        "battery_max_charge_current",
        Register::BatteryMaxChargeCurrent as u16,
        UNSIGNED_2,
    ),
    Field::new(
        "battery_nominal_capacity",
        Register::BatteryNominalCapacity as u16,
        UNSIGNED_0,
    ),
    Field::new(
        "battery_type",
        Register::BatteryType as u16,
        Enumeration(battery_type_name),
    ),
];

pub struct Dcc50s<C> {
    client: C,
}

impl<C: RegisterClient> Dcc50s<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    pub fn battery_type(&mut self) -> Result<String> {
        let code = self.client.read_word(Register::BatteryType.into())?;
        Ok(battery_type_name(code))
    }

    pub fn set_battery_type(&mut self, battery_type: BatteryType) -> Result<()> {
        info!("setting battery type to {}", battery_type);
        self.client
            .write_register(Register::BatteryType.into(), battery_type.into())?;
        Ok(())
    }

    pub fn set_max_charge_current(&mut self, amps: f64) -> Result<()> {
        info!("setting max charge current to {}A", amps);
        self.client.write_scalar(
            Register::BatteryMaxChargeCurrent.into(),
            amps,
            Encoding::unsigned(2),
        )
    }

    pub fn set_nominal_capacity(&mut self, amp_hours: u16) -> Result<()> {
        info!("setting nominal capacity to {}Ah", amp_hours);
        self.client
            .write_register(Register::BatteryNominalCapacity.into(), amp_hours)?;
        Ok(())
    }
}

impl<C: RegisterClient> Profile for Dcc50s<C> {
    fn model(&self) -> &'static str {
        "dcc50s"
    }

    fn fields(&self) -> &'static [Field] {
        DCC50S_FIELDS
    }

    fn snapshot(&mut self) -> Result<Snapshot> {
        let model = self.model();
        profile::snapshot(&mut self.client, model, DCC50S_FIELDS)
    }

    fn field(&mut self, name: &str) -> Result<Value> {
        profile::read_field(&mut self.client, DCC50S_FIELDS, name)
    }
}
