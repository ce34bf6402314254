pub mod battery;
pub mod dcc50s;

use crate::prelude::*;
use crate::array::{self, ArraySpec};
use crate::bitfield;
use crate::client::read_u32;

use enum_dispatch::enum_dispatch;
use serde::Deserialize;

pub use battery::Battery;
pub use dcc50s::{BatteryType, Dcc50s};

/// How one field's registers become a [`Value`].
#[derive(Clone, Copy, Debug)]
pub enum Decoder {
    Scalar(Encoding),
    /// `n` registers of packed ASCII.
    Ascii(u16),
    /// One register of named boolean flags.
    Flags(&'static [&'static str]),
    /// One composite of named 2-bit alarm codes.
    QuadStates(&'static [&'static str]),
    /// Alarm codes named `cell_1..cell_n`, `n` being read fresh from `count_address`.
    CellQuadStates { count_address: RegisterAddress },
    /// Count register followed by one register per cell.
    Cells(Encoding),
    /// One byte each in the high and low halves of a register.
    BytePair {
        high: &'static str,
        low: &'static str,
        signed: bool,
    },
    /// Composite formatted as `major.minor.build`.
    Version,
    /// Composite formatted as eight hex digits.
    SerialHex,
    /// Coded integer rendered by name, unknown codes included.
    Enumeration(fn(u16) -> String),
    /// Read is attempted, but a transport failure yields `null`.
    Optional(&'static Decoder),
    /// Never read; always `null`.
    Unsupported,
}

impl Decoder {
    pub fn read<C: RegisterClient + ?Sized>(&self, client: &mut C, address: RegisterAddress) -> Result<Value> {
        let value = match *self {
            Decoder::Scalar(encoding) => Value::scaled(client.read_scalar(address, encoding)?, encoding),
            Decoder::Ascii(count) => Value::Text(client.read_ascii_string(address, count)?),
            Decoder::Flags(names) => bitfield::decode_flags(client.read_word(address)?, names)?.into(),
            Decoder::QuadStates(names) => {
                bitfield::decode_quad_states(read_u32(client, address)?, names)?.into()
            }
            Decoder::CellQuadStates { count_address } => {
                let names = array::cell_names(client, count_address)?;
                bitfield::decode_quad_states(read_u32(client, address)?, &names)?.into()
            }
            Decoder::Cells(element) => {
                array::decode_array(client, &ArraySpec::at(address, element))?.into()
            }
            Decoder::BytePair { high, low, signed } => {
                let (h, l) = register::split_word(client.read_word(address)?);
                let byte = |b: u8| {
                    if signed {
                        Value::Integer(i64::from(b as i8))
                    } else {
                        Value::Integer(i64::from(b))
                    }
                };
                Value::Group(vec![(high, byte(h)), (low, byte(l))])
            }
            Decoder::Version => Value::Text(register::decode_version(read_u32(client, address)?)),
            Decoder::SerialHex => Value::Text(register::decode_serial(read_u32(client, address)?)),
            Decoder::Enumeration(name) => Value::Text(name(client.read_word(address)?)),
            Decoder::Optional(inner) => match inner.read(client, address) {
                Err(Error::Transport(err)) => {
                    warn!("optional register {} unavailable: {}", address, err);
                    Value::Unsupported
                }
                other => other?,
            },
            Decoder::Unsupported => Value::Unsupported,
        };

        Ok(value)
    }
}

/// One named entry in a device's register table.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    pub name: &'static str,
    pub address: RegisterAddress,
    pub decoder: Decoder,
}

impl Field {
    pub const fn new(name: &'static str, address: RegisterAddress, decoder: Decoder) -> Self {
        Self {
            name,
            address,
            decoder,
        }
    }

    pub fn read<C: RegisterClient + ?Sized>(&self, client: &mut C) -> Result<Value> {
        let value = self.decoder.read(client, self.address)?;
        debug!("{} @ {} = {:?}", self.name, self.address, value);
        Ok(value)
    }
}

/// Reads every field of `table` in order. The first failure aborts the whole snapshot.
pub fn snapshot<C: RegisterClient + ?Sized>(
    client: &mut C,
    model: &'static str,
    table: &[Field],
) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new(model);
    for field in table {
        snapshot.push(field.name, field.read(client)?);
    }
    Ok(snapshot)
}

pub fn read_field<C: RegisterClient + ?Sized>(client: &mut C, table: &[Field], name: &str) -> Result<Value> {
    table
        .iter()
        .find(|field| field.name == name)
        .ok_or_else(|| DecodeError::UnknownField(name.to_string()))?
        .read(client)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    Battery,
    Dcc50s,
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::Battery => write!(f, "battery"),
            Model::Dcc50s => write!(f, "dcc50s"),
        }
    }
}

#[enum_dispatch]
pub trait Profile {
    fn model(&self) -> &'static str;
    fn fields(&self) -> &'static [Field];
    fn snapshot(&mut self) -> Result<Snapshot>;
    fn field(&mut self, name: &str) -> Result<Value>;
}

pub type BoxedClient = Box<dyn RegisterClient>;

#[enum_dispatch(Profile)]
pub enum Device {
    Battery(Battery<BoxedClient>),
    Dcc50s(Dcc50s<BoxedClient>),
}

impl Device {
    pub fn new(model: Model, client: BoxedClient) -> Self {
        match model {
            Model::Battery => Battery::new(client).into(),
            Model::Dcc50s => Dcc50s::new(client).into(),
        }
    }
}
