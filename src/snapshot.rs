use crate::array::CellArray;
use crate::bitfield::{FlagSet, QuadStateSet};
use crate::register::Encoding;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One decoded field.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Integer(i64),
    Number(f64),
    Text(String),
    Flags(FlagSet),
    Alarms(QuadStateSet),
    Cells(CellArray),
    /// Several small values packed into one register.
    Group(Vec<(&'static str, Value)>),
    /// A field the device firmware cannot serve.
    Unsupported,
}

impl Value {
    /// Integers stay integers; anything with decimal places becomes a float.
    pub fn scaled(value: f64, encoding: Encoding) -> Self {
        if encoding.decimals == 0 {
            Value::Integer(value as i64)
        } else {
            Value::Number(value)
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Flags(flags) => flags.serialize(serializer),
            Value::Alarms(alarms) => alarms.serialize(serializer),
            Value::Cells(cells) => cells.serialize(serializer),
            Value::Group(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for (name, value) in members {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            Value::Unsupported => serializer.serialize_none(),
        }
    }
}

impl From<FlagSet> for Value {
    fn from(flags: FlagSet) -> Self {
        Value::Flags(flags)
    }
}

impl From<QuadStateSet> for Value {
    fn from(alarms: QuadStateSet) -> Self {
        Value::Alarms(alarms)
    }
}

impl From<CellArray> for Value {
    fn from(cells: CellArray) -> Self {
        Value::Cells(cells)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

// Snapshot {{{
/// Every declared field of one device, read once, in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    model: &'static str,
    fields: Vec<(&'static str, Value)>,
}

impl Snapshot {
    pub fn new(model: &'static str) -> Self {
        Self {
            model,
            fields: Vec::new(),
        }
    }

    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn push(&mut self, name: &'static str, value: Value) {
        self.fields.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(n, _)| *n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self, indent: usize) -> serde_json::Result<String> {
        to_json(self, indent)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
// }}}

/// Snapshots of several devices keyed by device name, in the order taken.
#[derive(Clone, Debug, Default)]
pub struct SnapshotSet {
    snapshots: Vec<(String, Snapshot)>,
}

impl SnapshotSet {
    pub fn push(&mut self, device: String, snapshot: Snapshot) {
        self.snapshots.push((device, snapshot));
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn to_json(&self, indent: usize) -> serde_json::Result<String> {
        to_json(self, indent)
    }
}

impl Serialize for SnapshotSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.snapshots.len()))?;
        for (device, snapshot) in &self.snapshots {
            map.serialize_entry(device, snapshot)?;
        }
        map.end()
    }
}

fn to_json<T: Serialize>(value: &T, indent: usize) -> serde_json::Result<String> {
    let indent = vec![b' '; indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;

    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}
