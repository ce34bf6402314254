use crate::error::DecodeError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Key under which the undecoded high bits of a field are reported.
pub const REMAINDER_KEY: &str = "_value";

const RESERVED_PREFIX: &str = "reserved";

/// Reserved names hold their bit position but never appear in output.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

// FlagSet {{{
/// One register decoded as named booleans, LSB first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagSet {
    flags: Vec<(String, bool)>,
    remainder: u16,
}

impl FlagSet {
    pub fn get(&self, name: &str) -> Option<bool> {
        self.flags.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Bits above the last named position, shifted down to bit 0.
    pub fn remainder(&self) -> u16 {
        self.remainder
    }
}

impl Serialize for FlagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.flags.len() + 1))?;
        for (name, value) in &self.flags {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(REMAINDER_KEY, &self.remainder)?;
        map.end()
    }
}

pub fn decode_flags<S: AsRef<str>>(register: u16, names: &[S]) -> Result<FlagSet, DecodeError> {
    if names.len() > 16 {
        return Err(DecodeError::TooManyNames {
            len: names.len(),
            max: 16,
        });
    }

    let flags = names
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_reserved(name.as_ref()))
        .map(|(bit, name)| (name.as_ref().to_string(), (register >> bit) & 1 == 1))
        .collect();

    Ok(FlagSet {
        flags,
        remainder: register.checked_shr(names.len() as u32).unwrap_or(0),
    })
}
// }}}

// QuadState {{{
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadState {
    Normal,
    BelowLowerLimit,
    AboveUpperLimit,
    OtherAlarm,
}

impl From<u32> for QuadState {
    fn from(code: u32) -> Self {
        match code & 0b11 {
            0 => QuadState::Normal,
            1 => QuadState::BelowLowerLimit,
            2 => QuadState::AboveUpperLimit,
            _ => QuadState::OtherAlarm,
        }
    }
}

impl From<QuadState> for u32 {
    fn from(state: QuadState) -> Self {
        match state {
            QuadState::Normal => 0,
            QuadState::BelowLowerLimit => 1,
            QuadState::AboveUpperLimit => 2,
            QuadState::OtherAlarm => 3,
        }
    }
}

/// A 32-bit composite decoded as up to sixteen 2-bit alarm codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuadStateSet {
    states: Vec<(String, QuadState)>,
    remainder: u32,
}

impl QuadStateSet {
    pub fn get(&self, name: &str) -> Option<QuadState> {
        self.states.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, QuadState)> {
        self.states.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn remainder(&self) -> u32 {
        self.remainder
    }
}

impl Serialize for QuadStateSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.states.len() + 1))?;
        for (name, state) in &self.states {
            map.serialize_entry(name, state)?;
        }
        map.serialize_entry(REMAINDER_KEY, &self.remainder)?;
        map.end()
    }
}

pub fn decode_quad_states<S: AsRef<str>>(
    composite: u32,
    names: &[S],
) -> Result<QuadStateSet, DecodeError> {
    if names.len() > 16 {
        return Err(DecodeError::TooManyNames {
            len: names.len(),
            max: 16,
        });
    }

    let states = names
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_reserved(name.as_ref()))
        .map(|(group, name)| {
            let code = composite >> (group * 2);
            (name.as_ref().to_string(), QuadState::from(code))
        })
        .collect();

    Ok(QuadStateSet {
        states,
        remainder: composite.checked_shr(names.len() as u32 * 2).unwrap_or(0),
    })
}
// }}}
