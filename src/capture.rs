use crate::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// An in-memory register space that answers like a device.
///
/// Loaded from a capture of a real device, it replays that device's
/// registers so encodings can be checked offline. Addresses that were never
/// captured behave like a silent device and fail with `NoResponse`.
#[derive(Clone, Debug, Default)]
pub struct RegisterImage {
    registers: HashMap<RegisterAddress, u16>,
    requests: Vec<(RegisterAddress, u16)>,
}

impl RegisterImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a capture file: a mapping of register address to word value,
    /// as YAML, or as JSON when the file name ends in `.json`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|err| anyhow!("error reading capture {}: {}", path.display(), err))?;

        let registers: BTreeMap<RegisterAddress, u16> =
            if path.extension().map_or(false, |ext| ext == "json") {
                serde_json::from_str(&content)
                    .map_err(|err| anyhow!("error parsing capture {}: {}", path.display(), err))?
            } else {
                serde_yaml::from_str(&content)
                    .map_err(|err| anyhow!("error parsing capture {}: {}", path.display(), err))?
            };

        debug!("loaded {} registers from {}", registers.len(), path.display());

        Ok(Self {
            registers: registers.into_iter().collect(),
            requests: Vec::new(),
        })
    }

    pub fn set_word(&mut self, address: RegisterAddress, value: u16) {
        self.registers.insert(address, value);
    }

    /// Values that would land past the last register are dropped.
    pub fn set_words(&mut self, start: RegisterAddress, values: &[u16]) {
        let room = usize::from(RegisterAddress::MAX - start) + 1;
        if values.len() > room {
            warn!(
                "dropping {} of {} values from {} past the register space",
                values.len() - room,
                values.len(),
                start
            );
        }
        for (address, value) in (start..=RegisterAddress::MAX).zip(values) {
            self.set_word(address, *value);
        }
    }

    /// High word at `address`, low word at `address + 1`.
    pub fn set_composite(&mut self, address: RegisterAddress, value: u32) {
        self.set_words(address, &[(value >> 16) as u16, value as u16]);
    }

    /// Packs `text` two bytes per register, padding with NULs to `count` registers.
    pub fn set_ascii(&mut self, address: RegisterAddress, text: &str, count: u16) {
        let mut bytes = text.as_bytes().to_vec();
        bytes.resize(usize::from(count) * 2, 0);

        let words: Vec<u16> = bytes
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        self.set_words(address, &words);
    }

    pub fn remove(&mut self, address: RegisterAddress) {
        self.registers.remove(&address);
    }

    pub fn word(&self, address: RegisterAddress) -> Option<u16> {
        self.registers.get(&address).copied()
    }

    /// Every read served so far, as `(address, count)`.
    pub fn requests(&self) -> &[(RegisterAddress, u16)] {
        &self.requests
    }

    pub fn clear_requests(&mut self) {
        self.requests.clear();
    }
}

impl RegisterClient for RegisterImage {
    fn read_registers(
        &mut self,
        address: RegisterAddress,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        trace!("image read {} x{}", address, count);
        self.requests.push((address, count));

        (0..count)
            .map(|offset| {
                let register = address.wrapping_add(offset);
                self.word(register)
                    .ok_or(TransportError::NoResponse { address: register })
            })
            .collect()
    }

    fn write_register(&mut self, address: RegisterAddress, value: u16) -> Result<(), TransportError> {
        trace!("image write {} = {:#06x}", address, value);
        self.set_word(address, value);
        Ok(())
    }
}
