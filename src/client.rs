use crate::prelude::*;

/// A half-duplex link to one device.
///
/// Implementors provide the two wire primitives; everything else is decoded
/// on top of them. Methods take `&mut self` so a client can never have more
/// than one request in flight.
pub trait RegisterClient {
    /// Reads `count` consecutive holding registers starting at `address`.
    fn read_registers(
        &mut self,
        address: RegisterAddress,
        count: u16,
    ) -> Result<Vec<u16>, TransportError>;

    fn write_register(&mut self, address: RegisterAddress, value: u16)
        -> Result<(), TransportError>;

    fn read_word(&mut self, address: RegisterAddress) -> Result<u16> {
        let words = self.read_registers(address, 1)?;
        words.first().copied().ok_or_else(|| {
            DecodeError::WidthMismatch {
                expected: 1,
                actual: 0,
            }
            .into()
        })
    }

    /// One register, sign-interpreted and divided by `10^decimals`.
    fn read_register(&mut self, address: RegisterAddress, decimals: u8, signed: bool) -> Result<f64> {
        let encoding = if signed {
            Encoding::signed(decimals)
        } else {
            Encoding::unsigned(decimals)
        };
        self.read_scalar(address, encoding)
    }

    /// Two registers as one big-endian 32-bit value.
    fn read_composite(&mut self, address: RegisterAddress, signed: bool) -> Result<i64> {
        let encoding = if signed {
            Encoding::signed_long(0)
        } else {
            Encoding::unsigned_long(0)
        };
        let words = self.read_registers(address, 2)?;
        Ok(register::assemble(&words, encoding)?)
    }

    fn read_ascii_string(&mut self, address: RegisterAddress, count: u16) -> Result<String> {
        let words = self.read_registers(address, count)?;
        Ok(register::decode_ascii(&words))
    }

    fn read_scalar(&mut self, address: RegisterAddress, encoding: Encoding) -> Result<f64> {
        let words = self.read_registers(address, encoding.width.registers() as u16)?;
        Ok(register::decode_scalar(&words, encoding)?)
    }

    fn write_scalar(&mut self, address: RegisterAddress, value: f64, encoding: Encoding) -> Result<()> {
        let words = register::encode_scalar(value, encoding)?;
        let addresses = (address..=RegisterAddress::MAX).take(words.len());
        if addresses.len() < words.len() {
            return Err(DecodeError::AddressOverflow {
                address,
                count: words.len(),
            }
            .into());
        }
        for (address, word) in addresses.zip(words) {
            self.write_register(address, word)?;
        }
        Ok(())
    }
}

impl<C: RegisterClient + ?Sized> RegisterClient for Box<C> {
    fn read_registers(
        &mut self,
        address: RegisterAddress,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        (**self).read_registers(address, count)
    }

    fn write_register(&mut self, address: RegisterAddress, value: u16) -> Result<(), TransportError> {
        (**self).write_register(address, value)
    }
}

/// A composite read as unsigned, for the bit-level decoders.
pub(crate) fn read_u32<C: RegisterClient + ?Sized>(client: &mut C, address: RegisterAddress) -> Result<u32> {
    Ok(client.read_composite(address, false)? as u32)
}
