use crate::error::DecodeError;

/// Offset into a device's holding register space.
pub type RegisterAddress = u16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    Single,
    Double,
}

impl Width {
    pub const fn registers(self) -> usize {
        match self {
            Width::Single => 1,
            Width::Double => 2,
        }
    }
}

/// How a run of raw register words becomes a number.
///
/// Double width values are assembled high word first, then sign-interpreted,
/// then divided by `10^decimals`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Encoding {
    pub width: Width,
    pub signed: bool,
    pub decimals: u8,
}

impl Encoding {
    pub const fn unsigned(decimals: u8) -> Self {
        Self {
            width: Width::Single,
            signed: false,
            decimals,
        }
    }

    pub const fn signed(decimals: u8) -> Self {
        Self {
            width: Width::Single,
            signed: true,
            decimals,
        }
    }

    pub const fn unsigned_long(decimals: u8) -> Self {
        Self {
            width: Width::Double,
            signed: false,
            decimals,
        }
    }

    pub const fn signed_long(decimals: u8) -> Self {
        Self {
            width: Width::Double,
            signed: true,
            decimals,
        }
    }

    pub fn divisor(&self) -> f64 {
        10f64.powi(i32::from(self.decimals))
    }

    fn range(&self) -> (i64, i64) {
        match (self.width, self.signed) {
            (Width::Single, false) => (0, i64::from(u16::MAX)),
            (Width::Single, true) => (i64::from(i16::MIN), i64::from(i16::MAX)),
            (Width::Double, false) => (0, i64::from(u32::MAX)),
            (Width::Double, true) => (i64::from(i32::MIN), i64::from(i32::MAX)),
        }
    }
}

/// Assembles raw words into an unscaled integer.
pub fn assemble(raw: &[u16], encoding: Encoding) -> Result<i64, DecodeError> {
    let expected = encoding.width.registers();
    if raw.len() != expected {
        return Err(DecodeError::WidthMismatch {
            expected,
            actual: raw.len(),
        });
    }

    let value = match encoding.width {
        Width::Single if encoding.signed => i64::from(raw[0] as i16),
        Width::Single => i64::from(raw[0]),
        Width::Double => {
            let composite = (u32::from(raw[0]) << 16) | u32::from(raw[1]);
            if encoding.signed {
                i64::from(composite as i32)
            } else {
                i64::from(composite)
            }
        }
    };

    Ok(value)
}

pub fn decode_scalar(raw: &[u16], encoding: Encoding) -> Result<f64, DecodeError> {
    let value = assemble(raw, encoding)?;
    if encoding.decimals == 0 {
        Ok(value as f64)
    } else {
        Ok(value as f64 / encoding.divisor())
    }
}

/// Inverse of [`decode_scalar`], for writing settings back to a device.
pub fn encode_scalar(value: f64, encoding: Encoding) -> Result<Vec<u16>, DecodeError> {
    let scaled = (value * encoding.divisor()).round();
    let (min, max) = encoding.range();
    if !scaled.is_finite() || scaled < min as f64 || scaled > max as f64 {
        return Err(DecodeError::OutOfRange { value });
    }

    let raw = scaled as i64;
    let words = match encoding.width {
        Width::Single => vec![raw as u16],
        Width::Double => {
            let composite = raw as u32;
            vec![(composite >> 16) as u16, composite as u16]
        }
    };

    Ok(words)
}

/// Formats bits 16-23, 8-15 and 0-7 of a composite as `major.minor.build`.
pub fn decode_version(composite: u32) -> String {
    format!(
        "{}.{}.{}",
        (composite >> 16) & 0xFF,
        (composite >> 8) & 0xFF,
        composite & 0xFF
    )
}

pub fn decode_serial(composite: u32) -> String {
    format!("{:08x}", composite)
}

/// Two characters per register, high byte first. Padding (NUL or space) is trimmed.
pub fn decode_ascii(words: &[u16]) -> String {
    let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();

    String::from_utf8_lossy(&bytes)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

/// Splits a register into its (high, low) bytes.
pub fn split_word(word: u16) -> (u8, u8) {
    ((word >> 8) as u8, (word & 0xFF) as u8)
}
