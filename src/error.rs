use crate::register::RegisterAddress;
use thiserror::Error;

/// Failures below the decoding layer: the link, the framing, or a silent device.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no response reading register {address}")]
    NoResponse { address: RegisterAddress },

    #[error("i/o error on link: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("device returned exception {code:#04x} for function {function:#04x}")]
    Exception { function: u8, code: u8 },

    #[error("malformed reply: {0}")]
    Frame(String),
}

/// Programming errors in a register table, or values that cannot be encoded.
/// None of these are worth retrying.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("encoding spans {expected} registers but {actual} were supplied")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("{len} names do not fit in {max} slots")]
    TooManyNames { len: usize, max: usize },

    #[error("{value} does not fit in a register")]
    OutOfRange { value: f64 },

    #[error("{count} registers from {address} run past the register space")]
    AddressOverflow { address: RegisterAddress, count: usize },

    #[error("no field named {0}")]
    UnknownField(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Creates an anyhow error with the current file and line number
#[macro_export]
macro_rules! file_error {
    ($($arg:tt)*) => {
        anyhow::anyhow!(
            "[{}:{}] {}",
            std::path::Path::new(file!())
                .file_name()
                .map(|name| name.to_string_lossy())
                .unwrap_or_default(),
            line!(),
            format!($($arg)*)
        )
    };
}
