pub use anyhow::{anyhow, bail};
pub use log::{debug, error, info, trace, warn};

pub use crate::client::RegisterClient;
pub use crate::error::{DecodeError, Error, Result, TransportError};
pub use crate::register::{self, Encoding, RegisterAddress, Width};
pub use crate::snapshot::{Snapshot, Value};
