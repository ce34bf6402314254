use crate::prelude::*;

use nom_derive::{Nom, Parse};
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

const READ_HOLDING_REGISTERS: u8 = 0x03;
const WRITE_SINGLE_REGISTER: u8 = 0x06;
const EXCEPTION_FLAG: u8 = 0x80;

/// Largest register count one read request may ask for.
pub const MAX_READ_COUNT: u16 = 125;

/// CRC-16/MODBUS, low byte first as it goes on the wire.
pub fn checksum(data: &[u8]) -> [u8; 2] {
    crc16::State::<crc16::MODBUS>::calculate(data).to_le_bytes()
}

fn with_checksum(mut frame: Vec<u8>) -> Vec<u8> {
    let crc = checksum(&frame);
    frame.extend_from_slice(&crc);
    frame
}

pub fn read_request(slave: u8, address: RegisterAddress, count: u16) -> Vec<u8> {
    let mut frame = vec![slave, READ_HOLDING_REGISTERS];
    frame.extend_from_slice(&address.to_be_bytes());
    frame.extend_from_slice(&count.to_be_bytes());
    with_checksum(frame)
}

pub fn write_request(slave: u8, address: RegisterAddress, value: u16) -> Vec<u8> {
    let mut frame = vec![slave, WRITE_SINGLE_REGISTER];
    frame.extend_from_slice(&address.to_be_bytes());
    frame.extend_from_slice(&value.to_be_bytes());
    with_checksum(frame)
}

// Replies {{{
#[derive(Debug, PartialEq, Nom)]
#[nom(BigEndian)]
struct ReadReply {
    slave: u8,
    function: u8,
    byte_count: u8,
    #[nom(Count = "byte_count as usize / 2")]
    values: Vec<u16>,
}

#[derive(Debug, PartialEq, Nom)]
#[nom(BigEndian)]
struct WriteReply {
    slave: u8,
    function: u8,
    address: u16,
    value: u16,
}
// }}}

/// A byte stream a Modbus master can own.
pub trait Port: Read + Write {
    /// Discards whatever has been received but not read yet.
    fn clear_input(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Port for Box<dyn SerialPort> {
    fn clear_input(&mut self) -> std::io::Result<()> {
        (**self).clear(ClearBuffer::Input)?;
        Ok(())
    }
}

/// Modbus RTU master over any byte stream, normally a serial port.
pub struct RtuClient<T> {
    port: T,
    slave: u8,
}

impl RtuClient<Box<dyn SerialPort>> {
    /// Opens `path` at 8N1 with a fixed read timeout.
    pub fn open(
        path: &str,
        slave: u8,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        info!("opening {} at {} baud for slave {}", path, baud_rate, slave);

        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(timeout)
            .open()?;

        Ok(Self::new(port, slave))
    }
}

impl<T: Port> RtuClient<T> {
    pub fn new(port: T, slave: u8) -> Self {
        Self { port, slave }
    }

    pub fn slave(&self) -> u8 {
        self.slave
    }

    pub fn into_inner(self) -> T {
        self.port
    }

    /// Sends one request and collects its reply, minus the CRC.
    ///
    /// `tail` gives the number of bytes that follow the first three, derived
    /// from the third byte (the byte count, for reads).
    fn transact(
        &mut self,
        address: RegisterAddress,
        request: &[u8],
        tail: impl Fn(u8) -> usize,
    ) -> Result<Vec<u8>, TransportError> {
        let function = request[1];

        // a reply that straggled in after an earlier timeout must not be
        // taken for the start of this one
        self.port.clear_input()?;

        trace!("tx {:02x?}", request);
        self.port.write_all(request)?;
        self.port.flush()?;

        let mut frame = vec![0u8; 3];
        self.receive(address, &mut frame)?;

        let remaining = if frame[1] == function | EXCEPTION_FLAG {
            2
        } else {
            tail(frame[2]) + 2
        };
        let mut rest = vec![0u8; remaining];
        self.receive(address, &mut rest)?;
        frame.extend_from_slice(&rest);
        trace!("rx {:02x?}", frame);

        let (body, crc) = frame.split_at(frame.len() - 2);
        if checksum(body) != crc {
            return Err(TransportError::Frame(format!(
                "checksum mismatch, got {:02x?} expected {:02x?}",
                crc,
                checksum(body)
            )));
        }

        if body[0] != self.slave {
            return Err(TransportError::Frame(format!(
                "reply from slave {} while talking to {}",
                body[0], self.slave
            )));
        }

        if body[1] == function | EXCEPTION_FLAG {
            return Err(TransportError::Exception {
                function,
                code: body[2],
            });
        }

        if body[1] != function {
            return Err(TransportError::Frame(format!(
                "reply for function {:#04x} to request {:#04x}",
                body[1], function
            )));
        }

        Ok(body.to_vec())
    }

    fn receive(&mut self, address: RegisterAddress, buf: &mut [u8]) -> Result<(), TransportError> {
        self.port.read_exact(buf).map_err(|err| match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::UnexpectedEof => {
                TransportError::NoResponse { address }
            }
            _ => TransportError::Io(err),
        })
    }

    fn read_block(&mut self, address: RegisterAddress, count: u16) -> Result<Vec<u16>, TransportError> {
        let request = read_request(self.slave, address, count);
        let body = self.transact(address, &request, |byte_count| usize::from(byte_count))?;

        let (_, reply) = ReadReply::parse(&body[..])
            .map_err(|err| TransportError::Frame(format!("unparseable read reply: {}", err)))?;

        if reply.values.len() != usize::from(count) {
            return Err(TransportError::Frame(format!(
                "asked for {} registers at {}, got {}",
                count,
                address,
                reply.values.len()
            )));
        }

        Ok(reply.values)
    }
}

impl<T: Port> RegisterClient for RtuClient<T> {
    fn read_registers(
        &mut self,
        address: RegisterAddress,
        count: u16,
    ) -> Result<Vec<u16>, TransportError> {
        let mut values = Vec::with_capacity(usize::from(count));
        let mut offset = 0;
        while offset < count {
            let chunk = (count - offset).min(MAX_READ_COUNT);
            values.extend(self.read_block(address + offset, chunk)?);
            offset += chunk;
        }
        Ok(values)
    }

    fn write_register(&mut self, address: RegisterAddress, value: u16) -> Result<(), TransportError> {
        let request = write_request(self.slave, address, value);
        let body = self.transact(address, &request, |_| 3)?;

        let (_, reply) = WriteReply::parse(&body[..])
            .map_err(|err| TransportError::Frame(format!("unparseable write reply: {}", err)))?;

        if reply.address != address || reply.value != value {
            return Err(TransportError::Frame(format!(
                "write echo {}={} does not match {}={}",
                reply.address, reply.value, address, value
            )));
        }

        Ok(())
    }
}
