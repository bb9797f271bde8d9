//! UART transport backed by the `serialport` crate.

use super::error::PortError;
use super::traits::{CharFraming, Transport};
use std::io::{ErrorKind, Read};
use std::time::Duration;

/// Read timeout used when the caller does not pick one. Short enough that a
/// single-byte read stays well inside a typical poll budget.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Hardware transport for a local serial device.
pub struct SerialTransport {
    path: String,
    framing: CharFraming,
    read_timeout: Duration,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialTransport {
    /// Create a transport for `path` (e.g. "/dev/ttyUSB0" or "COM3").
    /// Nothing is opened until the engine asks for it.
    pub fn new(path: impl Into<String>, framing: CharFraming) -> Self {
        Self {
            path: path.into(),
            framing,
            read_timeout: DEFAULT_READ_TIMEOUT,
            port: None,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Baud rate reported by the driver, when open.
    pub fn baud_rate(&self) -> Option<u32> {
        self.port.as_ref().and_then(|p| p.baud_rate().ok())
    }
}

impl Transport for SerialTransport {
    fn open(&mut self, speed: u32) -> Result<(), PortError> {
        self.port = None;
        let port = serialport::new(&self.path, speed)
            .data_bits(self.framing.data_bits.into())
            .flow_control(self.framing.flow_control.into())
            .parity(self.framing.parity.into())
            .stop_bits(self.framing.stop_bits.into())
            .timeout(self.read_timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(self.path.as_str()),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        self.port = None;
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn read(&mut self) -> Result<Option<u8>, PortError> {
        let port = self.port.as_mut().ok_or(PortError::NotOpen)?;
        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(e) => Err(PortError::Io(e)),
        }
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("baud_rate", &self.baud_rate())
            .finish()
    }
}
