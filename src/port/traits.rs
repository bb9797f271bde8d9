//! Capability sets at the two edges of the engine.
//!
//! [`Transport`] is what a driver must supply (hardware UART, test double).
//! [`PortListener`] is what a consumer implements to receive assembled lines.

use super::error::PortError;
use serde::{Deserialize, Serialize};

/// Raw byte access to an underlying line.
///
/// The engine only ever asks for one byte at a time and expects `read` to
/// return quickly; a blocking `read` stretches every poll cycle past its
/// budget.
pub trait Transport: std::fmt::Debug {
    /// Attempt to establish the connection at the given speed.
    ///
    /// The engine does not trust the return value alone: after the call it
    /// consults [`is_open`](Self::is_open) to decide whether the port is up.
    /// An `Err` is only used for logging.
    fn open(&mut self, speed: u32) -> Result<(), PortError>;

    /// Release the connection. Must be idempotent.
    fn close(&mut self);

    /// Whether the connection is currently established.
    fn is_open(&self) -> bool;

    /// Read a single byte.
    ///
    /// - `Ok(Some(byte))`: a byte was available.
    /// - `Ok(None)`: nothing pending right now.
    /// - `Err(_)`: the transport faulted; the engine will close it.
    fn read(&mut self) -> Result<Option<u8>, PortError>;
}

/// Receives notifications from a [`Port`](crate::engine::Port).
///
/// All callbacks run synchronously inside [`Port::listen`](crate::engine::Port::listen),
/// so they must not block. Methods take `&self`; listeners that need to
/// record state use interior mutability.
///
/// The buffer handed to every callback holds the bytes accumulated since the
/// last terminator, without the terminator and without the trailing NUL.
pub trait PortListener {
    /// Legacy partial-line notification carrying only the buffer.
    fn on_partial(&self, _buffer: &[u8]) {}

    /// Partial-line notification with an explicit length.
    fn on_partial_update(&self, _buffer: &[u8], _len: usize) {}

    /// A complete line has been read.
    fn on_line_complete(&self, line: &[u8]);
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    #[default]
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Character framing for a UART line. Speed is not part of it: the engine
/// owns the speed and hands it to [`Transport::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharFraming {
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
}
