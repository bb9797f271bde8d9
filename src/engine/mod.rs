//! The Port engine and its parts.
//!
//! - `framing`: CR/LF line assembly over a bounded buffer
//! - `lifecycle`: open/close, reopen backoff, speed-change reconnects
//! - `clock`: millisecond time sources
//! - `port`: the `Port` type combining them behind `listen(budget_ms)`

pub mod clock;
pub mod framing;
pub mod lifecycle;
pub mod port;

pub use clock::{Clock, ManualClock, SystemClock};
pub use framing::{LineBuffer, LineEvent, OverflowPolicy, PORT_BUFFER_SIZE};
pub use lifecycle::{Lifecycle, Maintenance, DEFAULT_BACKOFF_MS};
pub use port::{Port, PortSettings, DEFAULT_PORT_SPEED, MAX_PORT_NAME_LEN};
