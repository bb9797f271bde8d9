//! Transport layer.
//!
//! The engine reaches the wire only through the [`Transport`] trait, so a
//! UART driver and the scripted [`MockTransport`] are interchangeable.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{Call, MockTransport};
pub use sync_port::SerialTransport;
pub use traits::*;
