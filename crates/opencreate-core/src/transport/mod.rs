//! Serial Command Transport
//!
//! Implements the serial command transport for Create 2 compatible robot
//! controllers: raw opcode+argument frames over a serial link, with explicit
//! port lifecycle management and blocking read/write primitives.
//!
//! The wire format is deliberately bare: one opcode byte followed by the
//! argument bytes, no delimiters, no length prefix, no checksum.

pub mod device;
mod error;
mod frame;
mod port;
pub mod serial;

pub use device::{LoopbackChannel, SerialChannel, SerialDevice};
pub use error::TransportError;
pub use frame::{Frame, FrameBuilder};
pub use port::{CommandPort, PortConfig, PortState, Session};
pub use serial::{clear_buffers, list_ports, open_device, PortInfo};

use std::time::Duration;

/// Default baud rate for the Create 2 serial link
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default read timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Device path scheme that selects the in-process loopback device
/// instead of a physical serial port
pub const LOOPBACK_SCHEME: &str = "loop://";
