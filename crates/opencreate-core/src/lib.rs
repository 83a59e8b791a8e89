//! # OpenCreate Core Library
//!
//! Core functionality for the OpenCreate robot control software.
//!
//! This library provides the serial command transport used to talk to an
//! iRobot Create 2 compatible differential-drive controller:
//!
//! - Port lifecycle management (open/close, state tracking, scoped sessions)
//! - Command frame encoding (opcode + argument bytes)
//! - Blocking write/read primitives with a configurable read timeout
//!
//! Command semantics (which opcode does what, how sensor packets decode) are
//! deliberately out of scope; higher layers own them and drive everything
//! through [`transport::CommandPort`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use opencreate_core::transport::{CommandPort, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};
//!
//! let mut port = CommandPort::new("/dev/ttyUSB0", DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT)?;
//! port.open()?;
//!
//! // Opcode 128 (start), no arguments
//! port.write(128, None)?;
//!
//! // Opcode 137 (drive): velocity 200 mm/s, straight
//! port.write(137, Some(&[0x00, 0xC8, 0x80, 0x00]))?;
//!
//! let packet = port.read(10)?;
//! port.close();
//! ```

#![warn(missing_docs)]

pub mod transport;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::transport::{
        CommandPort, Frame, FrameBuilder, PortConfig, PortState, Session, TransportError,
    };
}
