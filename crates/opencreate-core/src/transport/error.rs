//! Transport errors

use thiserror::Error;

/// Errors that can occur while configuring or driving the serial transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// Rejected at construction: empty device path, zero baud rate or zero
    /// timeout. Not recoverable by retry.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The physical device could not be acquired on open. The caller may
    /// retry open() later (e.g. after the device is reconnected).
    #[error("serial port unavailable: {0}")]
    PortUnavailable(String),

    /// Write or read was attempted while the port is closed.
    #[error("port not open: call open() first")]
    PortNotOpen,

    /// Device-level I/O failure after the port was confirmed open, such as
    /// a disconnect mid-write. Never retried here: retrying a half-sent
    /// command frame could corrupt the controller's protocol state.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}
