//! Port lifecycle management and transport I/O
//!
//! Handles the open/close lifecycle of the serial device and the blocking
//! write/read primitives every robot command goes through.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use super::device::SerialDevice;
use super::serial::open_device;
use super::{Frame, TransportError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT};

/// Poll interval while waiting for response bytes
const READ_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Device binding: where the controller lives and how to talk to it
///
/// Immutable for the life of the owning [`CommandPort`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfig {
    /// Device path ("/dev/ttyUSB0", "COM3") or the `loop://` URL
    pub path: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read timeout; reads return whatever arrived once it elapses
    pub timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PortConfig {
    fn validate(&self) -> Result<(), TransportError> {
        if self.path.is_empty() {
            return Err(TransportError::Configuration(
                "device path must not be empty".to_string(),
            ));
        }
        if self.baud_rate == 0 {
            return Err(TransportError::Configuration(
                "baud rate must be positive".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(TransportError::Configuration(
                "read timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Open/closed status of the serial device handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortState {
    /// Device handle not held
    Closed,
    /// Device handle held and usable
    Open,
}

/// Serial command port for a Create 2 compatible controller
///
/// Construction binds the device path, baud rate and read timeout without
/// touching hardware; [`open`](CommandPort::open) acquires the device. The
/// handle is released by [`close`](CommandPort::close), by dropping the
/// port, or when a [`Session`] goes out of scope.
pub struct CommandPort {
    /// Device binding, fixed at construction
    config: PortConfig,
    /// Device handle; `Some` exactly while the port is open
    device: Option<Box<dyn SerialDevice>>,
}

impl CommandPort {
    /// Bind a device path, baud rate and read timeout
    ///
    /// No hardware access happens here. Fails with
    /// [`TransportError::Configuration`] on an empty path, zero baud rate or
    /// zero timeout; malformed input is never silently replaced with a
    /// default.
    pub fn new(
        path: impl Into<String>,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        Self::with_config(PortConfig {
            path: path.into(),
            baud_rate,
            timeout,
        })
    }

    /// Bind from an existing configuration
    pub fn with_config(config: PortConfig) -> Result<Self, TransportError> {
        config.validate()?;
        Ok(Self {
            config,
            device: None,
        })
    }

    /// The device binding this port was constructed with
    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// Current port state
    pub fn state(&self) -> PortState {
        if self.device.is_some() {
            PortState::Open
        } else {
            PortState::Closed
        }
    }

    /// Whether the device handle is currently held
    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Acquire the physical device
    ///
    /// Calling open on an already-open port is not an error: it logs the
    /// condition and leaves the existing handle untouched, so N open calls
    /// perform exactly one physical acquisition. On failure the port stays
    /// closed and the caller may retry later; no retry happens here.
    pub fn open(&mut self) -> Result<(), TransportError> {
        if self.device.is_some() {
            info!(path = %self.config.path, "serial port already open");
            return Ok(());
        }

        let mut device = open_device(&self.config.path, self.config.baud_rate, self.config.timeout)?;

        // Re-assert the binding's timeout on whatever device came back, and
        // discard anything queued before we owned the line
        device.set_timeout(self.config.timeout)?;
        super::serial::clear_buffers(device.as_mut())?;

        self.device = Some(device);
        info!(
            path = %self.config.path,
            baud = self.config.baud_rate,
            "serial connection opened"
        );
        Ok(())
    }

    /// Release the physical device
    ///
    /// Idempotent and infallible: closing a closed port is a no-op, and
    /// device-level release problems are suppressed since cleanup must not
    /// itself fail.
    pub fn close(&mut self) {
        if self.device.take().is_some() {
            debug!(path = %self.config.path, "serial port closed");
        }
    }

    /// Open the port and return a guard that closes it when dropped
    ///
    /// Covers every exit path from the scope, early returns and panics
    /// included. The guard derefs to the port, so write/read go through it
    /// directly.
    pub fn session(&mut self) -> Result<Session<'_>, TransportError> {
        self.open()?;
        Ok(Session { port: self })
    }

    /// Encode and transmit one command
    ///
    /// `None` and `Some(&[])` produce the same single-byte frame. Fails with
    /// [`TransportError::PortNotOpen`] while closed, before touching the
    /// device. Short or failed writes surface as I/O errors and are not
    /// retried: resending a half-delivered frame could corrupt the
    /// controller's command stream.
    pub fn write(&mut self, opcode: u8, args: Option<&[u8]>) -> Result<(), TransportError> {
        let frame = match args {
            Some(args) => Frame::with_args(opcode, args),
            None => Frame::new(opcode),
        };
        self.send(&frame)
    }

    /// Transmit a pre-built frame
    pub fn send(&mut self, frame: &Frame) -> Result<(), TransportError> {
        let device = self.device.as_mut().ok_or(TransportError::PortNotOpen)?;

        let bytes = frame.to_bytes();
        trace!(opcode = frame.opcode, len = bytes.len(), "sending frame");
        device.write_all(&bytes)?;
        device.flush()?;
        Ok(())
    }

    /// Read up to `num_bytes` response bytes
    ///
    /// Blocks until `num_bytes` have arrived or the configured timeout
    /// elapses, whichever comes first. A short return is a normal outcome,
    /// not an error; callers decide what an incomplete response means by
    /// inspecting the length. Fails with [`TransportError::PortNotOpen`]
    /// while closed.
    pub fn read(&mut self, num_bytes: usize) -> Result<Vec<u8>, TransportError> {
        let timeout = self.config.timeout;
        let device = self.device.as_mut().ok_or(TransportError::PortNotOpen)?;

        let mut response = Vec::with_capacity(num_bytes);
        let mut buffer = [0u8; 256];
        let start = Instant::now();

        while response.len() < num_bytes {
            if start.elapsed() > timeout {
                debug!(
                    got = response.len(),
                    wanted = num_bytes,
                    "read timeout, returning partial data"
                );
                break;
            }

            let available = device.bytes_to_read()? as usize;
            if available == 0 {
                std::thread::sleep(READ_POLL_INTERVAL);
                continue;
            }

            let want = (num_bytes - response.len()).min(buffer.len()).min(available);
            match device.read(&mut buffer[..want]) {
                // A device vanishing mid-read looks the same to callers as a
                // timeout: fewer bytes than requested
                Ok(0) => break,
                Ok(n) => response.extend_from_slice(&buffer[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::TimedOut
                        || e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        trace!(len = response.len(), "read complete");
        Ok(response)
    }
}

impl std::fmt::Debug for CommandPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPort")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl Drop for CommandPort {
    fn drop(&mut self) {
        self.close();
    }
}

/// Scoped-use guard over an open [`CommandPort`]
///
/// Created by [`CommandPort::session`]; closes the port on drop.
pub struct Session<'a> {
    port: &'a mut CommandPort,
}

impl Deref for Session<'_> {
    type Target = CommandPort;

    fn deref(&self) -> &CommandPort {
        self.port
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut CommandPort {
        self.port
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.port.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn loopback_port() -> CommandPort {
        CommandPort::new("loop://", DEFAULT_BAUD_RATE, Duration::from_millis(50))
            .expect("valid config")
    }

    #[test]
    fn test_construction_does_not_open() {
        let port = loopback_port();
        assert_eq!(port.state(), PortState::Closed);
        assert!(!port.is_open());
    }

    #[test]
    fn test_empty_path_rejected() {
        let err = CommandPort::new("", DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
    }

    #[test]
    fn test_zero_baud_rejected() {
        let err = CommandPort::new("loop://", 0, DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = CommandPort::new("loop://", DEFAULT_BAUD_RATE, Duration::ZERO).unwrap_err();
        assert!(matches!(err, TransportError::Configuration(_)));
    }

    #[test]
    fn test_write_on_closed_port() {
        let mut port = loopback_port();
        let err = port.write(128, None).unwrap_err();
        assert!(matches!(err, TransportError::PortNotOpen));
    }

    #[test]
    fn test_read_on_closed_port() {
        let mut port = loopback_port();
        let err = port.read(1).unwrap_err();
        assert!(matches!(err, TransportError::PortNotOpen));
    }

    #[test]
    fn test_open_close_cycle() {
        let mut port = loopback_port();
        port.open().unwrap();
        assert_eq!(port.state(), PortState::Open);
        port.close();
        assert_eq!(port.state(), PortState::Closed);
    }

    #[test]
    fn test_double_open_keeps_existing_handle() {
        let mut port = loopback_port();
        port.open().unwrap();

        // A byte pending on the device must survive a second open(): if
        // open() re-acquired, the fresh handle would have dropped it
        port.write(128, None).unwrap();
        port.open().unwrap();
        assert!(port.is_open());
        assert_eq!(port.read(1).unwrap(), vec![0x80]);
    }

    #[test]
    fn test_double_close_is_noop() {
        let mut port = loopback_port();
        port.close();
        port.close();
        assert_eq!(port.state(), PortState::Closed);
    }

    #[test]
    fn test_session_closes_on_scope_exit() {
        let mut port = loopback_port();
        {
            let mut session = port.session().unwrap();
            assert!(session.is_open());
            session.write(128, None).unwrap();
        }
        assert!(!port.is_open());
    }

    #[test]
    fn test_config_accessor() {
        let port = loopback_port();
        assert_eq!(port.config().baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(port.config().path, "loop://");
    }
}
