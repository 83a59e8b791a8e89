//! Device seam between the transport and the underlying byte channel
//!
//! Transport I/O is written against [`SerialDevice`] so the same code drives
//! a physical serial port or the in-process loopback used for testing.

use serialport::SerialPort;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Abstraction over the byte channel the transport writes frames to
pub trait SerialDevice: Read + Write + Send {
    /// Set the timeout for blocking read operations
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Discard any unread input and unsent output
    fn clear_buffers(&mut self) -> io::Result<()>;

    /// Number of bytes available to read without blocking
    fn bytes_to_read(&mut self) -> io::Result<u32>;
}

/// Physical serial port wrapper implementing [`SerialDevice`]
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Wrap an already-opened serial port
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }
}

impl Read for SerialChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl SerialDevice for SerialChannel {
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.port
            .set_timeout(timeout)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn clear_buffers(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::All)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        self.port
            .bytes_to_read()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

/// In-process loopback device: every byte written becomes readable again,
/// in write order
///
/// Selected with the `loop://` device path. Stands in for a controller that
/// echoes traffic, which is enough to exercise the full transport path in
/// tests without hardware.
pub struct LoopbackChannel {
    buffer: VecDeque<u8>,
}

impl LoopbackChannel {
    /// Create an empty loopback device
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::new(),
        }
    }
}

impl Default for LoopbackChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for LoopbackChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.buffer.is_empty() {
            // Mirrors a serial port read hitting its timeout with no data
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data looped back"));
        }
        let n = buf.len().min(self.buffer.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.buffer.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

impl Write for LoopbackChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend(buf.iter().copied());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialDevice for LoopbackChannel {
    fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }

    fn clear_buffers(&mut self) -> io::Result<()> {
        self.buffer.clear();
        Ok(())
    }

    fn bytes_to_read(&mut self) -> io::Result<u32> {
        Ok(self.buffer.len() as u32)
    }
}
