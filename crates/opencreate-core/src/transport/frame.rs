//! Command frame encoding
//!
//! Implements the raw command frame format understood by the controller:
//! - 1 byte: Opcode
//! - N bytes: Arguments, in caller-given order
//!
//! There is no length prefix, no terminator and no checksum; the controller
//! derives the argument count from the opcode itself.

use byteorder::{BigEndian, ByteOrder};

/// A command frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command opcode
    pub opcode: u8,
    /// Argument bytes, transmitted after the opcode in this order
    pub args: Vec<u8>,
}

impl Frame {
    /// Create a frame with no arguments
    pub fn new(opcode: u8) -> Self {
        Self {
            opcode,
            args: Vec::new(),
        }
    }

    /// Create a frame with the given argument bytes
    pub fn with_args(opcode: u8, args: &[u8]) -> Self {
        Self {
            opcode,
            args: args.to_vec(),
        }
    }

    /// Encode the frame to the raw bytes sent over the wire
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.args.len());
        bytes.push(self.opcode);
        bytes.extend_from_slice(&self.args);
        bytes
    }

    /// Total encoded size in bytes
    pub fn encoded_size(&self) -> usize {
        1 + self.args.len()
    }
}

/// Builder for frames whose opcodes take multi-byte arguments
///
/// Drive-class opcodes take 16-bit big-endian arguments; the builder packs
/// them so callers don't split bytes by hand.
pub struct FrameBuilder {
    opcode: u8,
    args: Vec<u8>,
}

impl FrameBuilder {
    /// Start a frame for the given opcode
    pub fn new(opcode: u8) -> Self {
        Self {
            opcode,
            args: Vec::new(),
        }
    }

    /// Add a single argument byte
    pub fn byte(mut self, b: u8) -> Self {
        self.args.push(b);
        self
    }

    /// Add an unsigned 16-bit argument (big-endian)
    pub fn u16_be(mut self, value: u16) -> Self {
        let mut bytes = [0u8; 2];
        BigEndian::write_u16(&mut bytes, value);
        self.args.extend_from_slice(&bytes);
        self
    }

    /// Add a signed 16-bit argument (big-endian)
    pub fn i16_be(mut self, value: i16) -> Self {
        let mut bytes = [0u8; 2];
        BigEndian::write_i16(&mut bytes, value);
        self.args.extend_from_slice(&bytes);
        self
    }

    /// Add raw argument bytes
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.args.extend_from_slice(data);
        self
    }

    /// Build the frame
    pub fn build(self) -> Frame {
        Frame {
            opcode: self.opcode,
            args: self.args,
        }
    }
}
