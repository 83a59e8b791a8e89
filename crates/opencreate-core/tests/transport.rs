//! End-to-end transport tests against the `loop://` device.
//!
//! The loopback echoes every transmitted byte, so a write followed by a read
//! observes exactly what went over the wire.

use opencreate_core::transport::{
    CommandPort, Frame, FrameBuilder, PortState, TransportError, DEFAULT_BAUD_RATE,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

const TEST_TIMEOUT: Duration = Duration::from_millis(50);

fn open_loopback() -> CommandPort {
    let mut port =
        CommandPort::new("loop://", DEFAULT_BAUD_RATE, TEST_TIMEOUT).expect("valid config");
    port.open().expect("loopback open cannot fail");
    port
}

#[test]
fn start_command_sends_single_byte() {
    let mut port = open_loopback();

    // Opcode 128 (start) has no arguments
    port.write(128, None).unwrap();
    let echoed = port.read(1).unwrap();
    assert_eq!(echoed, vec![0x80]);
}

#[test]
fn drive_command_sends_five_bytes() {
    let mut port = open_loopback();

    port.write(137, Some(&[0x00, 0xC8, 0x00, 0x00])).unwrap();
    let echoed = port.read(5).unwrap();
    assert_eq!(echoed, vec![0x89, 0x00, 0xC8, 0x00, 0x00]);
}

#[test]
fn built_frame_matches_hand_packed_args() {
    let mut port = open_loopback();

    let built = FrameBuilder::new(137).i16_be(200).i16_be(0).build();
    assert_eq!(built, Frame::with_args(137, &[0x00, 0xC8, 0x00, 0x00]));

    port.send(&built).unwrap();
    assert_eq!(port.read(5).unwrap(), vec![0x89, 0x00, 0xC8, 0x00, 0x00]);
}

#[test]
fn none_and_empty_args_put_the_same_byte_on_the_wire() {
    let mut port = open_loopback();

    port.write(173, None).unwrap();
    let a = port.read(1).unwrap();

    port.write(173, Some(&[])).unwrap();
    let b = port.read(1).unwrap();

    assert_eq!(a, b);
    assert_eq!(a, vec![173]);
}

#[test]
fn short_read_returns_partial_data_not_error() {
    let mut port = open_loopback();

    // Only 4 bytes ever arrive; asking for 10 must return those 4 once the
    // timeout elapses
    port.write(142, Some(&[0x02, 0x1D, 0x0D])).unwrap();
    let data = port.read(10).unwrap();
    assert_eq!(data, vec![142, 0x02, 0x1D, 0x0D]);
}

#[test]
fn read_zero_bytes_is_empty() {
    let mut port = open_loopback();
    port.write(128, None).unwrap();
    assert_eq!(port.read(0).unwrap(), Vec::<u8>::new());
}

#[test]
fn sequential_commands_arrive_in_order() {
    let mut port = open_loopback();

    port.write(128, None).unwrap();
    port.write(131, None).unwrap();
    port.write(137, Some(&[0x00, 0xC8, 0x80, 0x00])).unwrap();

    let all = port.read(7).unwrap();
    assert_eq!(all, vec![128, 131, 137, 0x00, 0xC8, 0x80, 0x00]);
}

#[test]
fn closed_port_refuses_io() {
    let mut port =
        CommandPort::new("loop://", DEFAULT_BAUD_RATE, TEST_TIMEOUT).expect("valid config");

    assert!(matches!(
        port.write(128, None),
        Err(TransportError::PortNotOpen)
    ));
    assert!(matches!(port.read(1), Err(TransportError::PortNotOpen)));
}

#[test]
fn reopen_after_close_starts_clean() {
    let mut port = open_loopback();
    port.write(128, None).unwrap();
    port.close();

    port.open().unwrap();
    // Nothing pending on the fresh device; a read just times out empty
    assert_eq!(port.read(1).unwrap(), Vec::<u8>::new());
}

#[test]
fn drop_releases_the_port() {
    let mut port = open_loopback();
    assert_eq!(port.state(), PortState::Open);
    drop(port);

    port = open_loopback();
    assert!(port.is_open());
}

#[test]
fn session_covers_early_exit() {
    fn issue_commands(port: &mut CommandPort, fail: bool) -> Result<(), TransportError> {
        let mut session = port.session()?;
        session.write(128, None)?;
        if fail {
            // Early return: the guard must still close the port
            return Err(TransportError::PortNotOpen);
        }
        session.write(131, None)?;
        Ok(())
    }

    let mut port =
        CommandPort::new("loop://", DEFAULT_BAUD_RATE, TEST_TIMEOUT).expect("valid config");

    assert!(issue_commands(&mut port, true).is_err());
    assert_eq!(port.state(), PortState::Closed);

    issue_commands(&mut port, false).unwrap();
    assert_eq!(port.state(), PortState::Closed);
}

#[test]
fn configuration_errors_name_the_offending_field() {
    let err = CommandPort::new("", DEFAULT_BAUD_RATE, TEST_TIMEOUT).unwrap_err();
    assert!(err.to_string().contains("path"));

    let err = CommandPort::new("loop://", 0, TEST_TIMEOUT).unwrap_err();
    assert!(err.to_string().contains("baud"));

    let err = CommandPort::new("loop://", DEFAULT_BAUD_RATE, Duration::ZERO).unwrap_err();
    assert!(err.to_string().contains("timeout"));
}
