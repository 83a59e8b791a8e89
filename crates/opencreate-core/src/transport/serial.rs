//! Serial port discovery and acquisition
//!
//! Provides low-level serial port access for robot communication, plus the
//! `loop://` dispatch used to run the transport against an in-process
//! loopback device.

use serialport::{SerialPortInfo, SerialPortType};
use std::collections::HashMap;
#[cfg(target_os = "linux")]
use std::fs;
use std::time::Duration;
use tracing::debug;

use super::device::{LoopbackChannel, SerialChannel, SerialDevice};
use super::{TransportError, LOOPBACK_SCHEME};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    pub name: String,

    /// USB vendor ID (if USB device)
    pub vid: Option<u16>,

    /// USB product ID (if USB device)
    pub pid: Option<u16>,

    /// Product name (if available)
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (vid, pid, product) = match info.port_type {
            SerialPortType::UsbPort(usb) => (Some(usb.vid), Some(usb.pid), usb.product),
            _ => (None, None, None),
        };

        Self {
            name: info.port_name,
            vid,
            pid,
            product,
        }
    }
}

/// Helper used to sort port names so that:
///  - ttyACM* ports come first (sorted numerically by suffix)
///  - then ttyUSB* ports (sorted numerically)
///  - then other ports (sorted by name)
fn port_sort_key(name: &str) -> (u8, usize, String) {
    let basename = name.rsplit('/').next().unwrap_or(name);
    for (rank, prefix) in [(0u8, "ttyACM"), (1u8, "ttyUSB")] {
        if let Some(rest) = basename.strip_prefix(prefix) {
            let num = rest.parse::<usize>().unwrap_or(usize::MAX);
            return (rank, num, basename.to_string());
        }
    }
    (2, 0, basename.to_string())
}

/// List all available serial ports, with /dev fallbacks and deterministic ordering
pub fn list_ports() -> Vec<PortInfo> {
    let mut map: HashMap<String, PortInfo> = HashMap::new();
    for info in serialport::available_ports().unwrap_or_default() {
        let p = PortInfo::from(info);
        map.entry(p.name.clone()).or_insert(p);
    }

    // Linux-only: USB serial adapters sometimes missed by the enumeration API
    #[cfg(target_os = "linux")]
    if let Ok(entries) = fs::read_dir("/dev") {
        for entry in entries.flatten() {
            if let Some(fname) = entry.file_name().to_str() {
                if fname.starts_with("ttyACM") || fname.starts_with("ttyUSB") {
                    let full = format!("/dev/{}", fname);
                    map.entry(full.clone()).or_insert_with(|| PortInfo {
                        name: full,
                        vid: None,
                        pid: None,
                        product: None,
                    });
                }
            }
        }
    }

    let mut v: Vec<PortInfo> = map.into_values().collect();
    v.sort_by_key(|p| port_sort_key(&p.name));
    v
}

/// Acquire the device behind `path`
///
/// `loop://` yields an in-process [`LoopbackChannel`]; anything else is
/// treated as a serial port path and opened 8N1 with no flow control, the
/// configuration the Create 2 link expects.
pub fn open_device(
    path: &str,
    baud_rate: u32,
    timeout: Duration,
) -> Result<Box<dyn SerialDevice>, TransportError> {
    if path.starts_with(LOOPBACK_SCHEME) {
        debug!(path, "opening loopback device");
        return Ok(Box::new(LoopbackChannel::new()));
    }

    let port = serialport::new(path, baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(timeout)
        .open()
        .map_err(|e| TransportError::PortUnavailable(format!("{}: {}", path, e)))?;

    Ok(Box::new(SerialChannel::new(port)))
}

/// Clear the device buffers, discarding stale traffic
pub fn clear_buffers(device: &mut dyn SerialDevice) -> Result<(), TransportError> {
    device.clear_buffers()?;
    Ok(())
}
