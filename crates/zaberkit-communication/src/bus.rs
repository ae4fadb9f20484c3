//! Shared serial bus for a device daisy-chain
//!
//! One physical serial connection serves every device on the chain. The
//! [`Bus`] owns that connection exclusively and serializes access to it:
//! a reentrant lock guarantees at most one in-flight write-then-read
//! transaction on the wire at any instant, while still letting a single
//! caller compose several transactions (homing-check-then-home) without
//! releasing the bus to an interleaved caller.
//!
//! Also provides serial port enumeration and the low-level port seam used
//! to substitute a scripted double in tests.

use crate::protocol::REPLY_MARKER;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::RefCell;
use std::io::{self, Read, Write};
use zaberkit_core::{ConnectionError, ConnectionParams, Result};

/// Trait for serial port I/O operations
pub trait ChainPort: Read + Write + Send {}
impl<T: Read + Write + Send> ChainPort for T {}

/// Guard holding the bus across several transactions
///
/// Dropping the guard releases the bus to other callers. The lock is
/// reentrant, so transactions issued while a guard is held do not deadlock.
pub type BusGuard<'a> = ReentrantMutexGuard<'a, RefCell<Box<dyn ChainPort>>>;

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,
    /// Port description (e.g., "USB Serial Port")
    pub description: String,
    /// Manufacturer name if available
    pub manufacturer: Option<String>,
    /// Serial number if available
    pub serial_number: Option<String>,
}

/// List available serial ports on the system
///
/// Filters to port names a controller chain can plausibly sit on:
/// - Windows: COM*
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*, /dev/ttyS*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    match serialport::available_ports() {
        Ok(ports) => Ok(ports
            .iter()
            .filter(|port| is_chain_candidate(&port.port_name))
            .map(|port| {
                let (description, manufacturer, serial_number) = match &port.port_type {
                    serialport::SerialPortType::UsbPort(usb) => (
                        format!(
                            "USB {} {}",
                            usb.manufacturer.as_deref().unwrap_or("Device"),
                            usb.product.as_deref().unwrap_or("Serial Port")
                        ),
                        usb.manufacturer.clone(),
                        usb.serial_number.clone(),
                    ),
                    serialport::SerialPortType::BluetoothPort => {
                        ("Bluetooth Serial".to_string(), None, None)
                    }
                    serialport::SerialPortType::PciPort => ("PCI Serial".to_string(), None, None),
                    _ => ("Serial Port".to_string(), None, None),
                };
                SerialPortInfo {
                    port_name: port.port_name.clone(),
                    description,
                    manufacturer,
                    serial_number,
                }
            })
            .collect()),
        Err(e) => {
            tracing::error!("Failed to enumerate serial ports: {}", e);
            Err(ConnectionError::SerialError {
                reason: format!("failed to enumerate ports: {}", e),
            }
            .into())
        }
    }
}

fn is_chain_candidate(port_name: &str) -> bool {
    if port_name.starts_with("COM") && port_name[3..].chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/ttyS")
    {
        return true;
    }
    if port_name.starts_with("/dev/cu.usbserial-") || port_name.starts_with("/dev/cu.usbmodem") {
        return true;
    }
    false
}

/// The shared bus behind all logical devices on one chain
///
/// Opened once at startup with a liveness probe and torn down on drop.
/// Logical devices hold it through an `Arc` and never see the port
/// directly.
pub struct Bus {
    port: ReentrantMutex<RefCell<Box<dyn ChainPort>>>,
    port_name: String,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("port_name", &self.port_name)
            .finish_non_exhaustive()
    }
}

impl Bus {
    /// Open the physical serial port and probe the chain
    ///
    /// The port is opened 8N1 with no flow control and the read timeout
    /// from `params`. On success every byte sequence the probe elicited
    /// came from a protocol-speaking device; otherwise the port is not a
    /// device chain and construction aborts with
    /// [`ConnectionError::NotADevice`].
    pub fn open(params: &ConnectionParams) -> Result<Self> {
        params.validate()?;

        let builder = serialport::new(&params.port, params.baud_rate)
            .timeout(params.timeout())
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None);

        match builder.open() {
            Ok(port) => Self::attach(Box::new(port), &params.port),
            Err(e) => {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                Err(ConnectionError::FailedToOpen {
                    port: params.port.clone(),
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }

    /// Attach to an already-open port and probe the chain
    ///
    /// This is the seam tests use to substitute a scripted port double;
    /// the probe still runs.
    pub fn attach(port: Box<dyn ChainPort>, port_name: &str) -> Result<Self> {
        let bus = Self {
            port: ReentrantMutex::new(RefCell::new(port)),
            port_name: port_name.to_string(),
        };
        bus.probe()?;
        Ok(bus)
    }

    /// The name of the port this bus is attached to
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Liveness probe: a bare `/` broadcast elicits one reply per device
    ///
    /// Every device on the chain answers the empty command without doing
    /// anything else, which makes it the least innocent probe available.
    /// At least one well-formed line must come back and every line must
    /// start with the frame marker.
    fn probe(&self) -> Result<()> {
        let guard = self.port.lock();
        let mut port = guard.borrow_mut();
        port.write_all(b"/\n").map_err(io_to_serial)?;

        let mut lines = Vec::new();
        loop {
            let line = read_line(&mut **port)?;
            if line.is_empty() {
                break;
            }
            lines.push(line);
        }

        if lines.is_empty() || lines.iter().any(|l| l.first() != Some(&REPLY_MARKER)) {
            tracing::warn!(
                "'{}' failed the chain liveness probe ({} line(s) received)",
                self.port_name,
                lines.len()
            );
            return Err(ConnectionError::NotADevice {
                port: self.port_name.clone(),
            }
            .into());
        }
        tracing::debug!(
            "'{}' answered the liveness probe with {} device(s)",
            self.port_name,
            lines.len()
        );
        Ok(())
    }

    /// One write-then-read round trip on the wire
    ///
    /// Acquires the bus, writes `command`, reads one reply line, releases
    /// the bus, and returns the raw line bytes. No two calls interleave
    /// their writes and reads, regardless of which logical device or thread
    /// issued them. A read timeout returns an empty line, which the frame
    /// parser rejects as malformed.
    pub fn transact(&self, command: &[u8]) -> Result<Vec<u8>> {
        let guard = self.port.lock();
        let mut port = guard.borrow_mut();
        tracing::trace!("tx {:?}", String::from_utf8_lossy(command));
        port.write_all(command).map_err(io_to_serial)?;
        let line = read_line(&mut **port)?;
        tracing::trace!("rx {:?}", String::from_utf8_lossy(&line));
        Ok(line)
    }

    /// Hold the bus across several transactions
    ///
    /// Used to compose multi-step commands (e.g. homing-check-then-home)
    /// that must not interleave with other callers. The returned guard is
    /// reentrant with [`Bus::transact`].
    pub fn hold(&self) -> BusGuard<'_> {
        self.port.lock()
    }
}

/// Read one line, up to and including the newline
///
/// A timed-out or drained port yields whatever arrived so far, which is an
/// empty buffer when the device never answered.
fn read_line(port: &mut dyn ChainPort) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match port.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                line.push(byte[0]);
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock => {
                break;
            }
            Err(e) => return Err(io_to_serial(e).into()),
        }
    }
    Ok(line)
}

fn io_to_serial(e: io::Error) -> ConnectionError {
    ConnectionError::SerialError {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_candidate_port_patterns() {
        assert!(is_chain_candidate("COM3"));
        assert!(is_chain_candidate("/dev/ttyUSB0"));
        assert!(is_chain_candidate("/dev/ttyACM1"));
        assert!(is_chain_candidate("/dev/ttyS1"));
        assert!(is_chain_candidate("/dev/cu.usbserial-A400"));
        assert!(!is_chain_candidate("COMport"));
        assert!(!is_chain_candidate("/dev/video0"));
    }

    #[test]
    fn open_fails_with_unsupported_baud_before_touching_the_port() {
        let params = ConnectionParams::new("/dev/ttyUSB0").with_baud_rate(1200);
        let err = Bus::open(&params).unwrap_err();
        assert!(matches!(
            err,
            zaberkit_core::Error::Connection(ConnectionError::UnsupportedBaudRate { baud: 1200 })
        ));
    }
}
