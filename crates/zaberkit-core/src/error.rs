//! Error handling for ZaberKit
//!
//! Provides error types for all layers of the stack:
//! - Protocol errors (reply framing and validation)
//! - Connection errors (serial port and bus lifecycle)
//! - Device errors (logical device contract violations)
//! - Chain errors (daisy-chain configuration)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Protocol error type
///
/// Represents errors in the ASCII reply protocol: malformed frames,
/// replies routed to the wrong address, and commands the device refused.
/// None of these are retried — a blind retry of a motion command could
/// double-move a stage.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    /// Received bytes do not conform to the reply frame layout
    #[error("not a valid reply frame: {line:?}")]
    MalformedFrame {
        /// The offending line, lossily decoded for display.
        line: String,
    },

    /// Reply came from a different device than the one addressed
    #[error("received reply from a device with different address ({received} instead of {expected})")]
    AddressMismatch {
        /// The address the command was sent to.
        expected: String,
        /// The address that answered.
        received: String,
    },

    /// Device rejected the command
    #[error("command rejected because {reason:?}")]
    CommandRejected {
        /// The reason echoed by the device in the reply payload.
        reason: String,
    },

    /// Reply payload could not be decoded as the expected type
    #[error("failed to decode reply payload: {reason}")]
    ResponseDecode {
        /// The reason the payload decode failed.
        reason: String,
    },
}

/// Connection error type
///
/// Represents errors opening and probing the shared serial bus.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// Liveness probe failed: the port is not a chain of protocol-speaking devices
    #[error("'{port}' does not respond like a Zaber device")]
    NotADevice {
        /// The port that failed the probe.
        port: String,
    },

    /// Failed to open port
    #[error("failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Baud rate below the protocol floor
    #[error("baud rate {baud} not supported (protocol requires at least 9600)")]
    UnsupportedBaudRate {
        /// The unsupported baud rate.
        baud: u32,
    },

    /// Serial I/O error
    #[error("serial port error: {reason}")]
    SerialError {
        /// The reason for the serial port error.
        reason: String,
    },
}

/// Device error type
///
/// Represents caller-input contract violations on a logical device,
/// checked before any wire traffic.
#[derive(Error, Debug, Clone)]
pub enum DeviceError {
    /// Filter wheel position outside the wheel's discrete range
    #[error("position number must be between 1-{positions} inclusive, got {position}")]
    PositionOutOfRange {
        /// The requested position.
        position: i64,
        /// The number of discrete positions on the wheel.
        positions: i64,
    },

    /// Named axis does not exist on the stage
    #[error("stage has no axis named {name:?}")]
    UnknownAxis {
        /// The axis name that was requested.
        name: String,
    },
}

/// Chain error type
///
/// Represents errors building the daisy-chain registry from its
/// address-to-kind configuration.
#[derive(Error, Debug, Clone)]
pub enum ChainError {
    /// Device address outside the protocol's addressable range
    #[error("device address must be an integer between 1-99, got {address}")]
    InvalidAddress {
        /// The out-of-range address.
        address: u8,
    },

    /// Address configured as a filter wheel does not answer like one
    #[error("device with address {address} is not a filter wheel")]
    NotAFilterWheel {
        /// The address that failed filter-wheel validation.
        address: u8,
    },
}

/// Main error type for ZaberKit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Device error
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Chain error
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a protocol error
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a device error
    pub fn is_device_error(&self) -> bool {
        matches!(self, Error::Device(_))
    }

    /// Check if this is a chain error
    pub fn is_chain_error(&self) -> bool {
        matches!(self, Error::Chain(_))
    }

    /// Check if this is a rejected-command error
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Protocol(ProtocolError::CommandRejected { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_frame_display_includes_line() {
        let err = ProtocolError::MalformedFrame {
            line: "garbage".to_string(),
        };
        assert!(err.to_string().contains("garbage"));
    }

    #[test]
    fn address_mismatch_names_both_addresses() {
        let err = ProtocolError::AddressMismatch {
            expected: "01".to_string(),
            received: "02".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("01") && msg.contains("02"));
    }

    #[test]
    fn unified_error_classification() {
        let err: Error = ProtocolError::CommandRejected {
            reason: "BADCOMMAND".to_string(),
        }
        .into();
        assert!(err.is_protocol_error());
        assert!(err.is_rejection());
        assert!(!err.is_connection_error());
    }
}
