//! Connection configuration for the daisy-chain serial bus
//!
//! The parameters here are supplied by the excluded CLI/config layer.
//! There is no process-wide serial state: every bus instance is configured
//! explicitly at construction.

use crate::error::{ConnectionError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lowest baud rate the ASCII protocol supports.
pub const MIN_BAUD_RATE: u32 = 9600;

/// Default baud rate for a device chain.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Parameters for opening the shared serial connection
///
/// The chain speaks 8N1 with no flow control; those fields are carried
/// explicitly so the configuration surface is complete, but the defaults
/// are the only framing the devices accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,

    /// Baud rate; the protocol requires at least 9600, chains default to 115200
    pub baud_rate: u32,

    /// Serial read timeout in milliseconds
    ///
    /// This is the only timeout in the stack: a blocked caller waits on the
    /// bus lock, and a timed-out read surfaces as an empty (malformed) reply.
    pub timeout_ms: u64,

    /// Data bits (devices require 8)
    pub data_bits: u8,

    /// Stop bits (devices require 1)
    pub stop_bits: u8,

    /// Hardware flow control (devices require none)
    pub flow_control: bool,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: 500,
            data_bits: 8,
            stop_bits: 1,
            flow_control: false,
        }
    }
}

impl ConnectionParams {
    /// Create parameters for a port at the chain default baud rate
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the read timeout in milliseconds
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The read timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validate the parameters before any port is opened
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate < MIN_BAUD_RATE {
            return Err(ConnectionError::UnsupportedBaudRate {
                baud: self.baud_rate,
            }
            .into());
        }
        Ok(())
    }
}

/// Inclusive travel limits of one axis, in microsteps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLimits {
    /// Minimum position the axis can move to
    pub lower: i64,
    /// Maximum position the axis can move to
    pub upper: i64,
}

impl AxisLimits {
    /// True if `position` lies within the closed interval
    pub fn contains(&self, position: i64) -> bool {
        position >= self.lower && position <= self.upper
    }
}
