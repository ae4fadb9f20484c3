//! # ZaberKit Core
//!
//! Core types for ZaberKit: the error taxonomy, connection configuration,
//! and the logical device contract shared between the communication stack
//! and the surrounding collaborator layers.

pub mod device;
pub mod error;
pub mod params;

pub use device::{ChainDevice, DeviceKind};
pub use error::{ChainError, ConnectionError, DeviceError, Error, ProtocolError, Result};
pub use params::{AxisLimits, ConnectionParams, DEFAULT_BAUD_RATE, MIN_BAUD_RATE};
