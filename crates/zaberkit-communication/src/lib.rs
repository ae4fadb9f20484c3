//! # ZaberKit Communication
//!
//! Daisy-chain serial protocol stack for Zaber motion devices speaking the
//! plain ASCII protocol (A-Series and X-Series, firmware 6.06 or higher).
//! Frames and validates replies, routes commands to the correct device by
//! address, serializes bus access across the logical devices sharing the
//! chain, and enforces the homing precondition before motion.
//!
//! The binary (checksummed) protocol variant is not modeled.

pub mod bus;
pub mod chain;
pub mod channel;
pub mod devices;
pub mod mock;
pub mod protocol;

pub use bus::{list_ports, Bus, BusGuard, ChainPort, SerialPortInfo};
pub use chain::{ChainEntry, DaisyChain};
pub use channel::{DeviceChannel, ALL_AXES};
pub use devices::{FilterWheel, Stage, StageAxis};
pub use protocol::{ReplyFlag, ReplyFrame};
