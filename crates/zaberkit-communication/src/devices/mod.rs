//! Logical devices built on top of a device channel

pub mod stage;
pub mod wheel;

pub use stage::{Stage, StageAxis};
pub use wheel::FilterWheel;
