//! Logical device contract shared with the collaborator layer
//!
//! The chain registry constructs one logical device per configured address.
//! The surrounding layers (RPC exposure, config) only see the closed
//! [`DeviceKind`] tag and the [`ChainDevice`] lifecycle contract.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of logical device a chain address can be configured as
///
/// This is a closed set: an address is either a motion stage or a filter
/// wheel. Anything else on the chain is not addressable through this stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Multi-axis linear or rotary motion stage
    Stage,
    /// Indexed filter wheel or filter cube turret
    FilterWheel,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage => write!(f, "stage"),
            Self::FilterWheel => write!(f, "filter wheel"),
        }
    }
}

/// Lifecycle contract for a logical device on the chain
///
/// `initialize` and `shutdown` are no-ops at this layer — the bus owns the
/// physical connection and its teardown — but the hooks are part of the
/// contract exposed to the collaborator layer, which calls them around its
/// own resource management.
pub trait ChainDevice {
    /// The address this device is bound to on the chain
    fn address(&self) -> u8;

    /// Which kind of device this is
    fn kind(&self) -> DeviceKind;

    /// Post-construction hook; no resources are acquired here
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Pre-teardown hook; the bus owns the connection, so nothing to release
    fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_kind_serde_round_trip() {
        let kinds = [DeviceKind::Stage, DeviceKind::FilterWheel];
        for kind in kinds {
            let json = serde_json::to_string(&kind).unwrap();
            let back: DeviceKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, back);
        }
    }
}
