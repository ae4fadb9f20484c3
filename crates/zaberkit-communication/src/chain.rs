//! Daisy-chain registry
//!
//! Zaber devices daisy-chain: only the first device connects to the
//! computer and one serial port is shared by the whole chain. Each device
//! is identified by an address between 1 and 99. There is no way to guess
//! a device's type from the wire, so the caller supplies an
//! address-to-kind map and the registry constructs and owns one logical
//! device per entry, all sharing a single [`Bus`]. Even a single device is
//! a chain of one.

use crate::bus::Bus;
use crate::channel::DeviceChannel;
use crate::devices::{FilterWheel, Stage};
use std::collections::BTreeMap;
use std::sync::Arc;
use zaberkit_core::{ChainDevice, ChainError, ConnectionParams, DeviceKind, Result};

/// A logical device owned by the chain
#[derive(Debug)]
pub enum ChainEntry {
    /// Motion stage
    Stage(Stage),
    /// Filter wheel
    FilterWheel(FilterWheel),
}

impl ChainEntry {
    /// The device behind this entry, as the shared lifecycle contract
    pub fn as_device(&self) -> &dyn ChainDevice {
        match self {
            Self::Stage(stage) => stage,
            Self::FilterWheel(wheel) => wheel,
        }
    }

    /// The device behind this entry, mutably
    pub fn as_device_mut(&mut self) -> &mut dyn ChainDevice {
        match self {
            Self::Stage(stage) => stage,
            Self::FilterWheel(wheel) => wheel,
        }
    }
}

/// A daisy chain of devices behind one serial port
///
/// Owns the bus, every channel, and every logical device built from the
/// configured address map.
#[derive(Debug)]
pub struct DaisyChain {
    bus: Arc<Bus>,
    devices: BTreeMap<u8, ChainEntry>,
}

impl DaisyChain {
    /// Open the port and build one logical device per configured address
    ///
    /// Addresses are validated up front so a bad configuration fails before
    /// any device is constructed. Device-kind validation is the
    /// [`DeviceKind`] enum itself; per-address plausibility (a wheel kind
    /// bound to a multi-axis device, say) is checked by each device's own
    /// constructor.
    pub fn open(params: &ConnectionParams, kinds: &BTreeMap<u8, DeviceKind>) -> Result<Self> {
        for &address in kinds.keys() {
            if !(1..=99).contains(&address) {
                return Err(ChainError::InvalidAddress { address }.into());
            }
        }

        let bus = Arc::new(Bus::open(params)?);
        Self::over(bus, kinds)
    }

    /// Build the chain over an already-probed bus
    pub fn over(bus: Arc<Bus>, kinds: &BTreeMap<u8, DeviceKind>) -> Result<Self> {
        let mut devices = BTreeMap::new();
        for (&address, &kind) in kinds {
            let channel = DeviceChannel::new(bus.clone(), address)?;
            tracing::debug!("constructing {} at address {}", kind, address);
            let entry = match kind {
                DeviceKind::Stage => ChainEntry::Stage(Stage::new(channel)?),
                DeviceKind::FilterWheel => ChainEntry::FilterWheel(FilterWheel::new(channel)?),
            };
            devices.insert(address, entry);
        }
        Ok(Self { bus, devices })
    }

    /// The shared bus behind the chain
    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    /// Number of devices on the chain
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// True if no devices were configured
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Configured addresses, in order
    pub fn addresses(&self) -> impl Iterator<Item = u8> + '_ {
        self.devices.keys().copied()
    }

    /// All devices, keyed by address
    pub fn devices(&self) -> &BTreeMap<u8, ChainEntry> {
        &self.devices
    }

    /// The device at `address`, if configured
    pub fn device(&self, address: u8) -> Option<&ChainEntry> {
        self.devices.get(&address)
    }

    /// The device at `address`, mutably
    pub fn device_mut(&mut self, address: u8) -> Option<&mut ChainEntry> {
        self.devices.get_mut(&address)
    }

    /// The stage at `address`, if that address is a stage
    pub fn stage(&self, address: u8) -> Option<&Stage> {
        match self.devices.get(&address) {
            Some(ChainEntry::Stage(stage)) => Some(stage),
            _ => None,
        }
    }

    /// The filter wheel at `address`, if that address is a wheel
    pub fn filter_wheel(&self, address: u8) -> Option<&FilterWheel> {
        match self.devices.get(&address) {
            Some(ChainEntry::FilterWheel(wheel)) => Some(wheel),
            _ => None,
        }
    }
}
