//! Filter wheel device
//!
//! Filter wheels and filter cube turrets are single-axis rotary devices
//! with a fixed number of discrete, indexed positions. Unlike a stage,
//! homing a wheel is harmless, so an unhomed wheel is homed eagerly during
//! construction instead of behind an explicit enable step.

use crate::channel::{DeviceChannel, ALL_AXES};
use zaberkit_core::{ChainDevice, ChainError, DeviceError, DeviceKind, Result};

/// The single rotary axis of a wheel.
const WHEEL_AXIS: u8 = 1;

/// An indexed filter wheel on the chain
#[derive(Debug)]
pub struct FilterWheel {
    channel: DeviceChannel,
    positions: i64,
}

impl FilterWheel {
    /// Construct a filter wheel over an existing channel
    ///
    /// Validates that the addressed device actually answers like a wheel:
    /// exactly one axis, with a positive rotation length and index
    /// distance. The position count is derived as rotation length divided
    /// by index distance. Finishes by homing the wheel if it has not been
    /// homed yet, holding the bus across the whole construction sequence.
    pub fn new(channel: DeviceChannel) -> Result<Self> {
        let address = channel.address();
        let bus = channel.bus().clone();
        let _hold = bus.hold();

        if channel.axis_count()? != 1 {
            return Err(ChainError::NotAFilterWheel { address }.into());
        }

        let rotation_length = channel.rotation_length(WHEEL_AXIS)?;
        if rotation_length <= 0 {
            return Err(ChainError::NotAFilterWheel { address }.into());
        }
        let index_distance = channel.index_distance(WHEEL_AXIS)?;
        if index_distance <= 0 {
            return Err(ChainError::NotAFilterWheel { address }.into());
        }
        let positions = rotation_length / index_distance;

        if !channel.been_homed(ALL_AXES)? {
            channel.home(ALL_AXES)?;
        }

        Ok(Self { channel, positions })
    }

    /// Number of discrete positions on the wheel
    pub fn positions(&self) -> i64 {
        self.positions
    }

    /// The wheel's current position
    ///
    /// Position numbering starts at 1, per the protocol's indexed-move
    /// convention. Whether collaborators count from 0 or 1 has never been
    /// confirmed upstream, so this layer reports the device's own numbering
    /// untranslated.
    pub fn get_position(&self) -> Result<i64> {
        self.channel.current_index(WHEEL_AXIS)
    }

    /// Rotate the wheel to a position
    ///
    /// `position` must be within `1..=positions`; anything else fails
    /// before a single byte goes out on the wire.
    pub fn set_position(&self, position: i64) -> Result<()> {
        if position < 1 || position > self.positions {
            return Err(DeviceError::PositionOutOfRange {
                position,
                positions: self.positions,
            }
            .into());
        }
        self.channel.move_to_index(WHEEL_AXIS, position)
    }
}

impl ChainDevice for FilterWheel {
    fn address(&self) -> u8 {
        self.channel.address()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::FilterWheel
    }
}
