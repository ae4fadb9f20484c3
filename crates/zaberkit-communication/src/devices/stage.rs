//! Motion stage device
//!
//! One physical stage on the chain, with one handle per axis. A stage must
//! establish a home reference before its positions mean anything, and stage
//! homing can be a hazardous motion, so it is deferred to an explicit
//! [`Stage::enable`] call rather than done at construction.

use crate::channel::{DeviceChannel, ALL_AXES};
use std::collections::BTreeMap;
use std::sync::Arc;
use zaberkit_core::{AxisLimits, ChainDevice, DeviceError, DeviceKind, Result};

/// One axis of a stage
///
/// Positions and limits are in microsteps. Every accessor is a fresh wire
/// round trip; nothing is cached because limit switches and manual jogs can
/// move an axis behind the software's back.
#[derive(Debug)]
pub struct StageAxis {
    channel: Arc<DeviceChannel>,
    axis: u8,
}

impl StageAxis {
    fn new(channel: Arc<DeviceChannel>, axis: u8) -> Self {
        Self { channel, axis }
    }

    /// The axis number on the device, counted from 1
    pub fn number(&self) -> u8 {
        self.axis
    }

    /// Move by a relative distance
    ///
    /// The distance is truncated to whole microsteps. Out-of-travel moves
    /// are rejected by the device itself, not checked here.
    pub fn move_by(&self, delta: f64) -> Result<()> {
        self.channel.move_rel(self.axis, delta as i64)
    }

    /// Move to an absolute position, truncated to whole microsteps
    pub fn move_to(&self, position: f64) -> Result<()> {
        self.channel.move_abs(self.axis, position as i64)
    }

    /// Current absolute position, in microsteps
    pub fn position(&self) -> Result<i64> {
        self.channel.position(self.axis)
    }

    /// Inclusive travel limits, in microsteps
    pub fn limits(&self) -> Result<AxisLimits> {
        let lower = self.channel.limit_min(self.axis)?;
        let upper = self.channel.limit_max(self.axis)?;
        Ok(AxisLimits { lower, upper })
    }
}

/// A multi-axis motion stage on the chain
///
/// Axes are keyed by their 1-based number rendered as a string, matching
/// the contract the collaborator layer expects.
#[derive(Debug)]
pub struct Stage {
    channel: Arc<DeviceChannel>,
    axes: BTreeMap<String, StageAxis>,
}

impl Stage {
    /// Construct a stage over an existing channel
    ///
    /// Queries the axis count once to build the per-axis handles. No homing
    /// happens here; see [`Stage::enable`].
    pub fn new(channel: DeviceChannel) -> Result<Self> {
        let channel = Arc::new(channel);
        let count = channel.axis_count()?;
        let axes = (1..=count)
            .map(|i| (i.to_string(), StageAxis::new(channel.clone(), i)))
            .collect();
        Ok(Self { channel, axes })
    }

    /// Enable the stage for motion, homing it first if required
    ///
    /// Before a stage can move it needs a reference to the home position.
    /// The homed check and the conditional home command run under a single
    /// bus hold so no other caller can slip a command in between. Exactly
    /// one `home` is issued, and only when the device reports it has not
    /// been homed.
    pub fn enable(&self) -> Result<()> {
        let _hold = self.channel.bus().hold();
        if !self.channel.been_homed(ALL_AXES)? {
            self.channel.home(ALL_AXES)?;
        }
        Ok(())
    }

    /// The stage's axes, keyed by 1-based axis number
    pub fn axes(&self) -> &BTreeMap<String, StageAxis> {
        &self.axes
    }

    /// Current position of every axis, in microsteps
    pub fn position(&self) -> Result<BTreeMap<String, i64>> {
        self.axes
            .iter()
            .map(|(name, axis)| Ok((name.clone(), axis.position()?)))
            .collect()
    }

    /// Travel limits of every axis
    pub fn limits(&self) -> Result<BTreeMap<String, AxisLimits>> {
        self.axes
            .iter()
            .map(|(name, axis)| Ok((name.clone(), axis.limits()?)))
            .collect()
    }

    /// Move the named axes by the given distances
    pub fn move_by(&self, deltas: &BTreeMap<String, f64>) -> Result<()> {
        for (name, delta) in deltas {
            self.axis(name)?.move_by(*delta)?;
        }
        Ok(())
    }

    /// Move the named axes to the given positions
    pub fn move_to(&self, positions: &BTreeMap<String, f64>) -> Result<()> {
        for (name, position) in positions {
            self.axis(name)?.move_to(*position)?;
        }
        Ok(())
    }

    fn axis(&self, name: &str) -> Result<&StageAxis> {
        self.axes.get(name).ok_or_else(|| {
            DeviceError::UnknownAxis {
                name: name.to_string(),
            }
            .into()
        })
    }
}

impl ChainDevice for Stage {
    fn address(&self) -> u8 {
        self.channel.address()
    }

    fn kind(&self) -> DeviceKind {
        DeviceKind::Stage
    }
}
