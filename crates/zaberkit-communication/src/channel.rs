//! Command routing to one device on the chain
//!
//! A [`DeviceChannel`] binds a numeric device address to the shared bus.
//! It turns logical commands into wire bytes, validates that replies came
//! from the addressed device and were accepted, and exposes the typed
//! queries the logical devices are built from. The channel is stateless
//! beyond its address: every query is a fresh round trip, because device
//! state can change from physical causes (limit switches, manual jog) that
//! no client-side cache would see.

use crate::bus::Bus;
use crate::protocol::{ReplyFlag, ReplyFrame};
use std::sync::Arc;
use zaberkit_core::{ChainError, ProtocolError, Result};

/// Axis number that broadcasts a command to all axes of the device.
pub const ALL_AXES: u8 = 0;

/// A command channel to a single device on the shared bus
#[derive(Debug)]
pub struct DeviceChannel {
    bus: Arc<Bus>,
    address: u8,
    address_bytes: [u8; 2],
}

impl DeviceChannel {
    /// Bind a device address (1-99) to the bus
    pub fn new(bus: Arc<Bus>, address: u8) -> Result<Self> {
        if !(1..=99).contains(&address) {
            return Err(ChainError::InvalidAddress { address }.into());
        }
        let digits = [b'0' + address / 10, b'0' + address % 10];
        Ok(Self {
            bus,
            address,
            address_bytes: digits,
        })
    }

    /// The bound device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// The bus this channel transacts on
    pub fn bus(&self) -> &Arc<Bus> {
        &self.bus
    }

    /// Send one command and return the validated reply
    ///
    /// The wire format is `/<addr:02> <axis:1> <payload>\n`; axis 0 makes
    /// every axis of the device execute the command. Axis numbers are not
    /// range-checked here — the device rejects a bad one with BADAXIS.
    ///
    /// A reply from any other address is a protocol violation and is never
    /// silently ignored; a rejected reply surfaces the device's reason.
    pub fn command(&self, axis: u8, payload: &[u8]) -> Result<ReplyFrame> {
        let mut line = Vec::with_capacity(payload.len() + 8);
        line.push(b'/');
        line.extend_from_slice(&self.address_bytes);
        line.push(b' ');
        line.extend_from_slice(format!("{}", axis).as_bytes());
        line.push(b' ');
        line.extend_from_slice(payload);
        line.push(b'\n');

        let data = self.bus.transact(&line)?;
        let reply = ReplyFrame::parse(&data)?;
        self.validate_reply(&reply)?;
        Ok(reply)
    }

    fn validate_reply(&self, reply: &ReplyFrame) -> Result<()> {
        if reply.address != self.address_bytes {
            return Err(ProtocolError::AddressMismatch {
                expected: String::from_utf8_lossy(&self.address_bytes).into_owned(),
                received: reply.address_str().to_string(),
            }
            .into());
        }
        if reply.flag != ReplyFlag::Accepted {
            return Err(ProtocolError::CommandRejected {
                reason: reply.response_str().to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Number of axes on the device
    pub fn axis_count(&self) -> Result<u8> {
        let reply = self.command(ALL_AXES, b"get system.axiscount")?;
        decode_int(&reply).and_then(|n| {
            u8::try_from(n).map_err(|_| {
                ProtocolError::ResponseDecode {
                    reason: format!("axis count {} out of range", n),
                }
                .into()
            })
        })
    }

    /// True if all axes, or the selected axis, have been homed
    ///
    /// The device answers one flag per queried axis; all of them must be
    /// set for the position readings to be trustworthy.
    pub fn been_homed(&self, axis: u8) -> Result<bool> {
        let reply = self.command(axis, b"get limit.home.triggered")?;
        let mut homed = true;
        for field in reply.response_str().split_whitespace() {
            let value: i64 = field.parse().map_err(|_| ProtocolError::ResponseDecode {
                reason: format!("non-integer homed flag {:?}", field),
            })?;
            homed &= value != 0;
        }
        Ok(homed)
    }

    /// Move the axis (or all axes) to the home position
    ///
    /// Blocks only for the wire round trip; the device homes on its own
    /// after accepting the command.
    pub fn home(&self, axis: u8) -> Result<()> {
        tracing::info!("homing device {} axis {}", self.address, axis);
        self.command(axis, b"home")?;
        Ok(())
    }

    /// Microsteps in one full rotation
    ///
    /// Only meaningful on rotary devices, including filter wheels and
    /// filter cube turrets; linear stages reject the query.
    pub fn rotation_length(&self, axis: u8) -> Result<i64> {
        decode_int(&self.command(axis, b"get limit.cycle.dist")?)
    }

    /// Microsteps between adjacent indexed positions
    pub fn index_distance(&self, axis: u8) -> Result<i64> {
        decode_int(&self.command(axis, b"get motion.index.dist")?)
    }

    /// Current indexed position, counted from 1
    pub fn current_index(&self, axis: u8) -> Result<i64> {
        decode_int(&self.command(axis, b"get motion.index.num")?)
    }

    /// Move to an indexed position
    pub fn move_to_index(&self, axis: u8, index: i64) -> Result<()> {
        self.command(axis, format!("move index {}", index).as_bytes())?;
        Ok(())
    }

    /// Move to an absolute position, in microsteps
    pub fn move_abs(&self, axis: u8, position: i64) -> Result<()> {
        self.command(axis, format!("move abs {}", position).as_bytes())?;
        Ok(())
    }

    /// Move by a relative distance, in microsteps
    pub fn move_rel(&self, axis: u8, distance: i64) -> Result<()> {
        self.command(axis, format!("move rel {}", distance).as_bytes())?;
        Ok(())
    }

    /// Current absolute position of an axis, in microsteps
    pub fn position(&self, axis: u8) -> Result<i64> {
        decode_int(&self.command(axis, b"get pos")?)
    }

    /// The maximum position the axis can move to, in microsteps
    pub fn limit_max(&self, axis: u8) -> Result<i64> {
        decode_int(&self.command(axis, b"get limit.max")?)
    }

    /// The minimum position the axis can move to, in microsteps
    pub fn limit_min(&self, axis: u8) -> Result<i64> {
        decode_int(&self.command(axis, b"get limit.min")?)
    }
}

fn decode_int(reply: &ReplyFrame) -> Result<i64> {
    reply
        .response_str()
        .trim()
        .parse()
        .map_err(|_| {
            ProtocolError::ResponseDecode {
                reason: format!("expected integer payload, got {:?}", reply.response_str()),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedPort;
    use zaberkit_core::Error;

    fn channel_over(port: &ScriptedPort, address: u8) -> DeviceChannel {
        port.push_reply(b"@01 0 OK IDLE -- 0\r\n");
        let bus = Arc::new(Bus::attach(Box::new(port.clone()), "scripted").unwrap());
        port.clear_writes();
        DeviceChannel::new(bus, address).unwrap()
    }

    #[test]
    fn command_frames_address_axis_and_payload() {
        let port = ScriptedPort::new();
        let channel = channel_over(&port, 1);

        port.push_reply(b"@01 0 OK IDLE -- 2\r\n");
        let count = channel.axis_count().unwrap();
        assert_eq!(count, 2);
        assert_eq!(port.writes(), vec![b"/01 0 get system.axiscount\n".to_vec()]);
    }

    #[test]
    fn reply_from_wrong_address_is_a_protocol_violation() {
        let port = ScriptedPort::new();
        let channel = channel_over(&port, 1);

        port.push_reply(b"@02 0 OK IDLE -- 2\r\n");
        let err = channel.axis_count().unwrap_err();
        match err {
            Error::Protocol(ProtocolError::AddressMismatch { expected, received }) => {
                assert_eq!(expected, "01");
                assert_eq!(received, "02");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn rejection_carries_the_device_reason() {
        let port = ScriptedPort::new();
        let channel = channel_over(&port, 1);

        port.push_reply(b"@01 0 RJ IDLE -- BADCOMMAND\r\n");
        let err = channel.command(0, b"bogus").unwrap_err();
        match err {
            Error::Protocol(ProtocolError::CommandRejected { reason }) => {
                assert_eq!(reason, "BADCOMMAND");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn rejection_wins_even_with_matching_address() {
        let port = ScriptedPort::new();
        let channel = channel_over(&port, 1);

        port.push_reply(b"@01 0 RJ IDLE -- BADAXIS\r\n");
        let err = channel.command(9, b"home").unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::CommandRejected { .. })
        ));
    }

    #[test]
    fn timed_out_read_surfaces_as_malformed_frame() {
        let port = ScriptedPort::new();
        let channel = channel_over(&port, 1);

        // No reply queued: the read times out and yields an empty line.
        let err = channel.position(1).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn been_homed_requires_every_axis_flag() {
        let port = ScriptedPort::new();
        let channel = channel_over(&port, 1);

        port.push_reply(b"@01 0 OK IDLE -- 1 1\r\n");
        assert!(channel.been_homed(ALL_AXES).unwrap());

        port.push_reply(b"@01 0 OK IDLE -- 1 0\r\n");
        assert!(!channel.been_homed(ALL_AXES).unwrap());
    }

    #[test]
    fn two_digit_addresses_are_zero_padded() {
        let port = ScriptedPort::new();
        port.push_reply(b"@01 0 OK IDLE -- 0\r\n");
        let bus = Arc::new(Bus::attach(Box::new(port.clone()), "scripted").unwrap());
        port.clear_writes();

        let channel = DeviceChannel::new(bus, 7).unwrap();
        port.push_reply(b"@07 0 OK IDLE -- 0\r\n");
        channel.home(0).unwrap();
        assert_eq!(port.writes(), vec![b"/07 0 home\n".to_vec()]);
    }

    #[test]
    fn address_outside_chain_range_is_rejected() {
        let port = ScriptedPort::new();
        port.push_reply(b"@01 0 OK IDLE -- 0\r\n");
        let bus = Arc::new(Bus::attach(Box::new(port.clone()), "scripted").unwrap());

        assert!(DeviceChannel::new(bus.clone(), 0).is_err());
        assert!(DeviceChannel::new(bus, 100).is_err());
    }
}
