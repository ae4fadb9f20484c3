//! ASCII reply frame parsing
//!
//! Parses one line of bus response into typed fields. The reply layout is
//! fixed-width at the front:
//!
//! ```text
//! @<addr:2d> <axis:1d> <flag:2c> <status:4c> <warning:2c> <response...>\r\n
//! offset:   3         5         8          13           16
//! ```
//!
//! Structural validation (frame-start byte, space delimiters at the five
//! fixed offsets) happens before any field is read, so garbled data is
//! rejected outright instead of being misread as a valid but wrong reply.
//! Fields are extracted by fixed byte offset, never by delimiter search,
//! because the response payload itself may contain spaces.

use zaberkit_core::{ProtocolError, Result};

/// Frame-start marker of every reply line.
pub const REPLY_MARKER: u8 = b'@';

/// Byte offsets that must hold the space delimiter in a valid frame.
const DELIMITER_OFFSETS: [usize; 5] = [3, 5, 8, 13, 16];

/// Shortest structurally valid frame: header through offset 16, an empty
/// response, and the two trailing bytes reserved for an optional checksum.
const MIN_FRAME_LEN: usize = 19;

/// Whether the device accepted or rejected the command
///
/// The wire values are `OK` and `RJ`. When rejected, the response payload
/// is a single word naming the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFlag {
    /// Command was accepted
    Accepted,
    /// Command was rejected; the response carries the reason
    Rejected,
}

impl ReplyFlag {
    fn from_bytes(bytes: &[u8]) -> Self {
        // Anything other than OK is treated as a rejection, matching the
        // device's contract of echoing a reason word in the response.
        if bytes == b"OK" {
            Self::Accepted
        } else {
            Self::Rejected
        }
    }

    /// The two wire bytes for this flag
    pub fn as_bytes(&self) -> &'static [u8; 2] {
        match self {
            Self::Accepted => b"OK",
            Self::Rejected => b"RJ",
        }
    }
}

/// One parsed reply line from the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyFrame {
    /// Two-digit address of the device that answered
    pub address: [u8; 2],
    /// Whether the command was accepted
    pub flag: ReplyFlag,
    /// Highest-priority active warning; `--` under normal conditions
    pub warning: [u8; 2],
    /// Remaining payload bytes
    pub response: Vec<u8>,
}

impl ReplyFrame {
    /// Parse one line of received bus data
    ///
    /// `data` is the raw line as read from the wire, including the trailing
    /// CRLF (the last two bytes double as the slot for an optional checksum,
    /// which the plain ASCII variant leaves unused and this parser ignores).
    /// A read timeout yields an empty line, which fails here like any other
    /// malformed input.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_FRAME_LEN
            || data[0] != REPLY_MARKER
            || DELIMITER_OFFSETS.iter().any(|&i| data[i] != b' ')
        {
            return Err(ProtocolError::MalformedFrame {
                line: String::from_utf8_lossy(data).trim_end().to_string(),
            }
            .into());
        }

        Ok(Self {
            address: [data[1], data[2]],
            flag: ReplyFlag::from_bytes(&data[6..8]),
            warning: [data[14], data[15]],
            response: data[17..data.len() - 2].to_vec(),
        })
    }

    /// Serialize back to a wire line
    ///
    /// The axis scope and device status fields are not modeled (nothing in
    /// the stack consumes them), so they serialize as `0` and `IDLE`.
    pub fn to_line(&self) -> Vec<u8> {
        let mut line = Vec::with_capacity(MIN_FRAME_LEN + self.response.len());
        line.push(REPLY_MARKER);
        line.extend_from_slice(&self.address);
        line.extend_from_slice(b" 0 ");
        line.extend_from_slice(self.flag.as_bytes());
        line.extend_from_slice(b" IDLE ");
        line.extend_from_slice(&self.warning);
        line.push(b' ');
        line.extend_from_slice(&self.response);
        line.extend_from_slice(b"\r\n");
        line
    }

    /// The address as text
    pub fn address_str(&self) -> &str {
        std::str::from_utf8(&self.address).unwrap_or("??")
    }

    /// True unless the warning field is `--`
    pub fn has_warning(&self) -> bool {
        &self.warning != b"--"
    }

    /// The response payload as text
    pub fn response_str(&self) -> &str {
        std::str::from_utf8(&self.response).unwrap_or("")
    }
}
