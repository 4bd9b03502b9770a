//! Datagram framing for forwarded frames.
//!
//! Every frame goes out as three UDP datagrams, in this order, with no other
//! header:
//!
//! ```text
//! [ sequence: u32 ]  [ length: u32 ]  [ payload: length bytes ]
//! ```
//!
//! Both integers use [`ByteOrder::Network`] (big-endian) unless configured
//! otherwise. There is no acknowledgement or retransmission; receivers have
//! to cope with missing datagrams, see [`FrameReassembler`].

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::RelayError;
use crate::relay::frame::Frame;

pub const HEADER_FIELD_LEN: usize = 4;

/// Largest payload that fits a single IPv4 UDP datagram. IPv6 allows 20
/// bytes more; the smaller limit is applied to both families.
pub const MAX_UDP_PAYLOAD: usize = 65_507;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ByteOrder {
    /// Big-endian.
    #[default]
    Network,
    /// Matches receivers written against the x86 host order of older senders.
    Little,
}

impl ByteOrder {
    pub fn encode(self, value: u32) -> [u8; HEADER_FIELD_LEN] {
        match self {
            ByteOrder::Network => value.to_be_bytes(),
            ByteOrder::Little => value.to_le_bytes(),
        }
    }

    pub fn decode(self, field: [u8; HEADER_FIELD_LEN]) -> u32 {
        match self {
            ByteOrder::Network => u32::from_be_bytes(field),
            ByteOrder::Little => u32::from_le_bytes(field),
        }
    }
}

impl FromStr for ByteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "network" | "big" | "be" => Ok(ByteOrder::Network),
            "little" | "le" => Ok(ByteOrder::Little),
            other => Err(format!("unknown byte order {:?}", other)),
        }
    }
}

impl Display for ByteOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteOrder::Network => write!(f, "network"),
            ByteOrder::Little => write!(f, "little"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub sequence: u32,
    pub length: u32,
}

impl FrameHeader {
    /// Fails when the payload would not fit in one datagram, so a header
    /// is never announced for a payload that cannot be sent.
    pub fn new(sequence: u32, payload_len: usize) -> Result<Self, RelayError> {
        if payload_len > MAX_UDP_PAYLOAD {
            return Err(RelayError::FrameTooLarge(payload_len));
        }
        Ok(Self {
            sequence,
            length: payload_len as u32,
        })
    }
}

/// The three datagrams of one frame, ready to hand to a socket.
#[derive(Clone, Debug)]
pub struct Datagrams {
    pub sequence: [u8; HEADER_FIELD_LEN],
    pub length: [u8; HEADER_FIELD_LEN],
    pub payload: Bytes,
}

impl Datagrams {
    /// Datagrams in send order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        [
            self.sequence.as_slice(),
            self.length.as_slice(),
            self.payload.as_ref(),
        ]
        .into_iter()
    }
}

pub fn encode(sequence: u32, frame: &Frame, order: ByteOrder) -> Result<Datagrams, RelayError> {
    let header = FrameHeader::new(sequence, frame.len())?;
    Ok(Datagrams {
        sequence: order.encode(header.sequence),
        length: order.encode(header.length),
        payload: frame.payload().clone(),
    })
}

/// A frame recovered by [`FrameReassembler`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedFrame {
    pub sequence: u32,
    pub payload: Bytes,
}

enum Expect {
    Sequence,
    Length { sequence: u32 },
    Payload { sequence: u32, length: u32 },
}

/// Receiver-side state machine that turns a datagram stream back into frames.
///
/// Loss is tolerated: a datagram that does not fit the expected slot restarts
/// the machine, using that datagram as a new sequence field when it is 4
/// bytes long. Frames are only yielded once all three datagrams agree.
pub struct FrameReassembler {
    order: ByteOrder,
    expect: Expect,
    discarded: u64,
}

impl FrameReassembler {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            expect: Expect::Sequence,
            discarded: 0,
        }
    }

    pub fn push(&mut self, datagram: &[u8]) -> Option<ReceivedFrame> {
        match self.expect {
            Expect::Sequence => {
                self.start(datagram);
                None
            }
            Expect::Length { sequence } => {
                match <[u8; HEADER_FIELD_LEN]>::try_from(datagram) {
                    Ok(field) => {
                        let length = self.order.decode(field);
                        self.expect = Expect::Payload { sequence, length };
                    }
                    Err(_) => {
                        self.discarded += 1;
                        self.expect = Expect::Sequence;
                    }
                }
                None
            }
            Expect::Payload { sequence, length } => {
                if datagram.len() == length as usize {
                    self.expect = Expect::Sequence;
                    Some(ReceivedFrame {
                        sequence,
                        payload: Bytes::copy_from_slice(datagram),
                    })
                } else {
                    self.discarded += 1;
                    self.start(datagram);
                    None
                }
            }
        }
    }

    /// Number of partial frames thrown away while resynchronising.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn start(&mut self, datagram: &[u8]) {
        self.expect = match <[u8; HEADER_FIELD_LEN]>::try_from(datagram) {
            Ok(field) => Expect::Length {
                sequence: self.order.decode(field),
            },
            Err(_) => {
                self.discarded += 1;
                Expect::Sequence
            }
        };
    }
}

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;
