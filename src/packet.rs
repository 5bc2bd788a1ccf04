//! Wire-format definitions for ARQ datagrams.
//!
//! Every datagram exchanged between peers is a [`Packet`].  This module is
//! responsible for:
//! - Defining the on-wire binary layout (kind, sequence bit, payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning errors
//!   for truncated or malformed input.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! ```text
//!  0               1               2
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Kind      |  Sequence bit | Payload ...|
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! `Kind` is `0` for ACK, `1` for DATA.  The sequence bit is `0` or `1`.
//! ACK packets carry no payload.  There is no checksum or length prefix;
//! integrity is delegated entirely to the underlying channel.

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 2;

/// Total datagram budget per unit (the deployment MTU constant).
pub const MAX_DATAGRAM: usize = 1300;

/// Largest payload that fits a single DATA unit.
pub const MAX_PAYLOAD: usize = MAX_DATAGRAM - HEADER_LEN;

// Byte offsets of the two header fields.
const OFF_KIND: usize = 0;
const OFF_SEQ: usize = 1;

/// Packet kind: acknowledgement or data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Kind {
    /// Acknowledgement of a DATA unit; carries no payload.
    Ack = 0,
    /// Application data unit.
    Data = 1,
}

impl Kind {
    fn from_wire(byte: u8) -> Result<Self, DecodeError> {
        match byte {
            0 => Ok(Kind::Ack),
            1 => Ok(Kind::Data),
            other => Err(DecodeError::BadKind(other)),
        }
    }
}

/// One-bit alternating sequence number.
///
/// With at most one unit in flight, a single bit is enough to distinguish a
/// new data unit from a retransmission of the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SeqBit {
    Zero = 0,
    One = 1,
}

impl SeqBit {
    /// The other sequence value.
    pub fn flip(self) -> Self {
        match self {
            SeqBit::Zero => SeqBit::One,
            SeqBit::One => SeqBit::Zero,
        }
    }

    fn from_wire(byte: u8) -> Result<Self, DecodeError> {
        match byte {
            0 => Ok(SeqBit::Zero),
            1 => Ok(SeqBit::One),
            other => Err(DecodeError::BadSeq(other)),
        }
    }
}

impl Default for SeqBit {
    fn default() -> Self {
        SeqBit::Zero
    }
}

impl std::fmt::Display for SeqBit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// A complete ARQ datagram: two-byte header plus payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: Kind,
    pub seq: SeqBit,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Build a DATA packet carrying `payload`.
    pub fn data(seq: SeqBit, payload: Vec<u8>) -> Self {
        Self {
            kind: Kind::Data,
            seq,
            payload,
        }
    }

    /// Build an ACK packet for the given sequence bit (no payload).
    pub fn ack(seq: SeqBit) -> Self {
        Self {
            kind: Kind::Ack,
            seq,
            payload: Vec::new(),
        }
    }

    /// Serialise this packet into a newly allocated byte vector.
    ///
    /// Fails when the payload would not fit the datagram budget.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        if self.payload.len() > MAX_PAYLOAD {
            return Err(EncodeError::PayloadTooLarge {
                len: self.payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        let mut buf = Vec::with_capacity(HEADER_LEN + self.payload.len());
        buf.push(self.kind as u8);
        buf.push(self.seq as u8);
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is shorter than [`HEADER_LEN`], or
    /// - the kind or sequence byte holds a value outside its defined range.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < HEADER_LEN {
            return Err(DecodeError::Truncated { len: buf.len() });
        }

        let kind = Kind::from_wire(buf[OFF_KIND])?;
        let seq = SeqBit::from_wire(buf[OFF_SEQ])?;

        Ok(Packet {
            kind,
            seq,
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }
}

/// Errors that can arise when serialising a packet.
#[derive(Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// Payload exceeds the per-unit ceiling.
    PayloadTooLarge { len: usize, max: usize },
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::PayloadTooLarge { len, max } => {
                write!(f, "payload of {len} bytes exceeds the {max}-byte ceiling")
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer shorter than the fixed header size.
    Truncated { len: usize },
    /// Kind byte is neither ACK (0) nor DATA (1).
    BadKind(u8),
    /// Sequence byte is neither 0 nor 1.
    BadSeq(u8),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Truncated { len } => {
                write!(f, "datagram of {len} bytes is shorter than the header")
            }
            DecodeError::BadKind(b) => write!(f, "unrecognised kind byte {b:#04x}"),
            DecodeError::BadSeq(b) => write!(f, "sequence byte {b:#04x} is not 0 or 1"),
        }
    }
}

impl std::error::Error for DecodeError {}
