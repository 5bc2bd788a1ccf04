//! Send-side session state for stop-and-wait reliability.
//!
//! [`SendSession`] tracks the alternating sequence bit and the retry count
//! for one logical connection.  It does **not** touch the socket;
//! [`crate::link::Link`] calls these methods and owns the actual
//! send/receive loop.
//!
//! # Stop-and-wait contract
//! - At most **one** data unit is in flight at any moment.
//! - The sequence bit flips exactly once per acknowledged unit and is stable
//!   across retransmissions of the same unit.
//! - On a matching ACK: flip the bit, clear the retry count.
//! - On timeout: increment the retry count; give up once it exceeds the
//!   configured ceiling.

use crate::packet::{Kind, Packet, SeqBit};

/// What the link loop should do after an ack-wait timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutAction {
    /// Resend the same unit, same sequence bit.
    Retransmit,
    /// Retry ceiling exceeded; stop waiting for this unit.
    GiveUp,
}

/// Stop-and-wait send-side state for one connection.
///
/// Owned by the caller and passed by reference into every
/// [`crate::link::Link::send_reliable`] call; one session per logical
/// connection, never shared between peers.
#[derive(Debug, Default)]
pub struct SendSession {
    /// Sequence bit of the unit currently (or next) being sent.
    ///
    /// Flips only when that unit has been acknowledged.
    pub seq: SeqBit,

    /// Number of retransmissions of the current unit (0 = first send only).
    pub resend_count: u32,
}

impl SendSession {
    /// Create a fresh session starting at sequence bit 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the DATA packet for `payload` under the current sequence bit.
    pub fn data_packet(&self, payload: &[u8]) -> Packet {
        Packet::data(self.seq, payload.to_vec())
    }

    /// `true` when `pkt` is the acknowledgement that completes the unit in
    /// flight: an ACK whose sequence bit equals ours.
    ///
    /// Wrong-sequence ACKs and non-ACK packets never match; the link loop
    /// discards those without disturbing the ack-wait deadline.
    pub fn matches_ack(&self, pkt: &Packet) -> bool {
        pkt.kind == Kind::Ack && pkt.seq == self.seq
    }

    /// Record a successful round-trip: flip the sequence bit and clear the
    /// retry count.  The next unit will carry the flipped bit.
    pub fn complete(&mut self) {
        self.seq = self.seq.flip();
        self.resend_count = 0;
    }

    /// Record an ack-wait timeout and decide whether to retransmit.
    ///
    /// With `max_resend = 3` this yields exactly four transmissions in total
    /// (one initial send plus three retries) before giving up.
    pub fn on_timeout(&mut self, max_resend: u32) -> TimeoutAction {
        self.resend_count += 1;
        if self.resend_count > max_resend {
            TimeoutAction::GiveUp
        } else {
            TimeoutAction::Retransmit
        }
    }
}
