//! Receive-side session state for stop-and-wait reliability.
//!
//! [`RecvSession`] is the duplicate filter for one peer: it decides whether
//! an inbound DATA unit is new or a retransmission of the last accepted one.
//! It does **not** touch the socket and it does not build ACKs;
//! [`crate::link::Link`] calls [`RecvSession::on_data`] and owns the
//! receive-and-always-ack loop (same pattern as [`crate::sender`]).
//!
//! A retransmission happens when the peer never saw our ACK, so the filter
//! must stay silent about duplicates while the link still re-acknowledges
//! them — otherwise the peer would keep resending forever.

use crate::packet::SeqBit;

/// Stop-and-wait receive-side state for one peer.
///
/// Tracks the sequence bit of the last unit accepted from that peer.
/// `None` means no unit has been seen yet, so the first observed unit is
/// always new regardless of its bit.
#[derive(Debug, Default)]
pub struct RecvSession {
    /// Sequence bit of the most recently accepted DATA unit.
    pub last_accepted: Option<SeqBit>,
}

impl RecvSession {
    /// Create a session that has seen nothing yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify an inbound DATA unit by its sequence bit.
    ///
    /// Returns `true` when the unit is new (its payload should be delivered
    /// to the application) and records it as the last accepted unit.
    /// Returns `false` for a retransmission of the last accepted unit; the
    /// caller must still acknowledge it but must not deliver it again.
    pub fn on_data(&mut self, seq: SeqBit) -> bool {
        if self.last_accepted == Some(seq) {
            return false;
        }
        self.last_accepted = Some(seq);
        true
    }
}
