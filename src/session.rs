//! Per-peer session bookkeeping for shared endpoints.
//!
//! Sequence state is meaningful only between one pair of peers.  When a
//! single socket serves several remote peers (an echo server, say), each
//! peer needs its own [`SendSession`] and [`RecvSession`] — a single shared
//! duplicate filter would silently misclassify interleaved traffic from
//! different sources.
//!
//! [`SessionTable`] keys both halves by peer address.  The table is owned by
//! the application, which also decides session lifetime: sessions appear on
//! first contact and live until [`SessionTable::reset`] (connection over) or
//! process exit.  The ARQ loops in [`crate::link`] only index into it.

use std::collections::HashMap;
use std::net::SocketAddr;

use crate::receiver::RecvSession;
use crate::sender::SendSession;

/// Both halves of the ARQ state for one remote peer.
#[derive(Debug, Default)]
pub struct PeerSessions {
    pub send: SendSession,
    pub recv: RecvSession,
}

/// Caller-owned map of per-peer ARQ sessions.
#[derive(Debug, Default)]
pub struct SessionTable {
    peers: HashMap<SocketAddr, PeerSessions>,
}

impl SessionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The sessions for `peer`, created fresh on first contact.
    pub fn peer_mut(&mut self, peer: SocketAddr) -> &mut PeerSessions {
        self.peers.entry(peer).or_default()
    }

    /// Discard all state for `peer` (explicit end of that connection).
    ///
    /// The next unit exchanged with this peer starts from a fresh session.
    pub fn reset(&mut self, peer: SocketAddr) {
        self.peers.remove(&peer);
    }

    /// Number of peers currently tracked.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// `true` when no peer has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
