//! The stop-and-wait ARQ loops: send-and-wait-for-ack, receive-and-always-ack.
//!
//! [`Link`] owns the channel and the timeout/retry policy; the sequence state
//! lives in caller-owned sessions (see [`crate::sender`], [`crate::receiver`],
//! [`crate::session`]).
//!
//! ```text
//!           Normal operation                     Lost data
//!           ----------------                     ---------
//!
//!  recv_reliable   send_reliable       recv_reliable   send_reliable
//!      |                │                  |                │
//!      |      DATA      │                  |      DATA      │
//!      |◀───────────────┤                  |   X◀───────────┤
//!      |      ACK       │                  |            (timeout)
//!      ├───────────────▶│                  |      DATA      │
//!      |                │                  |◀───────────────┤
//!                                          |      ACK       │
//!                                          ├───────────────▶│
//!
//!           Lost ACK
//!           --------
//!
//!  recv_reliable   send_reliable
//!      |                │
//!      |      DATA      │          The receiver sees the resend as a
//!      |◀───────────────┤          duplicate: it acknowledges again but
//!      |      ACK       │          delivers nothing to the application.
//!      ├──────▶X        │
//!      |            (timeout)
//!      |      DATA      │
//!      |◀───────────────┤
//!      |      ACK       │
//!      ├───────────────▶│
//! ```
//!
//! An ACK that arrives with the wrong sequence bit (a stale ACK for an
//! earlier unit) is discarded without re-arming the ack-wait deadline, so a
//! chatty peer cannot stretch the retry cycle.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use crate::packet::{EncodeError, Kind, Packet, MAX_DATAGRAM, MAX_PAYLOAD};
use crate::sender::{SendSession, TimeoutAction};
use crate::session::SessionTable;
use crate::socket::Channel;

/// Tunable knobs for the retry policy.
#[derive(Debug, Clone)]
pub struct ArqConfig {
    /// How long to wait for an acknowledgement before a send attempt is
    /// considered lost.  Each retransmission re-arms a fresh wait.
    pub timeout: Duration,
    /// Retransmission ceiling: after `1 + max_resend` unacknowledged
    /// transmissions the sender gives up.
    pub max_resend: u32,
    /// Per-unit payload ceiling; clamped to [`MAX_PAYLOAD`].
    pub max_payload: usize,
}

impl Default for ArqConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(200),
            max_resend: 3,
            max_payload: MAX_PAYLOAD,
        }
    }
}

/// Outcome of a completed [`Link::send_reliable`] call.
///
/// Giving up is a reportable outcome, not an error: the channel stayed
/// healthy, the peer just never acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The unit was acknowledged; this many payload bytes were delivered.
    Delivered(usize),
    /// Retry ceiling exceeded with no matching acknowledgement.
    GaveUp,
}

impl SendOutcome {
    /// Byte count with give-up collapsed to zero — the classic sendto-style
    /// convention, for callers that only track progress.
    pub fn bytes_sent(&self) -> usize {
        match self {
            SendOutcome::Delivered(n) => *n,
            SendOutcome::GaveUp => 0,
        }
    }
}

/// Fatal errors surfaced by the ARQ loops.
///
/// Timeouts, duplicate data, and undecodable datagrams are all handled
/// inside the loops and never show up here.
#[derive(Debug)]
pub enum ArqError {
    /// Transport-level failure of the underlying channel; never retried.
    Io(io::Error),
    /// The outbound unit could not be framed (oversized payload).
    Encode(EncodeError),
}

impl std::fmt::Display for ArqError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArqError::Io(e) => write!(f, "channel I/O error: {e}"),
            ArqError::Encode(e) => write!(f, "cannot frame packet: {e}"),
        }
    }
}

impl std::error::Error for ArqError {}

impl From<io::Error> for ArqError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<EncodeError> for ArqError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

/// One end of a stop-and-wait ARQ exchange.
///
/// Generic over the channel so the same loops run over a real
/// [`crate::socket::Socket`] or a [`crate::lossy::LossyChannel`].
#[derive(Debug)]
pub struct Link<C> {
    channel: C,
    config: ArqConfig,
}

impl<C: Channel> Link<C> {
    /// Build a link over `channel` with the given retry policy.
    pub fn new(channel: C, config: ArqConfig) -> Self {
        Self { channel, config }
    }

    /// The retry policy in effect.
    pub fn config(&self) -> &ArqConfig {
        &self.config
    }

    /// Borrow the underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Reliably deliver one unit of at most `max_payload` bytes to `peer`.
    ///
    /// Only the leading chunk of `data` is sent; callers with more data loop
    /// (or use [`send_all`](Self::send_all)).  The call completes when the
    /// unit is acknowledged, when the retry ceiling is exceeded
    /// ([`SendOutcome::GaveUp`]), or on a transport error.
    ///
    /// On success the session's sequence bit has flipped; on give-up it is
    /// unchanged, so a later call retransmits under the same bit and a peer
    /// that eventually wakes up still classifies it correctly.
    pub async fn send_reliable(
        &self,
        session: &mut SendSession,
        data: &[u8],
        peer: SocketAddr,
    ) -> Result<SendOutcome, ArqError> {
        let chunk_len = data.len().min(self.config.max_payload).min(MAX_PAYLOAD);
        let pkt = session.data_packet(&data[..chunk_len]);
        let bytes = pkt.encode()?;
        session.resend_count = 0;

        loop {
            // SEND: one transmission attempt.
            self.channel.send_to(&bytes, peer).await?;
            log::debug!(
                "[arq] → DATA seq={} len={} attempt={}",
                pkt.seq,
                chunk_len,
                session.resend_count + 1
            );

            // AWAIT_ACK: a fixed deadline per attempt.  Wrong or garbled
            // arrivals do not re-arm it.
            let deadline = Instant::now() + self.config.timeout;
            let acked = loop {
                let mut buf = [0u8; MAX_DATAGRAM];
                let (n, from) = match timeout_at(deadline, self.channel.recv_from(&mut buf)).await
                {
                    Err(_elapsed) => break false,
                    Ok(Err(e)) => return Err(e.into()),
                    Ok(Ok(v)) => v,
                };

                match Packet::decode(&buf[..n]) {
                    Ok(reply) if session.matches_ack(&reply) => break true,
                    Ok(reply) => {
                        log::debug!(
                            "[arq] ignoring {:?} seq={} from {from} while awaiting ACK seq={}",
                            reply.kind,
                            reply.seq,
                            session.seq
                        );
                    }
                    Err(e) => {
                        log::debug!("[arq] ignoring undecodable datagram from {from}: {e}");
                    }
                }
            };

            if acked {
                log::debug!("[arq] ← ACK seq={} — delivered {chunk_len} bytes", session.seq);
                session.complete();
                return Ok(SendOutcome::Delivered(chunk_len));
            }

            match session.on_timeout(self.config.max_resend) {
                TimeoutAction::Retransmit => {
                    log::debug!(
                        "[arq] ack wait expired; retransmit {}/{}",
                        session.resend_count,
                        self.config.max_resend
                    );
                }
                TimeoutAction::GiveUp => {
                    log::warn!(
                        "[arq] no ACK from {peer} after {} transmissions; giving up",
                        self.config.max_resend + 1
                    );
                    return Ok(SendOutcome::GaveUp);
                }
            }
        }
    }

    /// Reliably deliver all of `data`, one `max_payload`-sized unit at a time.
    ///
    /// Returns `Delivered(data.len())` once every unit is acknowledged, or
    /// `GaveUp` as soon as any unit exhausts its retries (bytes before it
    /// were delivered; bytes after it were never sent).
    pub async fn send_all(
        &self,
        session: &mut SendSession,
        data: &[u8],
        peer: SocketAddr,
    ) -> Result<SendOutcome, ArqError> {
        let mut sent = 0;
        while sent < data.len() {
            match self.send_reliable(session, &data[sent..], peer).await? {
                SendOutcome::Delivered(n) => sent += n,
                SendOutcome::GaveUp => return Ok(SendOutcome::GaveUp),
            }
        }
        Ok(SendOutcome::Delivered(sent))
    }

    /// Wait for the next new DATA unit from any peer and acknowledge it.
    ///
    /// Every DATA unit observed is acknowledged with the **received**
    /// sequence bit back to its source — including duplicates, so a peer
    /// whose ACK was lost can stop resending.  Only a new unit ends the
    /// call; its payload (truncated to `max_len` if necessary) and the
    /// source address are returned.
    ///
    /// Undecodable datagrams and stray ACKs are dropped without a reply.
    /// The wait is unbounded; bound it externally (`tokio::select!` or
    /// `tokio::time::timeout`) when idling forever is not acceptable.
    pub async fn recv_reliable(
        &self,
        sessions: &mut SessionTable,
        max_len: usize,
    ) -> Result<(Vec<u8>, SocketAddr), ArqError> {
        loop {
            let mut buf = [0u8; MAX_DATAGRAM];
            let (n, from) = self.channel.recv_from(&mut buf).await?;

            let pkt = match Packet::decode(&buf[..n]) {
                Ok(pkt) => pkt,
                Err(e) => {
                    log::debug!("[arq] dropping undecodable datagram from {from}: {e}");
                    continue;
                }
            };
            if pkt.kind != Kind::Data {
                // A stray ACK is not acknowledged back.
                log::debug!("[arq] dropping stray ACK seq={} from {from}", pkt.seq);
                continue;
            }

            let fresh = sessions.peer_mut(from).recv.on_data(pkt.seq);

            // Always acknowledge, echoing the received bit.
            let ack = Packet::ack(pkt.seq).encode()?;
            self.channel.send_to(&ack, from).await?;
            log::debug!(
                "[arq] ← DATA seq={} len={} from {from} ({}); → ACK seq={}",
                pkt.seq,
                pkt.payload.len(),
                if fresh { "new" } else { "duplicate" },
                pkt.seq
            );

            if fresh {
                let mut payload = pkt.payload;
                if payload.len() > max_len {
                    log::warn!(
                        "[arq] truncating {}-byte unit from {from} to caller's {max_len}-byte buffer",
                        payload.len()
                    );
                    payload.truncate(max_len);
                }
                return Ok((payload, from));
            }
        }
    }
}
