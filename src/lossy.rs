//! Fault-injecting channel wrapper for deterministic testing.
//!
//! Real networks drop packets.  To exercise the retransmission machinery
//! without depending on actual network conditions, [`LossyChannel`] wraps any
//! [`Channel`] and silently discards outbound datagrams according to a
//! [`DropPolicy`], while still reporting them as sent — exactly what a lossy
//! network looks like to the sender.  Inbound traffic passes through
//! untouched.
//!
//! Every policy is deterministic, so test failures are reproducible without
//! a seeded RNG:
//!
//! | policy    | behaviour                                           |
//! |-----------|-----------------------------------------------------|
//! | `None`    | transparent pass-through                            |
//! | `Burst`   | counter-driven 1-in-4 loss, in bursts of two        |
//! | `Pattern` | scripted per-send drop list (for targeted tests)    |
//! | `All`     | black hole — nothing ever leaves                    |

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::socket::Channel;

/// When the wrapper discards an outbound datagram.
#[derive(Debug, Clone)]
pub enum DropPolicy {
    /// Deliver everything.
    None,
    /// Drop two consecutive sends out of every eight, driven by a send
    /// counter: a send is dropped when bits 1 and 2 of the counter are both
    /// set.  Averages 25% loss with bursts of two.
    Burst,
    /// Drop the nth send when `pattern[n]` is `true`; sends beyond the end
    /// of the pattern are delivered.
    Pattern(Vec<bool>),
    /// Drop every send.
    All,
}

/// Cloneable attempt/drop counters shared with the wrapper.
///
/// Clone this before handing the channel to another task, then assert on the
/// counts afterwards.
#[derive(Debug, Clone, Default)]
pub struct LossyStats {
    attempts: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl LossyStats {
    /// Total `send_to` calls observed, delivered or not.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Sends that were silently discarded.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Sends that actually reached the inner channel.
    pub fn delivered(&self) -> u64 {
        self.attempts() - self.dropped()
    }
}

/// A channel that randomly eats outbound datagrams.
#[derive(Debug)]
pub struct LossyChannel<C> {
    inner: C,
    policy: DropPolicy,
    /// Monotonic send counter; drives `Burst` and indexes `Pattern`.
    sends: AtomicUsize,
    stats: LossyStats,
}

impl<C> LossyChannel<C> {
    /// Wrap `inner` with the given drop policy.
    pub fn new(inner: C, policy: DropPolicy) -> Self {
        Self {
            inner,
            policy,
            sends: AtomicUsize::new(0),
            stats: LossyStats::default(),
        }
    }

    /// A handle onto this channel's counters.
    pub fn stats(&self) -> LossyStats {
        self.stats.clone()
    }

    fn should_drop(&self, nth: usize) -> bool {
        match &self.policy {
            DropPolicy::None => false,
            // Counter starts at 1 for the first send, matching the classic
            // "increment, then test bits 1 and 2" loss generator.
            DropPolicy::Burst => {
                let c = nth + 1;
                c & 0x4 != 0 && c & 0x2 != 0
            }
            DropPolicy::Pattern(pattern) => pattern.get(nth).copied().unwrap_or(false),
            DropPolicy::All => true,
        }
    }
}

impl<C: Channel> Channel for LossyChannel<C> {
    async fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<usize> {
        let nth = self.sends.fetch_add(1, Ordering::Relaxed);
        self.stats.attempts.fetch_add(1, Ordering::Relaxed);

        if self.should_drop(nth) {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            log::trace!("[lossy] dropping send #{nth} ({} bytes)", buf.len());
            // Report the datagram as sent, as a lossy network would.
            return Ok(buf.len());
        }
        self.inner.send_to(buf, dest).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf).await
    }
}
