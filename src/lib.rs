//! `snw-arq` — a stop-and-wait ARQ layer over lossy UDP.
//!
//! Given a datagram channel that may silently drop packets, this crate
//! rebuilds reliable, ordered, at-least-once delivery using a one-bit
//! sequence number, explicit acknowledgements, and timeout-driven
//! retransmission.  At most one data unit is ever in flight, so a single
//! alternating bit is enough to tell a new unit from its own retransmissions.
//!
//! # Architecture
//!
//! ```text
//!  application payload
//!       │ send_reliable                      recv_reliable │
//!       ▼                                                  ▲
//!  ┌───────────┐                                    ┌─────────────┐
//!  │SendSession│  seq bit, retry count              │ RecvSession │  dup filter
//!  └────┬──────┘                                    └──────┬──────┘
//!       │            ┌──────────────┐                      │
//!       └───────────▶│     Link     │◀─────────────────────┘
//!                    │ (retry loop, │
//!                    │  ack wait)   │
//!                    └──────┬───────┘
//!                           │ Packet encode / decode
//!                    ┌──────▼───────┐
//!                    │   Channel    │  Socket, or LossyChannel<Socket>
//!                    └──────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]   — wire format (encode / decode)
//! - [`sender`]   — send-side session state (seq bit, retry count); no I/O
//! - [`receiver`] — receive-side session state (duplicate filter); no I/O
//! - [`link`]     — the send-and-wait-for-ack and receive-and-always-ack loops
//! - [`session`]  — per-peer session bookkeeping for shared endpoints
//! - [`socket`]   — the [`socket::Channel`] trait and a tokio UDP wrapper
//! - [`lossy`]    — fault-injecting channel wrapper for tests and demos

pub mod link;
pub mod lossy;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod socket;
