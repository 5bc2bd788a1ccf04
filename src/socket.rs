//! Async datagram channel abstraction.
//!
//! [`Channel`] is the seam between the ARQ loops and the transport: a plain
//! send/receive pair over raw datagram bytes.  [`Socket`] implements it as a
//! thin wrapper around `tokio::net::UdpSocket`; the fault-injecting
//! [`crate::lossy::LossyChannel`] wraps any other channel.  All protocol
//! logic lives elsewhere; this module owns only byte I/O.

use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

/// An unreliable datagram channel.
///
/// The contract the ARQ layer is built on:
/// - `send_to` may report success while actually discarding the datagram,
///   but a datagram it does deliver arrives uncorrupted and exactly once;
/// - `recv_from` blocks until a datagram arrives; callers bound the wait
///   externally (e.g. `tokio::time::timeout_at`) when they need one;
/// - any `io::Error` from either call is a transport failure, never a
///   simulated loss.
#[allow(async_fn_in_trait)]
pub trait Channel {
    /// Send one datagram to `dest`.  Returns the number of bytes accepted.
    async fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<usize>;

    /// Receive one datagram into `buf`.  Returns the byte count and the
    /// source address.
    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
}

/// An async UDP socket speaking raw datagrams.
///
/// All methods take `&self`, so the socket can be shared across tasks.
#[derive(Debug)]
pub struct Socket {
    /// Address this socket is bound to (resolved after the OS assigns an
    /// ephemeral port).
    pub local_addr: SocketAddr,
    inner: UdpSocket,
}

impl Socket {
    /// Bind a new socket to `local_addr`.
    ///
    /// Passing `0.0.0.0:0` lets the OS choose an ephemeral port.
    pub async fn bind(local_addr: SocketAddr) -> io::Result<Self> {
        let inner = UdpSocket::bind(local_addr).await?;
        let local_addr = inner.local_addr()?;
        Ok(Self { local_addr, inner })
    }
}

impl Channel for Socket {
    async fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<usize> {
        self.inner.send_to(buf, dest).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf).await
    }
}
