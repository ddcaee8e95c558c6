//! Connectionless UDP sockets.
//!
//! Datagrams are atomic: a send either transfers the whole buffer in one
//! OS call or fails, and there is no retry-to-completion layer. Buffers
//! above [`MAX_DATAGRAM_SIZE`] are rejected before any OS call.

use std::io;
use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};

use crate::addr::{self, Family};
use crate::error::SocketError;
use crate::socket::{self, Selectable, SocketBase};
use crate::sys::RawSocketHandle;

/// Largest UDP payload deliverable without fragmentation headaches:
/// 65535 minus the 8-byte UDP header and 20-byte IP header.
pub const MAX_DATAGRAM_SIZE: usize = 65507;

/// A bound UDP socket.
#[derive(Debug)]
pub struct UdpSocket {
    base: SocketBase,
    family: Family,
}

impl UdpSocket {
    /// Bind to `port`, logging and yielding an invalid socket on failure.
    /// Port 0 picks an ephemeral port.
    pub fn bind(port: u16, family: Family) -> Self {
        match Self::try_bind(port, family) {
            Ok(socket) => socket,
            Err(e) => {
                tracing::error!(error = %e, "failed to bind UDP socket");
                Self {
                    base: SocketBase::invalid(),
                    family,
                }
            }
        }
    }

    /// Bind to an ephemeral port chosen by the OS.
    pub fn bind_any(family: Family) -> Self {
        Self::bind(0, family)
    }

    /// Bind to `port`, returning the cause on failure.
    pub fn try_bind(port: u16, family: Family) -> Result<Self, SocketError> {
        for candidate in addr::resolve_local(port, family) {
            match bind_datagram(candidate) {
                Ok(socket) => {
                    tracing::debug!(addr = %candidate, "UDP socket bound");
                    return Ok(Self {
                        base: SocketBase::open(socket),
                        family: Family::of(&candidate),
                    });
                }
                Err(e) => {
                    tracing::warn!(addr = %candidate, error = %e, "bind candidate failed");
                }
            }
        }
        Err(SocketError::Bind { port })
    }

    /// Whether the socket is bound.
    pub fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    /// The locally bound endpoint, or `None` on failure (logged).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.base.local_addr()
    }

    /// Toggle blocking mode.
    pub fn set_blocking(&mut self, blocking: bool) {
        self.base.set_blocking(blocking);
    }

    /// Whether I/O calls block.
    pub fn is_blocking(&self) -> bool {
        self.base.is_blocking()
    }

    /// Resolve a peer address compatible with this socket's bound family.
    pub fn remote_addr(&self, host: &str, port: u16) -> Option<SocketAddr> {
        addr::resolve_remote(host, port, self.family)
            .into_iter()
            .next()
    }

    /// Send one datagram. True only if the OS accepted the whole buffer.
    ///
    /// Buffers above [`MAX_DATAGRAM_SIZE`] are rejected without touching
    /// the OS; a short transfer is treated as failure because datagrams
    /// are atomic or nothing.
    pub fn send_to(&self, buf: &[u8], addr: &SocketAddr) -> bool {
        if buf.len() > MAX_DATAGRAM_SIZE {
            tracing::error!(
                len = buf.len(),
                max = MAX_DATAGRAM_SIZE,
                "datagram exceeds the maximum safe UDP payload"
            );
            return false;
        }
        let Some(socket) = self.base.get() else {
            tracing::warn!("send on an invalid UDP socket");
            return false;
        };
        match socket.send_to(buf, &(*addr).into()) {
            Ok(n) if n == buf.len() => true,
            Ok(n) => {
                tracing::error!(sent = n, expected = buf.len(), "short datagram send");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, peer = %addr, "sendto failed");
                false
            }
        }
    }

    /// Receive one datagram, reporting the byte count and the sender.
    ///
    /// Exactly one recvfrom call; `None` on failure or, in non-blocking
    /// mode, when nothing is pending. Buffers above [`MAX_DATAGRAM_SIZE`]
    /// are rejected without touching the OS, mirroring [`send_to`]; any
    /// pending datagram stays queued.
    ///
    /// [`send_to`]: Self::send_to
    pub fn recv_from(&self, buf: &mut [u8]) -> Option<(usize, SocketAddr)> {
        if buf.len() > MAX_DATAGRAM_SIZE {
            tracing::error!(
                len = buf.len(),
                max = MAX_DATAGRAM_SIZE,
                "receive buffer exceeds the maximum safe UDP payload"
            );
            return None;
        }
        let socket = self.base.get().or_else(|| {
            tracing::warn!("recv on an invalid UDP socket");
            None
        })?;
        match socket::recv_from_into(socket, buf) {
            Ok((n, sender)) => Some((n, sender.as_socket()?)),
            Err(e) => {
                if e.kind() != io::ErrorKind::WouldBlock {
                    tracing::error!(error = %e, "recvfrom failed");
                }
                None
            }
        }
    }
}

impl Selectable for UdpSocket {
    fn raw_handle(&self) -> Option<RawSocketHandle> {
        self.base.raw()
    }
}

fn bind_datagram(addr: SocketAddr) -> io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    if addr.is_ipv6() {
        let _ = socket.set_only_v6(false);
    }
    socket.bind(&addr.into())?;
    Ok(socket)
}
