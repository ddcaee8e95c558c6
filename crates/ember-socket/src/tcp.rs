//! TCP listener and stream sockets.
//!
//! [`TcpListener`] resolves, binds, and listens in one step; [`TcpSocket`]
//! carries raw single-call I/O, retry-to-completion helpers, and
//! length-prefixed packet framing on top of them. Constructors never fail
//! loudly: the infallible forms log the cause and hand back an invalid
//! socket the caller can test with `is_valid`, while the `try_*` forms
//! return the [`SocketError`] instead.

use std::io;
use std::net::{Shutdown, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};

use crate::addr::{self, Family};
use crate::error::SocketError;
use crate::packet::{self, DEFAULT_MAX_PACKET_LEN, HEADER_LEN, Packet};
use crate::socket::{self, Selectable, SocketBase, Status};
use crate::sys::RawSocketHandle;

/// Listening TCP socket accepting incoming connections.
#[derive(Debug)]
pub struct TcpListener {
    base: SocketBase,
}

impl TcpListener {
    /// Bind a listener on `port`, logging and yielding an invalid listener
    /// on failure. Port 0 picks an ephemeral port.
    pub fn bind(port: u16, family: Family) -> Self {
        match Self::try_bind(port, family) {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "failed to open TCP listener");
                Self {
                    base: SocketBase::invalid(),
                }
            }
        }
    }

    /// Bind a listener on `port`, returning the cause on failure.
    ///
    /// Wildcard candidates are tried in order; with [`Family::Unspec`] a
    /// dual-stack IPv6 bind is preferred, falling back to IPv4-only.
    pub fn try_bind(port: u16, family: Family) -> Result<Self, SocketError> {
        for candidate in addr::resolve_local(port, family) {
            match bind_listener(candidate) {
                Ok(socket) => {
                    tracing::debug!(addr = %candidate, "TCP listener bound");
                    return Ok(Self {
                        base: SocketBase::open(socket),
                    });
                }
                Err(e) => {
                    tracing::warn!(addr = %candidate, error = %e, "bind candidate failed");
                }
            }
        }
        Err(SocketError::Bind { port })
    }

    /// Whether the listener is bound and listening.
    pub fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    /// The locally bound endpoint, or `None` on failure (logged).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.base.local_addr()
    }

    /// Toggle blocking mode for `accept`.
    pub fn set_blocking(&mut self, blocking: bool) {
        self.base.set_blocking(blocking);
    }

    /// Whether `accept` blocks.
    pub fn is_blocking(&self) -> bool {
        self.base.is_blocking()
    }

    /// Accept one connection, blocking per the listener's mode.
    ///
    /// On failure the returned socket is invalid; check `is_valid`.
    pub fn accept(&self) -> TcpSocket {
        self.accept_from().0
    }

    /// Accept one connection and report the peer's address.
    pub fn accept_from(&self) -> (TcpSocket, Option<SocketAddr>) {
        let Some(socket) = self.base.get() else {
            tracing::warn!("accept called on an invalid listener");
            return (TcpSocket::invalid(), None);
        };
        match socket.accept() {
            Ok((accepted, peer)) => {
                if let Err(e) = accepted.set_nodelay(true) {
                    tracing::warn!(error = %e, "failed to set TCP_NODELAY on accepted socket");
                }
                (TcpSocket::from_accepted(accepted), peer.as_socket())
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::WouldBlock {
                    tracing::error!(error = %e, "accept failed");
                }
                (TcpSocket::invalid(), None)
            }
        }
    }
}

impl Selectable for TcpListener {
    fn raw_handle(&self) -> Option<RawSocketHandle> {
        self.base.raw()
    }
}

fn bind_listener(addr: SocketAddr) -> io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    // SO_REUSEADDR has accept-stealing semantics on Windows, so only
    // request it elsewhere.
    if !cfg!(windows) {
        socket.set_reuse_address(true)?;
    }
    if addr.is_ipv6() {
        // Dual-stack: accept IPv4 peers on the IPv6 wildcard socket where
        // the platform allows it.
        let _ = socket.set_only_v6(false);
    }
    socket.bind(&addr.into())?;
    socket.listen(128)?;
    Ok(socket)
}

fn connect_stream(addr: SocketAddr) -> io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.connect(&addr.into())?;
    if let Err(e) = socket.set_nodelay(true) {
        tracing::warn!(error = %e, "failed to set TCP_NODELAY");
    }
    Ok(socket)
}

/// A connected TCP stream socket.
///
/// Dropping the socket shuts the connection down in both directions before
/// the handle closes.
#[derive(Debug)]
pub struct TcpSocket {
    base: SocketBase,
    max_packet_len: u64,
}

impl TcpSocket {
    /// Connect to `host:port`, logging and yielding an invalid socket on
    /// failure.
    pub fn connect(host: &str, port: u16, family: Family) -> Self {
        match Self::try_connect(host, port, family) {
            Ok(socket) => socket,
            Err(e) => {
                tracing::error!(error = %e, "TCP connect failed");
                Self::invalid()
            }
        }
    }

    /// Connect to `host:port`, returning the cause on failure.
    ///
    /// Resolved candidates are tried in order; the first that connects is
    /// authoritative.
    pub fn try_connect(host: &str, port: u16, family: Family) -> Result<Self, SocketError> {
        let candidates = addr::resolve_remote(host, port, family);
        if candidates.is_empty() {
            return Err(SocketError::Resolution {
                host: host.to_owned(),
                port,
            });
        }
        for candidate in candidates {
            match connect_stream(candidate) {
                Ok(socket) => {
                    tracing::debug!(addr = %candidate, "TCP connection established");
                    return Ok(Self::from_accepted(socket));
                }
                Err(e) => {
                    tracing::warn!(addr = %candidate, error = %e, "connect candidate failed");
                }
            }
        }
        Err(SocketError::Connect {
            host: host.to_owned(),
            port,
        })
    }

    /// Wrap an already-connected socket, e.g. one returned by `accept`.
    pub(crate) fn from_accepted(socket: Socket) -> Self {
        Self {
            base: SocketBase::open(socket),
            max_packet_len: DEFAULT_MAX_PACKET_LEN,
        }
    }

    pub(crate) fn invalid() -> Self {
        Self {
            base: SocketBase::invalid(),
            max_packet_len: DEFAULT_MAX_PACKET_LEN,
        }
    }

    /// Whether the socket holds a live connection handle.
    pub fn is_valid(&self) -> bool {
        self.base.is_valid()
    }

    /// The locally bound endpoint, or `None` on failure (logged).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.base.local_addr()
    }

    /// The connected peer's endpoint, or `None` on failure (logged).
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        let socket = self.base.get()?;
        match socket.peer_addr() {
            Ok(addr) => addr.as_socket(),
            Err(e) => {
                tracing::error!(error = %e, "failed to query the peer address");
                None
            }
        }
    }

    /// Toggle blocking mode.
    pub fn set_blocking(&mut self, blocking: bool) {
        self.base.set_blocking(blocking);
    }

    /// Whether I/O calls block.
    pub fn is_blocking(&self) -> bool {
        self.base.is_blocking()
    }

    /// Ceiling on a received packet's payload length.
    pub fn max_packet_len(&self) -> u64 {
        self.max_packet_len
    }

    /// Change the received-packet ceiling. A wire header announcing more
    /// than this is treated as an error instead of allocated.
    pub fn set_max_packet_len(&mut self, max: u64) {
        self.max_packet_len = max;
    }

    /// Shut the connection down in both directions and close the handle.
    pub fn disconnect(&mut self) {
        if let Some(socket) = self.base.get() {
            let _ = socket.shutdown(Shutdown::Both);
        }
        self.base.close();
    }

    /// One OS send call, never retried.
    ///
    /// `Status::Data` carries the number of bytes actually accepted, which
    /// can be less than `buf.len()`; `Status::Block` asks for a retry (see
    /// its documentation for when it can occur).
    pub fn send_raw(&mut self, buf: &[u8]) -> Status {
        let Some(socket) = self.base.get() else {
            tracing::warn!("send on an invalid socket");
            return Status::Error;
        };
        socket::map_send(socket.send(buf))
    }

    /// One OS recv call, never retried.
    ///
    /// `Status::Close` means the peer performed an orderly close.
    pub fn recv_raw(&mut self, buf: &mut [u8]) -> Status {
        if buf.is_empty() {
            return Status::Data(0);
        }
        let Some(socket) = self.base.get() else {
            tracing::warn!("recv on an invalid socket");
            return Status::Error;
        };
        socket::map_recv(socket::recv_into(socket, buf))
    }

    /// Send the whole buffer, retrying partial writes until done.
    ///
    /// `Status::Data` guarantees every byte went out. `Block` results are
    /// busy-retried, so this helper belongs on blocking-mode sockets;
    /// non-blocking callers should drive `send_raw` from a selector
    /// instead.
    pub fn send_all(&mut self, buf: &[u8]) -> Status {
        let mut sent = 0;
        while sent < buf.len() {
            match self.send_raw(&buf[sent..]) {
                Status::Data(n) => sent += n,
                Status::Block => continue,
                status => return status,
            }
        }
        Status::Data(sent)
    }

    /// Fill the whole buffer, retrying partial reads until done.
    ///
    /// Same contract as [`send_all`](Self::send_all): `Status::Data` means
    /// the buffer is complete, `Close`/`Error` abort immediately.
    pub fn recv_all(&mut self, buf: &mut [u8]) -> Status {
        let mut received = 0;
        while received < buf.len() {
            match self.recv_raw(&mut buf[received..]) {
                Status::Data(n) => received += n,
                Status::Block => continue,
                status => return status,
            }
        }
        Status::Data(received)
    }

    /// Send one length-prefixed packet.
    ///
    /// Header and payload go out through a single retry-to-completion send
    /// so a packet can never interleave with another from the same socket.
    pub fn send_packet(&mut self, packet: &Packet) -> Status {
        let mut wire = Vec::with_capacity(HEADER_LEN + packet.len());
        wire.extend_from_slice(&packet::encode_header(packet.len() as u64));
        wire.extend_from_slice(packet.as_bytes());
        self.send_all(&wire)
    }

    /// Receive one length-prefixed packet into `packet`.
    ///
    /// The packet is resized to the decoded header length before the
    /// payload is read. A header above [`max_packet_len`] is an error. On
    /// `Close` or `Error` mid-payload the partial packet is discarded;
    /// there is no resumption.
    ///
    /// [`max_packet_len`]: Self::max_packet_len
    pub fn recv_packet(&mut self, packet: &mut Packet) -> Status {
        packet.clear();

        let mut header = [0u8; HEADER_LEN];
        match self.recv_all(&mut header) {
            Status::Data(_) => {}
            status => return status,
        }

        let len = packet::decode_header(header);
        if len > self.max_packet_len {
            tracing::error!(
                len,
                max = self.max_packet_len,
                "incoming packet exceeds the configured ceiling"
            );
            return Status::Error;
        }

        let buf = packet.resize_for_recv(len as usize);
        match self.recv_all(buf) {
            Status::Data(n) => Status::Data(n),
            status => {
                packet.clear();
                status
            }
        }
    }
}

impl Selectable for TcpSocket {
    fn raw_handle(&self) -> Option<RawSocketHandle> {
        self.base.raw()
    }
}

impl Drop for TcpSocket {
    fn drop(&mut self) {
        if let Some(socket) = self.base.get() {
            let _ = socket.shutdown(Shutdown::Both);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Listener on an ephemeral loopback port plus a connected pair.
    fn connected_pair() -> (TcpSocket, TcpSocket) {
        let listener = TcpListener::bind(0, Family::V4);
        assert!(listener.is_valid());
        let port = listener.local_addr().unwrap().port();

        let client = TcpSocket::connect("127.0.0.1", port, Family::V4);
        assert!(client.is_valid());
        let server = listener.accept();
        assert!(server.is_valid());
        (client, server)
    }

    #[test]
    fn listener_binds_ephemeral_port() {
        let listener = TcpListener::bind(0, Family::V4);
        assert!(listener.is_valid());
        let addr = listener.local_addr().unwrap();
        assert!(addr.is_ipv4());
        assert_ne!(addr.port(), 0);
    }

    #[test]
    fn accept_from_reports_peer_address() {
        let listener = TcpListener::bind(0, Family::V4);
        let port = listener.local_addr().unwrap().port();
        let client = TcpSocket::connect("127.0.0.1", port, Family::V4);

        let (server, peer) = listener.accept_from();
        assert!(server.is_valid());
        assert_eq!(peer, client.local_addr());
    }

    #[test]
    fn connect_to_closed_port_yields_invalid_socket() {
        // Bind then drop a listener so the port is known to refuse.
        let port = {
            let listener = TcpListener::bind(0, Family::V4);
            listener.local_addr().unwrap().port()
        };
        let socket = TcpSocket::connect("127.0.0.1", port, Family::V4);
        assert!(!socket.is_valid());
        assert!(socket.remote_addr().is_none());
    }

    #[test]
    fn connect_to_unresolvable_host_yields_invalid_socket() {
        let socket = TcpSocket::connect("host.invalid.", 80, Family::Unspec);
        assert!(!socket.is_valid());
    }

    #[test]
    fn try_connect_reports_the_cause() {
        let err = TcpSocket::try_connect("host.invalid.", 80, Family::Unspec).unwrap_err();
        assert!(matches!(err, SocketError::Resolution { .. }));
    }

    #[test]
    fn packet_round_trip_small_payloads() {
        let (mut client, mut server) = connected_pair();
        for payload in [&b""[..], &b"x"[..], &b"hello world"[..]] {
            let sent = Packet::from(payload);
            assert_eq!(client.send_packet(&sent), Status::Data(HEADER_LEN + payload.len()));

            let mut received = Packet::new();
            assert_eq!(server.recv_packet(&mut received), Status::Data(payload.len()));
            assert_eq!(received.as_bytes(), payload);
        }
    }

    #[test]
    fn packet_round_trip_spanning_many_os_calls() {
        let (client, mut server) = connected_pair();
        let payload: Vec<u8> = (0..1_048_576u32).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        // The payload is far beyond the socket buffers, so the sender must
        // run concurrently with the receiver.
        let sender = std::thread::spawn(move || {
            let mut client = client;
            client.send_packet(&Packet::from(payload))
        });

        let mut received = Packet::new();
        server.set_max_packet_len(2 * 1_048_576);
        assert_eq!(server.recv_packet(&mut received), Status::Data(expected.len()));
        assert_eq!(received.as_bytes(), expected.as_slice());
        assert_eq!(sender.join().unwrap(), Status::Data(HEADER_LEN + expected.len()));
    }

    #[test]
    fn retry_to_completion_transfers_large_buffers() {
        let (client, mut server) = connected_pair();
        let data: Vec<u8> = (0..500_000u32).map(|i| (i % 163) as u8).collect();
        let expected = data.clone();

        let sender = std::thread::spawn(move || {
            let mut client = client;
            client.send_all(&data)
        });

        let mut buf = vec![0u8; expected.len()];
        assert_eq!(server.recv_all(&mut buf), Status::Data(expected.len()));
        assert_eq!(buf, expected);
        assert_eq!(sender.join().unwrap(), Status::Data(expected.len()));
    }

    #[test]
    fn wire_format_is_big_endian_header_then_payload() {
        let (mut client, mut server) = connected_pair();
        client.send_packet(&Packet::from(&b"hello"[..]));

        let mut wire = [0u8; HEADER_LEN + 5];
        assert_eq!(server.recv_all(&mut wire), Status::Data(wire.len()));
        assert_eq!(&wire[..HEADER_LEN], &[0, 0, 0, 0, 0, 0, 0, 5]);
        assert_eq!(&wire[HEADER_LEN..], b"hello");
    }

    #[test]
    fn oversized_header_is_an_error_not_an_allocation() {
        let (mut client, mut server) = connected_pair();
        server.set_max_packet_len(16);

        client.send_packet(&Packet::from(vec![0u8; 64]));
        let mut received = Packet::new();
        assert_eq!(server.recv_packet(&mut received), Status::Error);
        assert!(received.is_empty());
    }

    #[test]
    fn peer_close_is_detected_as_close_status() {
        let (client, mut server) = connected_pair();
        drop(client);

        let mut buf = [0u8; 32];
        assert_eq!(server.recv_all(&mut buf), Status::Close);

        let mut packet = Packet::new();
        assert_eq!(server.recv_packet(&mut packet), Status::Close);
    }

    #[test]
    fn nonblocking_recv_returns_block_when_idle() {
        let (_client, mut server) = connected_pair();
        server.set_blocking(false);

        let mut buf = [0u8; 8];
        assert_eq!(server.recv_raw(&mut buf), Status::Block);
    }

    #[test]
    fn io_on_invalid_socket_is_an_error() {
        let mut socket = TcpSocket::invalid();
        assert_eq!(socket.send_raw(b"x"), Status::Error);
        let mut buf = [0u8; 4];
        assert_eq!(socket.recv_raw(&mut buf), Status::Error);
        assert_eq!(socket.send_all(b"x"), Status::Error);
    }

    #[test]
    fn disconnect_invalidates_the_socket() {
        let (mut client, _server) = connected_pair();
        assert!(client.is_valid());
        client.disconnect();
        assert!(!client.is_valid());
        // A second disconnect is a no-op.
        client.disconnect();
    }

    #[test]
    fn messages_do_not_merge_across_packets() {
        let (mut client, mut server) = connected_pair();
        client.send_packet(&Packet::from(&b"aaa"[..]));
        client.send_packet(&Packet::from(&b"bbb"[..]));

        let mut first = Packet::new();
        let mut second = Packet::new();
        server.recv_packet(&mut first);
        server.recv_packet(&mut second);
        assert_eq!(first.as_bytes(), b"aaa");
        assert_eq!(second.as_bytes(), b"bbb");
    }
}
