//! State and operations shared by every socket type.
//!
//! [`SocketBase`] carries the owned handle plus the blocking flag;
//! [`Status`] is the outcome of one I/O attempt; [`Selectable`] is the seam
//! the selector uses to key sockets by native handle.

use std::io;
use std::mem::MaybeUninit;
use std::net::SocketAddr;

use socket2::Socket;

use crate::handle::SocketHandle;
use crate::sys::RawSocketHandle;

/// Outcome of a single I/O attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Bytes were transferred; the count is attached.
    Data(usize),
    /// The operation should be retried.
    ///
    /// Reported when a non-blocking call would block, and also when a
    /// signal interrupts a blocking call before any bytes move; that is
    /// the one case where a blocking-mode caller can see it. The
    /// retry-to-completion helpers absorb both.
    Block,
    /// The peer closed the connection in an orderly fashion.
    Close,
    /// Unrecoverable failure; the cause has been logged.
    Error,
}

/// Anything the selector can register: exposes the native handle value.
pub trait Selectable {
    /// The native handle, or `None` for an invalid socket.
    fn raw_handle(&self) -> Option<RawSocketHandle>;
}

/// Handle ownership and mode shared by TCP and UDP sockets.
#[derive(Debug)]
pub struct SocketBase {
    handle: SocketHandle,
    blocking: bool,
}

impl SocketBase {
    /// Take ownership of an open socket. Sockets start in blocking mode.
    pub(crate) fn open(socket: Socket) -> Self {
        Self {
            handle: SocketHandle::new(socket),
            blocking: true,
        }
    }

    /// A base owning nothing, for failed constructors.
    pub(crate) fn invalid() -> Self {
        Self {
            handle: SocketHandle::invalid(),
            blocking: true,
        }
    }

    /// Whether a native descriptor is owned.
    pub fn is_valid(&self) -> bool {
        self.handle.is_valid()
    }

    /// Borrow the underlying socket, if any.
    pub(crate) fn get(&self) -> Option<&Socket> {
        self.handle.get()
    }

    /// The native handle value.
    pub fn raw(&self) -> Option<RawSocketHandle> {
        self.handle.raw()
    }

    /// Close the descriptor now.
    pub(crate) fn close(&mut self) {
        self.handle.close();
    }

    /// The locally bound endpoint, or `None` on failure (logged).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        let socket = self.get()?;
        match socket.local_addr() {
            Ok(addr) => addr.as_socket(),
            Err(e) => {
                tracing::error!(error = %e, "failed to query the local address");
                None
            }
        }
    }

    /// Toggle OS-level blocking mode. Failure is logged, not returned.
    pub fn set_blocking(&mut self, blocking: bool) {
        let Some(socket) = self.get() else {
            tracing::warn!("cannot change blocking mode of an invalid socket");
            return;
        };
        match socket.set_nonblocking(!blocking) {
            Ok(()) => self.blocking = blocking,
            Err(e) => tracing::error!(error = %e, "failed to change blocking mode"),
        }
    }

    /// Whether the socket is in blocking mode.
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }
}

/// recv into an initialized buffer through socket2's `MaybeUninit` API.
pub(crate) fn recv_into(socket: &Socket, buf: &mut [u8]) -> io::Result<usize> {
    // SAFETY: `&mut [u8]` and `&mut [MaybeUninit<u8>]` have the same
    // layout, and recv only ever writes into the buffer.
    let uninit = unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) };
    socket.recv(uninit)
}

/// recv_from into an initialized buffer, returning the sender.
pub(crate) fn recv_from_into(
    socket: &Socket,
    buf: &mut [u8],
) -> io::Result<(usize, socket2::SockAddr)> {
    // SAFETY: same layout argument as `recv_into`.
    let uninit = unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) };
    socket.recv_from(uninit)
}

/// Map one OS send result onto a [`Status`].
pub(crate) fn map_send(result: io::Result<usize>) -> Status {
    match result {
        Ok(n) => Status::Data(n),
        Err(e) => map_error(e, "send"),
    }
}

/// Map one OS recv result onto a [`Status`]. Zero bytes means the peer
/// performed an orderly close.
pub(crate) fn map_recv(result: io::Result<usize>) -> Status {
    match result {
        Ok(0) => Status::Close,
        Ok(n) => Status::Data(n),
        Err(e) => map_error(e, "recv"),
    }
}

fn map_error(e: io::Error, op: &str) -> Status {
    use io::ErrorKind;
    match e.kind() {
        ErrorKind::WouldBlock | ErrorKind::Interrupted => Status::Block,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
            Status::Close
        }
        _ => {
            tracing::error!(error = %e, "socket {op} failed");
            Status::Error
        }
    }
}
