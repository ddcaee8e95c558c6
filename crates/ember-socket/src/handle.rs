//! Socket handle ownership and process-wide subsystem lifecycle.
//!
//! [`SocketHandle`] owns one native descriptor at most and closes it on
//! drop. Every live handle also holds a [`SubsystemGuard`]; the first guard
//! acquired in the process initializes the platform socket subsystem and
//! the last one dropped tears it down, tracked by an atomic reference
//! count so concurrent construction and destruction stay safe.

use std::sync::atomic::{AtomicUsize, Ordering};

use socket2::Socket;

use crate::sys::{self, RawSocketHandle};

static SUBSYSTEM_REFS: AtomicUsize = AtomicUsize::new(0);

/// Reference-counted hold on the platform socket subsystem.
///
/// There is no way to force a reset: the subsystem goes away only when
/// every guard in the process has been dropped.
#[derive(Debug)]
pub struct SubsystemGuard(());

impl SubsystemGuard {
    /// Acquire a reference, initializing the subsystem on first use.
    pub fn acquire() -> Self {
        if SUBSYSTEM_REFS.fetch_add(1, Ordering::SeqCst) == 0 {
            sys::startup();
        }
        Self(())
    }
}

impl Drop for SubsystemGuard {
    fn drop(&mut self) {
        if SUBSYSTEM_REFS.fetch_sub(1, Ordering::SeqCst) == 1 {
            sys::cleanup();
        }
    }
}

/// Exclusive owner of one native socket descriptor.
///
/// Closing is idempotent and automatic on drop. Moving the handle transfers
/// ownership and leaves nothing behind to double-close; an invalid handle
/// is representable so constructors can report failure without panicking.
#[derive(Debug)]
pub struct SocketHandle {
    inner: Option<Socket>,
    _guard: SubsystemGuard,
}

impl SocketHandle {
    /// Wrap an open socket.
    pub fn new(socket: Socket) -> Self {
        Self {
            inner: Some(socket),
            _guard: SubsystemGuard::acquire(),
        }
    }

    /// A handle owning nothing, produced by failed constructors.
    pub fn invalid() -> Self {
        Self {
            inner: None,
            _guard: SubsystemGuard::acquire(),
        }
    }

    /// Whether a native descriptor is currently owned.
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Borrow the owned socket, if any.
    pub fn get(&self) -> Option<&Socket> {
        self.inner.as_ref()
    }

    /// The native handle value, used for identity and selector keys.
    pub fn raw(&self) -> Option<RawSocketHandle> {
        self.inner.as_ref().map(raw_of)
    }

    /// Close the descriptor now. Safe to call more than once.
    pub fn close(&mut self) {
        // Dropping the socket2 socket closes it.
        self.inner = None;
    }
}

impl PartialEq for SocketHandle {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

#[cfg(unix)]
fn raw_of(socket: &Socket) -> RawSocketHandle {
    use std::os::fd::AsRawFd;
    socket.as_raw_fd()
}

#[cfg(windows)]
fn raw_of(socket: &Socket) -> RawSocketHandle {
    use std::os::windows::io::AsRawSocket;
    socket.as_raw_socket()
}
