//! Native socket operations behind a platform-neutral interface.
//!
//! Everything OS-specific lives in the two submodules; the public socket
//! and selector types only ever call the functions re-exported here, never
//! `libc` or WinSock directly.

use std::io;
use std::time::Duration;

#[cfg(unix)]
#[path = "unix.rs"]
mod platform;

#[cfg(windows)]
#[path = "windows.rs"]
mod platform;

pub use platform::RawSocketHandle;

/// One slot in a readiness poll: the handle to watch and, after a
/// successful poll, whether it is readable.
#[derive(Debug, Clone, Copy)]
pub struct PollEntry {
    /// Native handle value.
    pub handle: RawSocketHandle,
    /// Set by [`poll_readable`]; stale before the first poll.
    pub readable: bool,
}

/// Initialize the platform socket subsystem.
///
/// Called once per process by the first [`SubsystemGuard`] acquisition.
/// A no-op on POSIX; runs `WSAStartup` on Windows. Inability to bring the
/// subsystem up makes every later socket call meaningless, so failure
/// aborts the process.
///
/// [`SubsystemGuard`]: crate::handle::SubsystemGuard
pub fn startup() {
    platform::startup();
}

/// Tear down the platform socket subsystem (last guard released).
pub fn cleanup() {
    platform::cleanup();
}

/// Block until at least one entry is readable or the timeout elapses.
///
/// `None` means wait indefinitely. Returns the number of readable entries
/// (0 on timeout) and records per-entry readability in `entries`. EINTR is
/// retried internally with the original timeout.
pub fn poll_readable(entries: &mut [PollEntry], timeout: Option<Duration>) -> io::Result<usize> {
    loop {
        match platform::poll_readable(entries, timeout) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Clamp an optional duration to the millisecond count poll(2)-style APIs
/// take, with `-1` meaning infinite.
pub(crate) fn timeout_millis(timeout: Option<Duration>) -> i32 {
    match timeout {
        None => -1,
        // A sub-millisecond timeout still has to poll at least once.
        Some(d) => d.as_millis().clamp(1, i32::MAX as u128) as i32,
    }
}
