//! POSIX implementation of the native socket operations.

use std::io;
use std::time::Duration;

use super::PollEntry;

/// Native socket descriptor on POSIX systems.
pub type RawSocketHandle = std::os::fd::RawFd;

/// No subsystem initialization is needed on POSIX.
pub fn startup() {}

/// No subsystem teardown is needed on POSIX.
pub fn cleanup() {}

/// poll(2) over the registered handles, watching for readability.
pub fn poll_readable(entries: &mut [PollEntry], timeout: Option<Duration>) -> io::Result<usize> {
    let mut fds: Vec<libc::pollfd> = entries
        .iter()
        .map(|entry| libc::pollfd {
            fd: entry.handle,
            events: libc::POLLIN,
            revents: 0,
        })
        .collect();

    let rc = unsafe {
        libc::poll(
            fds.as_mut_ptr(),
            fds.len() as libc::nfds_t,
            super::timeout_millis(timeout),
        )
    };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    // HUP and ERR also mean "a read will not block" (it reports EOF or the
    // pending error), so they count as readable.
    let ready_mask = libc::POLLIN | libc::POLLHUP | libc::POLLERR;
    for (entry, fd) in entries.iter_mut().zip(&fds) {
        entry.readable = fd.revents & ready_mask != 0;
    }
    Ok(rc as usize)
}
