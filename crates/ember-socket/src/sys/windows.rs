//! WinSock implementation of the native socket operations.

use std::io;
use std::time::Duration;

use windows_sys::Win32::Networking::WinSock::{
    POLLERR, POLLHUP, POLLRDNORM, SOCKET, SOCKET_ERROR, WSADATA, WSAPOLLFD, WSACleanup, WSAPoll,
    WSAStartup,
};

use super::PollEntry;

/// Native socket descriptor on Windows.
pub type RawSocketHandle = std::os::windows::io::RawSocket;

/// Run `WSAStartup` requesting WinSock 2.2.
///
/// This is the one process-fatal condition in the crate: without a working
/// socket subsystem every subsequent call is meaningless.
pub fn startup() {
    let mut data: WSADATA = unsafe { std::mem::zeroed() };
    let rc = unsafe { WSAStartup(0x0202, &mut data) };
    if rc != 0 {
        panic!("failed to initialize the WinSock subsystem (error {rc})");
    }
}

/// Run `WSACleanup` after the last socket is gone.
pub fn cleanup() {
    unsafe {
        WSACleanup();
    }
}

/// WSAPoll over the registered handles, watching for readability.
pub fn poll_readable(entries: &mut [PollEntry], timeout: Option<Duration>) -> io::Result<usize> {
    let mut fds: Vec<WSAPOLLFD> = entries
        .iter()
        .map(|entry| WSAPOLLFD {
            fd: entry.handle as SOCKET,
            events: POLLRDNORM,
            revents: 0,
        })
        .collect();

    let rc = unsafe {
        WSAPoll(
            fds.as_mut_ptr(),
            fds.len() as u32,
            super::timeout_millis(timeout),
        )
    };
    if rc == SOCKET_ERROR {
        return Err(io::Error::last_os_error());
    }

    let ready_mask = POLLRDNORM | POLLHUP | POLLERR;
    for (entry, fd) in entries.iter_mut().zip(&fds) {
        entry.readable = fd.revents & ready_mask != 0;
    }
    Ok(rc as usize)
}
