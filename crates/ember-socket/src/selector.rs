//! Readiness multiplexing over many sockets.
//!
//! A [`Selector`] holds non-owning registrations keyed by native handle
//! value and blocks in [`wait`](Selector::wait) until at least one
//! registered socket is readable. It never closes a socket it watches;
//! callers must remove a socket before destroying it or the registration
//! dangles.
//!
//! The registration set is kept sorted by handle for fast readiness
//! lookup, but lazily: mutations only mark it dirty and the next wait
//! re-sorts once.

use std::io;
use std::time::Duration;

use crate::socket::Selectable;
use crate::sys::{self, PollEntry, RawSocketHandle};

/// Outcome of one [`Selector::wait`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// At least one registered socket is ready.
    Event,
    /// The timeout elapsed with nothing ready.
    Timeout,
    /// The wait failed; the cause has been logged.
    Error,
}

#[derive(Debug)]
struct Registration {
    handle: RawSocketHandle,
    /// Result of the most recent wait; stale before the first one.
    ready: bool,
}

/// Readiness selector over externally-owned sockets.
#[derive(Debug, Default)]
pub struct Selector {
    entries: Vec<Registration>,
    sorted: bool,
}

impl Selector {
    /// An empty selector.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            sorted: true,
        }
    }

    /// Register a socket. Invalid sockets and duplicates are logged and
    /// ignored.
    pub fn add_socket(&mut self, socket: &impl Selectable) {
        let Some(handle) = socket.raw_handle() else {
            tracing::warn!("cannot register an invalid socket");
            return;
        };
        if self.position_of(handle).is_some() {
            tracing::warn!(handle, "socket is already registered");
            return;
        }
        self.entries.push(Registration {
            handle,
            ready: false,
        });
        self.sorted = false;
    }

    /// Remove a socket's registration. Unknown sockets are logged and
    /// ignored.
    pub fn remove_socket(&mut self, socket: &impl Selectable) {
        let Some(handle) = socket.raw_handle() else {
            tracing::warn!("cannot remove an invalid socket");
            return;
        };
        match self.position_of(handle) {
            // Vec::remove keeps the remaining order, so a sorted set
            // stays sorted.
            Some(index) => {
                self.entries.remove(index);
            }
            None => tracing::warn!(handle, "socket was not registered"),
        }
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sorted = true;
    }

    /// Number of registered sockets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no socket is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Block until a registered socket is readable or `timeout` elapses.
    ///
    /// `None` waits indefinitely. After `Event`, per-socket readiness is
    /// available through [`is_ready`](Self::is_ready) until the next wait.
    /// Waiting with no registered sockets is a usage error.
    pub fn wait(&mut self, timeout: Option<Duration>) -> WaitStatus {
        if self.entries.is_empty() {
            tracing::warn!("wait called with no registered sockets");
            return WaitStatus::Error;
        }
        if !self.sorted {
            self.entries.sort_by_key(|entry| entry.handle);
            self.sorted = true;
        }

        let mut poll: Vec<PollEntry> = self
            .entries
            .iter()
            .map(|entry| PollEntry {
                handle: entry.handle,
                readable: false,
            })
            .collect();

        let result = sys::poll_readable(&mut poll, timeout);
        self.record_outcome(result, &poll)
    }

    fn record_outcome(&mut self, result: io::Result<usize>, poll: &[PollEntry]) -> WaitStatus {
        match result {
            Ok(0) => {
                for entry in &mut self.entries {
                    entry.ready = false;
                }
                WaitStatus::Timeout
            }
            Ok(_) => {
                for (entry, polled) in self.entries.iter_mut().zip(poll) {
                    entry.ready = polled.readable;
                }
                WaitStatus::Event
            }
            Err(e) => {
                tracing::error!(error = %e, "selector wait failed");
                // Readiness from an earlier wait must not outlive a
                // failed one.
                for entry in &mut self.entries {
                    entry.ready = false;
                }
                WaitStatus::Error
            }
        }
    }

    /// Whether `socket` was readable in the most recent wait.
    ///
    /// Querying a socket that is not registered is a usage error: it is
    /// logged and reported as not ready.
    pub fn is_ready(&self, socket: &impl Selectable) -> bool {
        let Some(handle) = socket.raw_handle() else {
            tracing::warn!("readiness query on an invalid socket");
            return false;
        };
        match self.position_of(handle) {
            Some(index) => self.entries[index].ready,
            None => {
                tracing::warn!(handle, "readiness query on an unregistered socket");
                false
            }
        }
    }

    fn position_of(&self, handle: RawSocketHandle) -> Option<usize> {
        if self.sorted {
            self.entries
                .binary_search_by_key(&handle, |entry| entry.handle)
                .ok()
        } else {
            self.entries
                .iter()
                .position(|entry| entry.handle == handle)
        }
    }
}
