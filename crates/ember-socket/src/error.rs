//! Socket error types.
//!
//! These surface only through the fallible `try_*` constructors; per-call
//! I/O outcomes travel as [`Status`](crate::Status) values instead, and the
//! infallible constructors log the error and hand back an invalid socket.

/// Errors from socket construction and address resolution.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// Resolution produced no usable address.
    #[error("no usable address for {host}:{port}")]
    Resolution {
        /// The hostname that failed to resolve.
        host: String,
        /// The requested port.
        port: u16,
    },

    /// Every resolved candidate refused the connection.
    #[error("could not connect to any address of {host}:{port}")]
    Connect {
        /// The target hostname.
        host: String,
        /// The target port.
        port: u16,
    },

    /// No local candidate could be bound.
    #[error("could not bind port {port}")]
    Bind {
        /// The requested local port (0 for ephemeral).
        port: u16,
    },

    /// An OS-level socket operation failed.
    #[error("socket operation failed: {0}")]
    Io(#[from] std::io::Error),
}
