//! Cross-platform multiplexed socket layer: TCP/UDP sockets, a readiness
//! selector, and length-prefixed packet framing.
//!
//! The layer is deliberately small and synchronous: sockets block (or not,
//! per [`set_blocking`](tcp::TcpSocket::set_blocking)), the [`Selector`]
//! is the only suspension point, and there are no internal threads. Wire
//! compatibility is exact: every packet is an 8-byte big-endian length
//! header followed by its payload.
//!
//! Constructors report network failures by producing an invalid socket
//! (check `is_valid`) with the cause logged, or through the fallible
//! `try_*` variants. Per-call I/O outcomes travel as [`Status`] values.

pub mod addr;
pub mod error;
pub mod handle;
pub mod packet;
pub mod selector;
pub mod socket;
mod sys;
pub mod tcp;
pub mod udp;

pub use addr::{Family, resolve_local, resolve_remote};
pub use error::SocketError;
pub use packet::{DEFAULT_MAX_PACKET_LEN, Packet, decode_header, encode_header};
pub use selector::{Selector, WaitStatus};
pub use socket::{Selectable, Status};
pub use sys::RawSocketHandle;
pub use tcp::{TcpListener, TcpSocket};
pub use udp::{MAX_DATAGRAM_SIZE, UdpSocket};
