//! Length-prefixed packets for TCP streams.
//!
//! Every packet on the wire is an 8-byte big-endian length header followed
//! by exactly that many payload bytes:
//!
//! ```text
//! +--------------------+--------------------+
//! | length (8 bytes)   |   payload          |
//! | u64 big-endian     |   (length bytes)   |
//! +--------------------+--------------------+
//! ```
//!
//! The header does not include its own 8 bytes. A zero-length payload is a
//! valid packet. There is no checksum and no version byte; the format must
//! stay byte-exact for interoperability.

/// Size of the wire header in bytes.
pub const HEADER_LEN: usize = 8;

/// Default per-socket ceiling on a received packet's payload (1 MiB).
///
/// A header announcing more than the ceiling is treated as an error rather
/// than trusted, so a corrupted or hostile peer cannot force an unbounded
/// allocation. The ceiling is configurable per socket.
pub const DEFAULT_MAX_PACKET_LEN: u64 = 1_048_576;

/// Encode a payload length as the 8-byte big-endian wire header.
pub fn encode_header(len: u64) -> [u8; HEADER_LEN] {
    len.to_be_bytes()
}

/// Decode the 8-byte big-endian wire header into a payload length.
pub fn decode_header(header: [u8; HEADER_LEN]) -> u64 {
    u64::from_be_bytes(header)
}

/// One application message: an exclusively-owned byte payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    bytes: Vec<u8>,
}

impl Packet {
    /// An empty packet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to the payload.
    pub fn append(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    /// Discard the payload.
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the payload out of the packet.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Replace the payload with `len` zeroed bytes for an in-place read.
    pub(crate) fn resize_for_recv(&mut self, len: usize) -> &mut [u8] {
        self.bytes.clear();
        self.bytes.resize(len, 0);
        &mut self.bytes
    }
}

impl From<Vec<u8>> for Packet {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for Packet {
    fn from(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_boundary_values() {
        for len in [
            0u64,
            1,
            255,
            256,
            65_535,
            65_536,
            u32::MAX as u64,
            u32::MAX as u64 + 1,
            u64::MAX - 1,
            u64::MAX,
        ] {
            assert_eq!(decode_header(encode_header(len)), len);
        }
    }

    #[test]
    fn header_is_most_significant_byte_first() {
        let header = encode_header(0x0102_0304_0506_0708);
        assert_eq!(header, [1, 2, 3, 4, 5, 6, 7, 8]);
        // Byte i carries (len >> (8 * (7 - i))) & 0xFF.
        let len = 0xDEAD_BEEF_u64;
        let header = encode_header(len);
        for (i, byte) in header.iter().enumerate() {
            assert_eq!(*byte as u64, (len >> (8 * (7 - i))) & 0xFF);
        }
    }

    #[test]
    fn packet_append_and_clear() {
        let mut packet = Packet::new();
        assert!(packet.is_empty());
        packet.append(b"hello ");
        packet.append(b"world");
        assert_eq!(packet.len(), 11);
        assert_eq!(packet.as_bytes(), b"hello world");
        packet.clear();
        assert!(packet.is_empty());
    }

    #[test]
    fn resize_for_recv_discards_old_payload() {
        let mut packet = Packet::from(&b"stale"[..]);
        let buf = packet.resize_for_recv(3);
        assert_eq!(buf, &[0, 0, 0]);
        assert_eq!(packet.len(), 3);
    }

    #[test]
    fn conversions_preserve_bytes() {
        let packet = Packet::from(vec![9, 8, 7]);
        assert_eq!(packet.clone().into_bytes(), vec![9, 8, 7]);
        assert_eq!(Packet::from(&[9, 8, 7][..]), packet);
    }
}
