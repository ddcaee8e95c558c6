//! Hostname and wildcard address resolution.
//!
//! Resolution never fails loudly: an unresolvable name yields an empty
//! candidate list (with the cause logged) and the enclosing constructor
//! produces an invalid socket. With [`Family::Unspec`] both IPv4 and IPv6
//! candidates are offered and the first one that works wins.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};

use serde::{Deserialize, Serialize};

/// Address family filter for resolution and socket construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Accept both IPv4 and IPv6.
    #[default]
    Unspec,
    /// IPv4 only.
    V4,
    /// IPv6 only.
    V6,
}

impl Family {
    /// Whether `addr` belongs to this family.
    pub fn matches(self, addr: &SocketAddr) -> bool {
        match self {
            Family::Unspec => true,
            Family::V4 => addr.is_ipv4(),
            Family::V6 => addr.is_ipv6(),
        }
    }

    /// The family of a concrete address.
    pub fn of(addr: &SocketAddr) -> Self {
        if addr.is_ipv6() { Family::V6 } else { Family::V4 }
    }
}

/// Resolve a remote hostname and port into connect candidates.
///
/// Candidates arrive in resolver order, filtered to `family`. An empty
/// vector means no usable address; the failure is already logged.
pub fn resolve_remote(host: &str, port: u16, family: Family) -> Vec<SocketAddr> {
    match (host, port).to_socket_addrs() {
        Ok(addrs) => {
            let candidates: Vec<SocketAddr> =
                addrs.filter(|addr| family.matches(addr)).collect();
            if candidates.is_empty() {
                tracing::error!(host, port, ?family, "no address of the requested family");
            }
            candidates
        }
        Err(e) => {
            tracing::error!(host, port, error = %e, "address resolution failed");
            Vec::new()
        }
    }
}

/// Wildcard bind candidates for a local port.
///
/// `Unspec` offers the IPv6 any-address first so a dual-stack bind is
/// preferred, falling back to IPv4-only.
pub fn resolve_local(port: u16, family: Family) -> Vec<SocketAddr> {
    let v6 = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port);
    let v4 = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    match family {
        Family::Unspec => vec![v6, v4],
        Family::V6 => vec![v6],
        Family::V4 => vec![v4],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_resolves_to_loopback() {
        let addrs = resolve_remote("localhost", 4242, Family::Unspec);
        assert!(!addrs.is_empty());
        assert!(addrs.iter().all(|a| a.ip().is_loopback()));
        assert!(addrs.iter().all(|a| a.port() == 4242));
    }

    #[test]
    fn family_filter_removes_mismatches() {
        let v4 = resolve_remote("127.0.0.1", 1, Family::V4);
        assert!(v4.iter().all(|a| a.is_ipv4()));
        // A literal IPv4 address can never satisfy a V6 filter.
        let v6 = resolve_remote("127.0.0.1", 1, Family::V6);
        assert!(v6.is_empty());
    }

    #[test]
    fn unresolvable_host_yields_empty_list() {
        let addrs = resolve_remote("host.invalid.", 80, Family::Unspec);
        assert!(addrs.is_empty());
    }

    #[test]
    fn local_unspec_prefers_dual_stack() {
        let addrs = resolve_local(7777, Family::Unspec);
        assert_eq!(addrs.len(), 2);
        assert!(addrs[0].is_ipv6());
        assert!(addrs[1].is_ipv4());
        assert!(addrs.iter().all(|a| a.port() == 7777));
    }

    #[test]
    fn local_single_family_is_exact() {
        assert!(resolve_local(0, Family::V4)[0].is_ipv4());
        assert!(resolve_local(0, Family::V6)[0].is_ipv6());
    }

    #[test]
    fn family_of_concrete_addresses() {
        let v4: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let v6: SocketAddr = "[::1]:1".parse().unwrap();
        assert_eq!(Family::of(&v4), Family::V4);
        assert_eq!(Family::of(&v6), Family::V6);
        assert!(Family::Unspec.matches(&v4));
        assert!(Family::Unspec.matches(&v6));
    }
}
