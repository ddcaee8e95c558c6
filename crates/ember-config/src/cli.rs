//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use ember_socket::Family;

use crate::Config;

/// Relay server command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "ember-relay", about = "Packet relay server")]
pub struct CliArgs {
    /// Listen port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Address family (any, ipv4, ipv6).
    #[arg(long, value_parser = parse_family)]
    pub family: Option<Family>,

    /// Per-packet payload ceiling in bytes.
    #[arg(long)]
    pub max_packet_bytes: Option<u64>,

    /// Maximum concurrently connected clients.
    #[arg(long)]
    pub max_clients: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn parse_family(value: &str) -> Result<Family, String> {
    match value {
        "any" | "unspec" => Ok(Family::Unspec),
        "ipv4" | "v4" => Ok(Family::V4),
        "ipv6" | "v6" => Ok(Family::V6),
        other => Err(format!("unknown address family: {other}")),
    }
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.network.listen_port = port;
        }
        if let Some(family) = args.family {
            self.network.family = family;
        }
        if let Some(max) = args.max_packet_bytes {
            self.network.max_packet_bytes = max;
        }
        if let Some(max) = args.max_clients {
            self.network.max_clients = max;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_values_override_config() {
        let mut config = Config::default();
        let args = CliArgs {
            port: Some(4000),
            family: Some(Family::V6),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.network.listen_port, 4000);
        assert_eq!(config.network.family, Family::V6);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults.
        assert_eq!(config.network.max_clients, 32);
    }

    #[test]
    fn absent_cli_values_change_nothing() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn family_parser_accepts_aliases() {
        assert_eq!(parse_family("any").unwrap(), Family::Unspec);
        assert_eq!(parse_family("ipv4").unwrap(), Family::V4);
        assert_eq!(parse_family("v6").unwrap(), Family::V6);
        assert!(parse_family("ipx").is_err());
    }
}
