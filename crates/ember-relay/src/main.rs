//! Packet relay server: every packet a client sends is forwarded to every
//! other connected client over length-prefixed TCP framing.

mod server;

use clap::Parser;
use ember_config::{CliArgs, Config};

use crate::server::RelayServer;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().or_else(ember_config::default_config_dir);
    let mut config = match &config_dir {
        Some(dir) => Config::load_or_create(dir).unwrap_or_else(|e| {
            eprintln!("falling back to default config: {e}");
            Config::default()
        }),
        None => Config::default(),
    };
    config.apply_cli_overrides(&args);

    ember_log::init_logging(Some(&config));

    let mut server = match RelayServer::bind(&config.network) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "could not start the relay");
            std::process::exit(1);
        }
    };
    tracing::info!(
        port = server.local_port().unwrap_or(config.network.listen_port),
        family = ?config.network.family,
        "relay listening"
    );

    loop {
        server.poll_once(None);
    }
}
