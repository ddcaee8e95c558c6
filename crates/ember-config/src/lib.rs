//! Configuration for the Ember networking tools.
//!
//! Runtime-configurable settings that persist to disk as RON files, with
//! CLI overrides via clap and forward-compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{Config, DebugConfig, NetworkConfig, default_config_dir};
pub use error::ConfigError;
