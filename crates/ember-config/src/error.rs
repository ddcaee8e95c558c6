//! Error type for configuration persistence.

/// Failures while loading or persisting `config.ron`.
///
/// Construction of the in-memory [`Config`](crate::Config) itself cannot
/// fail; only the disk round-trip can.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("could not read config file: {0}")]
    Read(#[source] std::io::Error),

    /// The config directory or file could not be written.
    #[error("could not write config file: {0}")]
    Write(#[source] std::io::Error),

    /// The file's RON content did not parse as a config.
    #[error("invalid config file: {0}")]
    Parse(#[source] ron::error::SpannedError),

    /// The in-memory config could not be rendered as RON.
    #[error("could not serialize config: {0}")]
    Serialize(#[source] ron::Error),
}
