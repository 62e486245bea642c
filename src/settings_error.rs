use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading settings from configuration.
///
/// Runtime operations on [`ContextSettings`](crate::ContextSettings) never fail;
/// only the configuration layer and trace level parsing return this type.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Unknown diagnostics trace level: {0}")]
    UnknownTraceLevel(String),
}
