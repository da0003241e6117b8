//! Error types for auer-cfg.

use thiserror::Error;

/// Everything that can end an invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot reach the PBX: {0}")]
    Connection(String),

    #[error("the PBX rejected the admin credentials for {0}")]
    Authentication(String),

    #[error("unexpected response from the PBX: {0}")]
    Protocol(String),

    #[error("cannot parse PBX page ({0}); the firmware may not be supported")]
    Parse(String),

    #[error("{0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no configuration file found (looked in: {0})")]
    NoConfigFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
