use thiserror::Error;

/// Result type local to fxdeleg-telemetry.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Core(#[from] fxdeleg_core::error::Error),
}
