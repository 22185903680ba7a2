use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error.
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Errors raised while assembling a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid wind gust deviation {0}")]
    InvalidGust(f32),

    #[error("world bounds must be positive, got {w}x{h}")]
    InvalidBounds { w: f32, h: f32 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}
