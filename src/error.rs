use std::path::PathBuf;

/// Errors that can occur when reading a board from text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unrecognized color '{ch}' in container {container}")]
    UnknownColor { ch: char, container: usize },

    #[error("container {container} holds {len} units but capacity is {capacity}")]
    Overfull {
        container: usize,
        len: usize,
        capacity: usize,
    },

    #[error("board has no containers")]
    Empty,

    #[error("capacity must be > 0")]
    ZeroCapacity,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
