use std::io;
use thiserror::Error;

/// Errors raised while discovering, merging or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file exists but could not be read.
    #[error("cannot read config file {path}: {source}")]
    ReadError {
        /// The file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A config file is above the size limit.
    #[error("config file {path} is {size} bytes; the limit is {limit}")]
    FileTooLarge {
        /// The file.
        path: String,
        /// Its size in bytes.
        size: u64,
        /// The limit in bytes.
        limit: u64,
    },

    /// A layer, or the merged tree, is not valid TOML for [`crate::Config`].
    #[error("invalid TOML in {path}: {source}")]
    ParseError {
        /// The file, or a placeholder for the defaults and merged tree.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range.
    #[error("invalid value for {field}: {message}")]
    ValidationError {
        /// Dotted field path, e.g. `gateway.token_ttl_secs`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The user layer was requested but there is no home directory.
    #[error("no home directory to look for ~/.bqgate/config.toml in")]
    NoHomeDir,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
