use std::path::PathBuf;

/// Invalid version validation setup. Always raised while the options are
/// being constructed, never while a request is validated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no application version or application version resolver was configured")]
    MissingAppVersion,
    #[error("no function to parse request versions was configured")]
    MissingParser,
    #[error("neither a validation mode nor a custom comparison function was configured")]
    MissingComparator,
    #[error("{0:?} is not a valid HTTP header name")]
    InvalidHeaderName(String),
    #[error("invalid application version {version:?}: {reason}")]
    InvalidAppVersion { version: String, reason: String },
    #[error("I/O error while reading {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid version validation settings")]
    Toml(#[from] toml::de::Error),
}
