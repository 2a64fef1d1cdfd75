//! CLI arguments for the `version-gate` binary.

use {
    clap::Parser,
    std::{net::SocketAddr, path::PathBuf},
    tracing::level_filters::LevelFilter,
    version_validation::{ValidationMode, Version},
};

/// Serve an API that only answers clients with a compatible version.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// The log filter.
    #[arg(long, env, default_value = "info")]
    pub log: String,

    /// Log events at or above this level go to stderr instead of stdout.
    #[arg(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Output log events as JSON.
    #[arg(long, env)]
    pub log_json: bool,

    /// The socket address to bind to.
    #[arg(long, env, default_value = "127.0.0.1:7880")]
    pub addr: SocketAddr,

    /// Path to the version validation configuration file. This file should be
    /// in TOML format.
    #[arg(long, env)]
    pub config: Option<PathBuf>,

    /// The application version requests are validated against. Takes
    /// precedence over the configuration file. Defaults to the version of
    /// this binary.
    #[arg(long, env)]
    pub app_version: Option<Version>,

    /// How request versions have to relate to the application version
    /// (`exact-match`, `allow-older`, `allow-older-or-equal`, `allow-newer`,
    /// `allow-newer-or-equal`). Takes precedence over the configuration file.
    #[arg(long, env)]
    pub mode: Option<ValidationMode>,

    /// Let requests without a version header through.
    #[arg(long, env)]
    pub optional: bool,
}
