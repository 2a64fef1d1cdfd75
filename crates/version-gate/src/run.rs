#[cfg(unix)]
use tokio::signal::unix::{self, SignalKind};
use {
    crate::{api, cli},
    anyhow::{Context, Result},
    clap::Parser,
    std::net::SocketAddr,
    tokio::sync::oneshot,
    version_validation::{
        AppVersion,
        ConfigError,
        Settings,
        ValidationOptions,
        Version,
        VersionValidation,
        settings,
    },
};

pub async fn start(args: impl Iterator<Item = String>) {
    if let Err(err) = run(args, None).await {
        tracing::error!(?err, "version gate stopped");
        std::process::exit(1);
    }
}

pub async fn run(
    args: impl Iterator<Item = String>,
    bind: Option<oneshot::Sender<SocketAddr>>,
) -> Result<()> {
    let args = cli::Args::parse_from(args);
    crate::tracing::initialize(&args.log, args.log_stderr_threshold, args.log_json);
    tracing::info!("running version gate with {args:#?}");

    let settings = match &args.config {
        Some(path) => settings::load(path)
            .await
            .with_context(|| format!("failed to load configuration {path:?}"))?,
        None => Settings::default(),
    };
    let options = validation_options(settings, &args)?;
    tracing::info!(?options, app_version = ?options.app_version(), "validating client versions");

    api::Api {
        addr: args.addr,
        validation: VersionValidation::new(options),
    }
    .serve(bind, shutdown_signal())
    .await
    .context("serving API")
}

/// Applies the command line overrides to the configuration file and resolves
/// the result into validation options.
fn validation_options(
    mut settings: Settings,
    args: &cli::Args,
) -> Result<ValidationOptions<Version>> {
    if let Some(app_version) = args.app_version {
        settings.app_version = Some(app_version);
    }
    if let Some(mode) = args.mode {
        settings.mode = mode;
    }
    if args.optional {
        settings.optional = true;
    }

    let package_version = package_version(env!("CARGO_PKG_VERSION"))?;
    settings
        .into_options(AppVersion::fixed(package_version))
        .context("invalid version validation configuration")
}

/// The version of this binary in `major.minor.patch` form. Pre-release and
/// build metadata are dropped.
fn package_version(raw: &str) -> Result<Version, ConfigError> {
    let core = raw.split(['-', '+']).next().unwrap_or(raw);
    core.parse().map_err(|err| ConfigError::InvalidAppVersion {
        version: raw.to_string(),
        reason: format!("{err}"),
    })
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Intercept main signals for graceful shutdown.
    // Kubernetes sends sigterm, whereas locally sigint (ctrl-c) is most common.
    let (Ok(mut interrupt), Ok(mut terminate)) = (
        unix::signal(SignalKind::interrupt()),
        unix::signal(SignalKind::terminate()),
    ) else {
        tracing::warn!("failed to install signal handlers, graceful shutdown is disabled");
        return std::future::pending().await;
    };
    tokio::select! {
        _ = interrupt.recv() => (),
        _ = terminate.recv() => (),
    };
    tracing::info!("gracefully shutting down");
}

#[cfg(windows)]
async fn shutdown_signal() {
    // We don't support signal handling on Windows.
    std::future::pending().await
}
