use {
    axum::{body::Body, http::Request},
    std::io::IsTerminal,
    time::macros::format_description,
    tracing::{Span, info_span, level_filters::LevelFilter},
    tracing_subscriber::{
        EnvFilter,
        Layer,
        Registry,
        fmt::{time::UtcTime, writer::MakeWriterExt as _},
        prelude::*,
        util::SubscriberInitExt,
    },
};

/// Initializes the global tracing subscriber.
/// `env_filter` has similar syntax to env_logger. It is documented at
/// https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html
pub fn initialize(env_filter: &str, stderr_threshold: LevelFilter, use_json_format: bool) {
    set_tracing_subscriber(env_filter, stderr_threshold, use_json_format);
    std::panic::set_hook(Box::new(tracing_panic_hook));
}

/// Like [`initialize`], but can be called multiple times in a row. Later calls
/// are ignored.
///
/// Useful for tests.
#[cfg(test)]
pub fn initialize_reentrant(env_filter: &str) {
    // The tracing subscriber below is global object so initializing it again in the
    // same process by a different thread would fail.
    static ONCE: std::sync::Once = std::sync::Once::new();
    ONCE.call_once(|| {
        set_tracing_subscriber(env_filter, LevelFilter::ERROR, false);
        std::panic::set_hook(Box::new(tracing_panic_hook));
    });
}

fn set_tracing_subscriber(env_filter: &str, stderr_threshold: LevelFilter, use_json_format: bool) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(
            std::io::stdout
                .with_min_level(
                    stderr_threshold
                        .into_level()
                        .unwrap_or(tracing::Level::ERROR),
                )
                .or_else(std::io::stderr),
        )
        .with_timer(UtcTime::new(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        )));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if use_json_format {
        fmt_layer.json().boxed()
    } else {
        fmt_layer.with_ansi(std::io::stdout().is_terminal()).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(EnvFilter::new(env_filter)))
        .init();
    tracing::info!(use_json_format, "initialized tracing");
}

/// Panic hook that prints roughly the same message as the default panic hook
/// but uses tracing:error instead of stderr.
fn tracing_panic_hook(panic: &std::panic::PanicHookInfo<'_>) {
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("<unnamed>");
    let backtrace = std::backtrace::Backtrace::force_capture();
    tracing::error!("thread '{name}' {panic}\nstack backtrace:\n{backtrace}");
}

/// Builds spans for incoming requests that record the declared client
/// version, so rejections can be traced back to the offending client.
pub fn make_span(version_header: String) -> impl Fn(&Request<Body>) -> Span + Clone {
    move |request: &Request<Body>| {
        let uri = request.uri();
        let method = request.method();
        let client_version = request
            .headers()
            .get(version_header.as_str())
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

        info_span!("incoming request", ?uri, ?method, ?client_version)
    }
}
