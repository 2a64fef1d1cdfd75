//! Serve an API whose routes are only reachable with a compatible client
//! version.

use {
    axum::{
        Router,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::get,
    },
    std::{future::Future, net::SocketAddr},
    tokio::sync::oneshot,
    tower_http::trace::TraceLayer,
    version_validation::{Version, VersionValidation, middleware::with_version_validation},
};

pub struct Api {
    pub addr: SocketAddr,
    pub validation: VersionValidation<Version>,
}

impl Api {
    pub async fn serve(
        self,
        bind: Option<oneshot::Sender<SocketAddr>>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let app = router(self.validation);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(port = local_addr.port(), "serving version gate");
        if let Some(bind) = bind {
            let _ = bind.send(local_addr);
        }
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// `/healthz` and `/api/v1/version` are public so clients can find out which
/// version to send. Everything else requires a compatible version.
pub fn router(validation: VersionValidation<Version>) -> Router {
    let version_header = validation.options().header_name().to_string();

    let protected = Router::new().route("/api/v1/ping", get(ping));
    let public = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/version", get(version))
        .with_state(validation.clone());

    with_version_validation(protected, validation)
        .merge(public)
        .layer(TraceLayer::new_for_http().make_span_with(crate::tracing::make_span(version_header)))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn ping() -> &'static str {
    "pong"
}

async fn version(State(validation): State<VersionValidation<Version>>) -> Response {
    match validation.options().app_version() {
        Some(version) => (StatusCode::OK, version.to_string()).into_response(),
        None => (StatusCode::NOT_FOUND, "application version is unknown").into_response(),
    }
}
