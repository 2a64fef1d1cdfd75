//! Runs the version validation as an axum middleware.

use {
    crate::interceptor::{Outcome, Rejection, RequestHeaders, VersionValidation},
    axum::{
        Router,
        extract::{Request, State},
        http::{self, HeaderMap, StatusCode},
        middleware::{self, Next},
        response::{IntoResponse, Response},
    },
    std::borrow::Cow,
};

impl RequestHeaders for HeaderMap {
    fn first_header(&self, name: &str) -> Option<Cow<'_, str>> {
        // Header values are not guaranteed to be UTF-8. Replacement characters
        // make such values fail to parse instead of looking absent.
        self.get(name)
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
    }
}

impl<B> RequestHeaders for http::Request<B> {
    fn first_header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.headers().first_header(name)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status()).unwrap_or(StatusCode::BAD_REQUEST);
        (status, self.to_string()).into_response()
    }
}

/// Middleware function for [`axum::middleware::from_fn_with_state`].
pub async fn validate_version<T: 'static>(
    State(validation): State<VersionValidation<T>>,
    request: Request,
    next: Next,
) -> Response {
    match validation.intercept(request, |request| next.run(request)).await {
        Outcome::Continued(response) => response,
        Outcome::Rejected(rejection) => {
            tracing::debug!(
                %rejection,
                header = validation.options().header_name(),
                "rejected request version"
            );
            rejection.into_response()
        }
    }
}

/// Puts every route of `router` behind the version validation. Routes merged
/// into the router afterwards are not affected.
pub fn with_version_validation<S, T>(
    router: Router<S>,
    validation: VersionValidation<T>,
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    T: 'static,
{
    router.layer(middleware::from_fn_with_state(
        validation,
        validate_version::<T>,
    ))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            compare::{self, ValidationMode},
            options::ValidationOptions,
            version::Version,
        },
        axum::{body::Body, http::HeaderValue, routing::get},
        http_body_util::BodyExt,
        std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        tower::ServiceExt,
    };

    fn app<T: 'static>(validation: VersionValidation<T>, hits: Arc<AtomicUsize>) -> Router {
        let protected = Router::new().route(
            "/ping",
            get(move || async move {
                hits.fetch_add(1, Ordering::SeqCst);
                "pong"
            }),
        );
        with_version_validation(protected, validation).route("/healthz", get(|| async { "ok" }))
    }

    fn request(uri: &str, headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(app: Router, request: Request) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn exact(app_version: &str) -> VersionValidation<Version> {
        VersionValidation::new(ValidationOptions::for_mode(
            app_version.parse().unwrap(),
            ValidationMode::ExactMatch,
        ))
    }

    #[tokio::test]
    async fn matching_version_reaches_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(exact("1.0.0"), hits.clone());

        let (status, body) = send(app, request("/ping", &[("AppVersion", "1.0.0")])).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "pong");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mismatching_version_is_rejected() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(exact("1.0.0"), hits.clone());

        let (status, body) = send(app, request("/ping", &[("AppVersion", "0.9.0")])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            "Version validation problem: Request version is not equal to app version"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = app(exact("1.0.0"), hits.clone());

        let (status, body) = send(app, request("/ping", &[])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "AppVersion Header is missing");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejection_is_plain_text() {
        let app = app(exact("1.0.0"), Default::default());
        let response = app
            .oneshot(request("/ping", &[("AppVersion", "nope")]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn unprotected_routes_are_untouched() {
        let app = app(exact("1.0.0"), Default::default());
        let (status, body) = send(app, request("/healthz", &[])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn header_lookup_ignores_case() {
        let app = app(exact("1.0.0"), Default::default());
        let (status, _) = send(app, request("/ping", &[("appversion", "1.0.0")])).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn first_of_repeated_headers_is_used() {
        let validation = exact("1.0.0");

        let (status, _) = send(
            app(validation.clone(), Default::default()),
            request("/ping", &[("AppVersion", "1.0.0"), ("AppVersion", "2.0.0")]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            app(validation, Default::default()),
            request("/ping", &[("AppVersion", "2.0.0"), ("AppVersion", "1.0.0")]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_utf8_header_is_unparsable() {
        let mut request = request("/ping", &[]);
        request
            .headers_mut()
            .insert("AppVersion", HeaderValue::from_bytes(b"1.\xff").unwrap());

        let (status, body) = send(app(exact("1.0"), Default::default()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            "Version validation problem: Could not parse request version"
        );
    }

    #[tokio::test]
    async fn custom_header_and_comparison() {
        let options = ValidationOptions::builder()
            .app_version("stable".to_string())
            .parse_with(|raw| Some(raw.to_string()))
            .compare_with(compare::allow_list(["stable".to_string(), "beta".to_string()]))
            .header_name("X-Channel")
            .build()
            .unwrap();
        let validation = VersionValidation::new(options);

        let (status, _) = send(
            app(validation.clone(), Default::default()),
            request("/ping", &[("X-Channel", "beta")]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            app(validation, Default::default()),
            request("/ping", &[("AppVersion", "beta")]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "AppVersion Header is missing");
    }
}
