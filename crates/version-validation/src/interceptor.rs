//! Per request enforcement of the configured version policy.
//!
//! Every request ends in exactly one of four ways:
//! 1. the header is missing: rejected, or let through when validation is
//!    optional,
//! 2. the header cannot be parsed: rejected,
//! 3. the comparison fails: rejected with the comparator's reason,
//! 4. otherwise the request is handed to the next pipeline stage unchanged.
//!
//! Only the first value of a repeated header is ever looked at.
//!
//! Rejections are ordinary values, not errors bubbling up to the host. This
//! module performs no logging; that is left to the glue embedding it.

use {
    crate::{compare::VersionCompareData, options::ValidationOptions},
    std::{borrow::Cow, future::Future, sync::Arc},
};

/// Read access to the headers of an inbound request.
pub trait RequestHeaders {
    /// The first value of the header `name`, `None` if the header is absent.
    /// Header names are matched case-insensitively.
    fn first_header(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl<H: RequestHeaders + ?Sized> RequestHeaders for &H {
    fn first_header(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).first_header(name)
    }
}

/// Why a request was turned away. The `Display` output is the exact response
/// body clients receive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("AppVersion Header is missing")]
    MissingHeader,
    #[error("Version validation problem: Could not parse request version")]
    Unparsable,
    #[error("Version validation problem: {0}")]
    Incompatible(String),
}

impl Rejection {
    /// Every rejection is a bad request.
    pub const STATUS: u16 = 400;

    pub fn status(&self) -> u16 {
        Self::STATUS
    }
}

#[must_use]
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<O> {
    /// The next stage ran and produced this output.
    Continued(O),
    /// The request was rejected and the next stage never ran.
    Rejected(Rejection),
}

impl<O> Outcome<O> {
    pub fn into_result(self) -> Result<O, Rejection> {
        match self {
            Self::Continued(output) => Ok(output),
            Self::Rejected(rejection) => Err(rejection),
        }
    }
}

/// The version validation stage. Cloning is cheap and all clones share the
/// same read-only options.
pub struct VersionValidation<T> {
    options: Arc<ValidationOptions<T>>,
}

impl<T> Clone for VersionValidation<T> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
        }
    }
}

impl<T> VersionValidation<T> {
    pub fn new(options: ValidationOptions<T>) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    pub fn options(&self) -> &ValidationOptions<T> {
        &self.options
    }

    /// Validates the raw header value, `None` meaning the header is absent.
    pub fn check(&self, header: Option<&str>) -> Result<(), Rejection> {
        let Some(raw) = header else {
            return if self.options.is_validation_optional() {
                Ok(())
            } else {
                Err(Rejection::MissingHeader)
            };
        };

        let request_version = self.options.parse(raw).ok_or(Rejection::Unparsable)?;
        // An unknown application version has nothing to be compared against.
        let Some(app_version) = self.options.app_version() else {
            return Ok(());
        };

        match self
            .options
            .compare(&VersionCompareData::new(app_version, request_version))
        {
            Some(reason) if !reason.is_empty() => Err(Rejection::Incompatible(reason.into_owned())),
            _ => Ok(()),
        }
    }

    /// Validates `request` and, if it passes, awaits `next` with the
    /// untouched request.
    pub async fn intercept<R, N, F>(&self, request: R, next: N) -> Outcome<F::Output>
    where
        R: RequestHeaders,
        N: FnOnce(R) -> F,
        F: Future,
    {
        let verdict = self.check(
            request
                .first_header(self.options.header_name())
                .as_deref(),
        );
        match verdict {
            Ok(()) => Outcome::Continued(next(request).await),
            Err(rejection) => Outcome::Rejected(rejection),
        }
    }
}
