//! Rejects requests whose declared version is incompatible with the version
//! of the application serving them.
//!
//! The client version is read from a single request header (`AppVersion` by
//! default), parsed into some version type `T` and compared against the
//! application version with either one of the built-in
//! [`ValidationMode`]s or a custom comparison function. Incompatible requests
//! are answered with `400 Bad Request` and never reach the next pipeline
//! stage.
//!
//! The [`interceptor`] does not depend on any web framework. The
//! [`middleware`] module plugs it into axum.

pub mod compare;
mod error;
pub mod interceptor;
#[cfg(feature = "axum")]
pub mod middleware;
pub mod options;
pub mod settings;
pub mod version;

pub use {
    compare::{CompareFn, ValidationMode, VersionCompareData},
    error::ConfigError,
    interceptor::{Outcome, Rejection, RequestHeaders, VersionValidation},
    options::{AppVersion, ValidationOptions},
    settings::Settings,
    version::Version,
};
