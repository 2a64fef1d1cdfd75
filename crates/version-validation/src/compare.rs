//! Deciding whether a request version is acceptable relative to the
//! application version.
//!
//! A comparator maps a [`VersionCompareData`] to `None` when the request
//! version is acceptable or to a human readable reason when it is not. The
//! built-in [`ValidationMode`]s are resolved into such a function once, at
//! configuration time, so validating a request never dispatches on the mode.

use {
    serde::Deserialize,
    std::{borrow::Cow, sync::Arc},
};

/// The two versions being compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VersionCompareData<T> {
    pub app_version: T,
    pub request_version: T,
}

impl<T> VersionCompareData<T> {
    pub fn new(app_version: T, request_version: T) -> Self {
        Self {
            app_version,
            request_version,
        }
    }
}

/// Outcome of a comparison: `None` if the request version is accepted,
/// otherwise the reason it was rejected.
pub type CompareResult = Option<Cow<'static, str>>;

/// A resolved comparison function. Shared by every request, so it has to be
/// safe to call concurrently.
pub type CompareFn<T> = Arc<dyn Fn(&VersionCompareData<T>) -> CompareResult + Send + Sync>;

/// Wraps an arbitrary comparison into a [`CompareFn`]. This is the full
/// override: the built-in modes are bypassed entirely.
pub fn compare_fn<T, F>(compare: F) -> CompareFn<T>
where
    F: Fn(&VersionCompareData<T>) -> CompareResult + Send + Sync + 'static,
{
    Arc::new(compare)
}

/// Accepts a request only if its version is one of `versions`, regardless of
/// any ordering.
pub fn allow_list<T>(versions: impl IntoIterator<Item = T>) -> CompareFn<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    let versions = versions.into_iter().collect::<Vec<_>>();
    compare_fn(move |data: &VersionCompareData<T>| {
        (!versions.contains(&data.request_version))
            .then_some(Cow::Borrowed("Request version is not in the list of allowed versions"))
    })
}

/// How the request version has to relate to the application version.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ValidationMode {
    /// Request version must equal the app version.
    #[default]
    ExactMatch,
    /// Request version must be lower than the app version.
    AllowOlder,
    /// Request version must be lower than or equal to the app version.
    AllowOlderOrEqual,
    /// Request version must be newer than the app version.
    AllowNewer,
    /// Request version must be newer than or equal to the app version.
    AllowNewerOrEqual,
}

impl ValidationMode {
    /// Returns the plain function implementing this mode.
    pub fn predicate<T: Ord>(self) -> fn(&VersionCompareData<T>) -> CompareResult {
        match self {
            Self::ExactMatch => validate_exact_match,
            Self::AllowOlder => validate_allow_older,
            Self::AllowOlderOrEqual => validate_allow_older_or_equal,
            Self::AllowNewer => validate_allow_newer,
            Self::AllowNewerOrEqual => validate_allow_newer_or_equal,
        }
    }

    /// Resolves the mode into a shareable comparison function.
    pub fn resolve<T: Ord + 'static>(self) -> CompareFn<T> {
        Arc::new(self.predicate::<T>())
    }
}

fn reject_if(rejected: bool, reason: &'static str) -> CompareResult {
    rejected.then_some(Cow::Borrowed(reason))
}

pub fn validate_exact_match<T: Ord>(data: &VersionCompareData<T>) -> CompareResult {
    reject_if(
        data.request_version != data.app_version,
        "Request version is not equal to app version",
    )
}

pub fn validate_allow_older<T: Ord>(data: &VersionCompareData<T>) -> CompareResult {
    reject_if(
        data.request_version >= data.app_version,
        "Request version is not lower than app version",
    )
}

pub fn validate_allow_older_or_equal<T: Ord>(data: &VersionCompareData<T>) -> CompareResult {
    reject_if(
        data.request_version > data.app_version,
        "Request version is not lower than or equal to app version",
    )
}

pub fn validate_allow_newer<T: Ord>(data: &VersionCompareData<T>) -> CompareResult {
    reject_if(
        data.request_version <= data.app_version,
        "Request version is not newer than app version",
    )
}

pub fn validate_allow_newer_or_equal<T: Ord>(data: &VersionCompareData<T>) -> CompareResult {
    reject_if(
        data.request_version < data.app_version,
        "Request version is not newer than or equal to app version",
    )
}
