//! Configuration of the version validation.
//!
//! Options are assembled once at startup and only read afterwards, so a
//! single instance can be shared by all concurrently validated requests.

use {
    crate::{
        compare::{CompareFn, CompareResult, ValidationMode, VersionCompareData},
        error::ConfigError,
        version::Version,
    },
    std::{fmt, str::FromStr, sync::Arc},
};

/// Header that carries the request version unless configured otherwise.
pub const DEFAULT_HEADER_NAME: &str = "AppVersion";

/// Parses the raw header value into a version. `None` means unparsable.
pub type ParseFn<T> = Arc<dyn Fn(&str) -> Option<T> + Send + Sync>;

/// Source of the application version the request version is compared
/// against. Resolved for every request, so it may change at runtime.
pub struct AppVersion<T>(Arc<dyn Fn() -> Option<T> + Send + Sync>);

impl<T> AppVersion<T> {
    pub fn fixed(version: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self(Arc::new(move || Some(version.clone())))
    }

    /// Late bound application version. Returning `None` means the version is
    /// unknown, in which case requests are not compared at all.
    pub fn resolve_with<F>(resolve: F) -> Self
    where
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        Self(Arc::new(resolve))
    }

    pub fn get(&self) -> Option<T> {
        (self.0)()
    }
}

impl<T> Clone for AppVersion<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

pub struct ValidationOptions<T> {
    app_version: AppVersion<T>,
    compare: CompareFn<T>,
    parse: ParseFn<T>,
    header_name: String,
    is_validation_optional: bool,
}

impl<T> ValidationOptions<T> {
    /// Options reading the default header and requiring it on every request.
    pub fn new(app_version: AppVersion<T>, compare: CompareFn<T>, parse: ParseFn<T>) -> Self {
        Self {
            app_version,
            compare,
            parse,
            header_name: DEFAULT_HEADER_NAME.to_string(),
            is_validation_optional: false,
        }
    }

    pub fn builder() -> Builder<T> {
        Builder::default()
    }

    pub fn with_header_name(mut self, header_name: impl Into<String>) -> Result<Self, ConfigError> {
        self.header_name = validate_header_name(header_name.into())?;
        Ok(self)
    }

    /// Whether requests without the version header are let through.
    pub fn with_optional(mut self, is_validation_optional: bool) -> Self {
        self.is_validation_optional = is_validation_optional;
        self
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn is_validation_optional(&self) -> bool {
        self.is_validation_optional
    }

    pub fn app_version(&self) -> Option<T> {
        self.app_version.get()
    }

    pub fn parse(&self, raw: &str) -> Option<T> {
        (self.parse)(raw)
    }

    pub fn compare(&self, data: &VersionCompareData<T>) -> CompareResult {
        (self.compare)(data)
    }
}

impl ValidationOptions<Version> {
    /// Options for the structured [`Version`] type validated by one of the
    /// built-in modes.
    pub fn for_mode(app_version: Version, mode: ValidationMode) -> Self {
        Self::new(
            AppVersion::fixed(app_version),
            mode.resolve(),
            Arc::new(|raw: &str| raw.parse::<Version>().ok()),
        )
    }
}

impl<T> fmt::Debug for ValidationOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOptions")
            .field("header_name", &self.header_name)
            .field("is_validation_optional", &self.is_validation_optional)
            .finish_non_exhaustive()
    }
}

/// Step by step construction of [`ValidationOptions`]. Missing pieces are
/// reported by [`Builder::build`].
pub struct Builder<T> {
    app_version: Option<AppVersion<T>>,
    mode: Option<CompareFn<T>>,
    custom: Option<CompareFn<T>>,
    parse: Option<ParseFn<T>>,
    header_name: String,
    is_validation_optional: bool,
}

impl<T> Default for Builder<T> {
    fn default() -> Self {
        Self {
            app_version: None,
            mode: None,
            custom: None,
            parse: None,
            header_name: DEFAULT_HEADER_NAME.to_string(),
            is_validation_optional: false,
        }
    }
}

impl<T> Builder<T> {
    pub fn app_version(mut self, version: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.app_version = Some(AppVersion::fixed(version));
        self
    }

    pub fn app_version_with<F>(mut self, resolve: F) -> Self
    where
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        self.app_version = Some(AppVersion::resolve_with(resolve));
        self
    }

    pub fn parse_with<F>(mut self, parse: F) -> Self
    where
        F: Fn(&str) -> Option<T> + Send + Sync + 'static,
    {
        self.parse = Some(Arc::new(parse));
        self
    }

    /// Parses request versions with `T`'s [`FromStr`] implementation.
    pub fn parse_from_str(self) -> Self
    where
        T: FromStr + 'static,
    {
        self.parse_with(|raw| raw.parse().ok())
    }

    /// Replaces the built-in modes with an arbitrary comparison. Takes
    /// precedence over [`Builder::mode`] regardless of call order.
    pub fn compare_with(mut self, compare: CompareFn<T>) -> Self {
        self.custom = Some(compare);
        self
    }

    pub fn header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into();
        self
    }

    pub fn optional(mut self, is_validation_optional: bool) -> Self {
        self.is_validation_optional = is_validation_optional;
        self
    }

    pub fn build(self) -> Result<ValidationOptions<T>, ConfigError> {
        let app_version = self.app_version.ok_or(ConfigError::MissingAppVersion)?;
        let parse = self.parse.ok_or(ConfigError::MissingParser)?;
        let compare = self
            .custom
            .or(self.mode)
            .ok_or(ConfigError::MissingComparator)?;
        Ok(ValidationOptions {
            app_version,
            compare,
            parse,
            header_name: validate_header_name(self.header_name)?,
            is_validation_optional: self.is_validation_optional,
        })
    }
}

impl<T: Ord + 'static> Builder<T> {
    pub fn mode(mut self, mode: ValidationMode) -> Self {
        self.mode = Some(mode.resolve());
        self
    }
}

/// Header names have to be RFC 7230 tokens.
fn validate_header_name(name: String) -> Result<String, ConfigError> {
    let is_token_char =
        |byte: u8| byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte);
    if name.is_empty() || !name.bytes().all(is_token_char) {
        return Err(ConfigError::InvalidHeaderName(name));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::compare::{self, compare_fn},
        std::sync::atomic::{AtomicU32, Ordering},
    };

    #[test]
    fn defaults() {
        let options = ValidationOptions::for_mode(Version::new(1, 0), ValidationMode::ExactMatch);
        assert_eq!(options.header_name(), "AppVersion");
        assert!(!options.is_validation_optional());
        assert_eq!(options.app_version(), Some(Version::new(1, 0)));
        assert_eq!(options.parse("1.0"), Some(Version::new(1, 0)));
        assert_eq!(options.parse("one"), None);
    }

    #[test]
    fn builder_reports_missing_pieces() {
        let err = ValidationOptions::<u32>::builder()
            .parse_from_str()
            .mode(ValidationMode::AllowNewer)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingAppVersion));

        let err = ValidationOptions::<u32>::builder()
            .app_version(3)
            .mode(ValidationMode::AllowNewer)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingParser));

        let err = ValidationOptions::<u32>::builder()
            .app_version(3)
            .parse_from_str()
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingComparator));
    }

    #[test]
    fn custom_comparison_wins_over_mode() {
        let accept_all = || compare_fn(|_: &VersionCompareData<u32>| None);
        let data = VersionCompareData::new(3, 1);

        let mode_first = ValidationOptions::builder()
            .app_version(3)
            .parse_from_str()
            .mode(ValidationMode::ExactMatch)
            .compare_with(accept_all())
            .build()
            .unwrap();
        assert_eq!(mode_first.compare(&data), None);

        let custom_first = ValidationOptions::builder()
            .app_version(3)
            .parse_from_str()
            .compare_with(accept_all())
            .mode(ValidationMode::ExactMatch)
            .build()
            .unwrap();
        assert_eq!(custom_first.compare(&data), None);

        let mode_only = ValidationOptions::builder()
            .app_version(3)
            .parse_from_str()
            .mode(ValidationMode::ExactMatch)
            .build()
            .unwrap();
        assert!(mode_only.compare(&data).is_some());
    }

    #[test]
    fn header_names_must_be_tokens() {
        for name in ["", "App Version", "App:Version", "Versión"] {
            let err = ValidationOptions::for_mode(Version::new(1, 0), ValidationMode::ExactMatch)
                .with_header_name(name)
                .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidHeaderName(_)), "{name:?}");
        }

        let options = ValidationOptions::for_mode(Version::new(1, 0), ValidationMode::ExactMatch)
            .with_header_name("X-Client-Version")
            .unwrap();
        assert_eq!(options.header_name(), "X-Client-Version");

        let err = ValidationOptions::builder()
            .app_version(1_u8)
            .parse_from_str()
            .compare_with(compare::allow_list([1]))
            .header_name("bad header")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeaderName(_)));
    }

    #[test]
    fn app_version_is_resolved_on_every_access() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let options = ValidationOptions::builder()
            .app_version_with(move || Some(counter.fetch_add(1, Ordering::SeqCst)))
            .parse_from_str()
            .mode(ValidationMode::ExactMatch)
            .build()
            .unwrap();

        assert_eq!(options.app_version(), Some(0));
        assert_eq!(options.app_version(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
