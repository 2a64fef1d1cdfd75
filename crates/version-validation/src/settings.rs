//! File based configuration for validating [`Version`]s.

use {
    crate::{
        compare::{self, ValidationMode},
        error::ConfigError,
        options::{AppVersion, DEFAULT_HEADER_NAME, ValidationOptions},
        version::Version,
    },
    serde::Deserialize,
    std::path::Path,
    tokio::fs,
};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// Name of the header carrying the request version.
    #[serde(default = "default_header_name")]
    pub header_name: String,

    /// How request versions have to relate to the application version.
    #[serde(default)]
    pub mode: ValidationMode,

    /// Let requests without the version header through.
    #[serde(default)]
    pub optional: bool,

    /// The application version. When unset, the version of the hosting
    /// binary is used.
    #[serde(default)]
    pub app_version: Option<Version>,

    /// Explicit list of accepted request versions. Takes precedence over
    /// `mode`.
    #[serde(default)]
    pub allowed_versions: Option<Vec<Version>>,
}

fn default_header_name() -> String {
    DEFAULT_HEADER_NAME.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            mode: ValidationMode::default(),
            optional: false,
            app_version: None,
            allowed_versions: None,
        }
    }
}

impl Settings {
    pub fn from_toml(data: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(data)?)
    }

    /// Turns the settings into validation options. `fallback` resolves the
    /// application version when the settings do not pin one.
    pub fn into_options(
        self,
        fallback: AppVersion<Version>,
    ) -> Result<ValidationOptions<Version>, ConfigError> {
        let builder = ValidationOptions::builder()
            .parse_from_str()
            .mode(self.mode)
            .header_name(self.header_name)
            .optional(self.optional);
        let builder = match self.app_version {
            Some(version) => builder.app_version(version),
            None => builder.app_version_with(move || fallback.get()),
        };
        let builder = match self.allowed_versions {
            Some(versions) => builder.compare_with(compare::allow_list(versions)),
            None => builder,
        };
        builder.build()
    }
}

/// Load the version validation settings from a TOML file.
pub async fn load(path: &Path) -> Result<Settings, ConfigError> {
    let data = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
    Settings::from_toml(&data)
}
