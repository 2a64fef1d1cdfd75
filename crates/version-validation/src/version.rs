//! The structured `major.minor[.build[.revision]]` version used by the
//! convenience configuration paths.
//!
//! Nothing in the comparison or interception logic depends on this type. It
//! is one possible `T` among many (integers, semver structs, opaque tokens).

use {
    serde_with::{DeserializeFromStr, SerializeDisplay},
    std::{fmt, str::FromStr},
};

/// A version made of two to four numeric components.
///
/// Undefined trailing components order before defined ones, so
/// `1.0 < 1.0.0 < 1.0.0.0`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Version {
    major: u32,
    minor: u32,
    build: Option<u32>,
    revision: Option<u32>,
}

impl Version {
    /// Largest value a single component may take.
    pub const MAX_COMPONENT: u32 = i32::MAX.unsigned_abs();

    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    pub const fn with_build(mut self, build: u32) -> Self {
        self.build = Some(build);
        self
    }

    /// Sets the revision. A revision implies a build component, so an unset
    /// build becomes `0`.
    pub const fn with_revision(mut self, revision: u32) -> Self {
        if self.build.is_none() {
            self.build = Some(0);
        }
        self.revision = Some(revision);
        self
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn build(&self) -> Option<u32> {
        self.build
    }

    pub fn revision(&self) -> Option<u32> {
        self.revision
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{build}")?;
        }
        if let Some(revision) = self.revision {
            write!(f, ".{revision}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseVersionError {
    #[error("expected 2 to 4 components but found {0}")]
    ComponentCount(usize),
    #[error("component {index} is not a plain decimal number")]
    InvalidComponent { index: usize },
    #[error("component {index} exceeds {max}", max = Version::MAX_COMPONENT)]
    ComponentTooLarge { index: usize },
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let components = s
            .trim()
            .split('.')
            .enumerate()
            .map(|(index, part)| parse_component(index, part))
            .collect::<Result<Vec<_>, _>>()?;

        match components[..] {
            [major, minor] => Ok(Self::new(major, minor)),
            [major, minor, build] => Ok(Self::new(major, minor).with_build(build)),
            [major, minor, build, revision] => Ok(Self::new(major, minor)
                .with_build(build)
                .with_revision(revision)),
            _ => Err(ParseVersionError::ComponentCount(components.len())),
        }
    }
}

/// A component is a decimal integer, optionally surrounded by whitespace and
/// prefixed with `+`. Negative and empty components are rejected.
fn parse_component(index: usize, part: &str) -> Result<u32, ParseVersionError> {
    let trimmed = part.trim_matches(|c: char| c == ' ' || ('\t'..='\r').contains(&c));
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ParseVersionError::InvalidComponent { index });
    }
    digits
        .parse::<u32>()
        .ok()
        .filter(|value| *value <= Version::MAX_COMPONENT)
        .ok_or(ParseVersionError::ComponentTooLarge { index })
}
