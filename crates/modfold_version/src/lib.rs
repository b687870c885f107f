//! Wildcard-aware semantic versions and compatibility scoring.
//!
//! Mod manifests declare an `api_version` and a `mod_version`, and hosts
//! declare the API version they require. Unlike full semver ranges, mod
//! versions here are plain `major.minor.patch` triples where any component
//! may be the wildcard `*`. Omitted trailing components default to `*`,
//! so `"1.2"` parses as `1.2.*`.
//!
//! Versions are never totally ordered. Instead, [`SemVersion::compatibility`]
//! grades how closely a candidate version satisfies a required one on the
//! [`CompatScore`] scale, and callers apply their own pass/fail threshold.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error produced when parsing a version string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// The string was empty or contained an empty component (e.g. `"1..3"`).
    #[error("empty version component in `{0}`")]
    EmptyComponent(String),

    /// A component was neither a non-negative integer nor `*`.
    #[error("invalid version component `{component}` in `{version}`")]
    InvalidComponent { version: String, component: String },

    /// More than three dot-separated components.
    #[error("too many version components in `{0}` (expected at most 3)")]
    TooManyComponents(String),
}

/// A single version component: a concrete number or the wildcard `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionPart {
    Number(u64),
    Wildcard,
}

impl VersionPart {
    /// Whether this part accepts `other` at its position.
    ///
    /// A wildcard on either side matches; two numbers match only when equal.
    pub fn matches(self, other: VersionPart) -> bool {
        match (self, other) {
            (VersionPart::Wildcard, _) | (_, VersionPart::Wildcard) => true,
            (VersionPart::Number(a), VersionPart::Number(b)) => a == b,
        }
    }

    pub fn is_wildcard(self) -> bool {
        matches!(self, VersionPart::Wildcard)
    }
}

impl fmt::Display for VersionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionPart::Number(n) => write!(f, "{n}"),
            VersionPart::Wildcard => f.write_str("*"),
        }
    }
}

/// How closely a candidate version matches a required one.
///
/// Ordered: `None < Major < Minor < Patch < Match`. Each level means the
/// comparison held through that many leading positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompatScore {
    /// Major versions differ.
    None,
    /// Major matches, minor differs.
    Major,
    /// Major and minor match, patch differs.
    Minor,
    /// All positions match, but the candidate leaves its patch unpinned
    /// against a concrete requirement.
    Patch,
    /// Full match.
    Match,
}

impl fmt::Display for CompatScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompatScore::None => "none",
            CompatScore::Major => "major",
            CompatScore::Minor => "minor",
            CompatScore::Patch => "patch",
            CompatScore::Match => "match",
        };
        f.write_str(s)
    }
}

/// An immutable `major.minor.patch` version where any component may be `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemVersion {
    pub major: VersionPart,
    pub minor: VersionPart,
    pub patch: VersionPart,
}

impl SemVersion {
    pub fn new(major: VersionPart, minor: VersionPart, patch: VersionPart) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The fully wildcarded version `*.*.*`, which every version matches.
    ///
    /// Used as the default requirement when a host supplies none.
    pub fn wildcard() -> Self {
        Self {
            major: VersionPart::Wildcard,
            minor: VersionPart::Wildcard,
            patch: VersionPart::Wildcard,
        }
    }

    /// Whether all three components are concrete numbers.
    pub fn is_concrete(&self) -> bool {
        !self.major.is_wildcard() && !self.minor.is_wildcard() && !self.patch.is_wildcard()
    }

    /// Grade how well this version (the candidate) satisfies `required`.
    ///
    /// Positions are compared major, then minor, then patch; a wildcard on
    /// either side matches at its position. A mismatch at major, minor or
    /// patch yields `None`, `Major` or `Minor` respectively. When all three
    /// positions match the result is `Match`, with one exception: a wildcard
    /// candidate patch against a concrete required patch yields `Patch`,
    /// because the candidate does not pin its patch and the full match
    /// cannot be confirmed. So `1.2.*` scores `Patch` against `1.2.7`,
    /// while `1.2.7` scores `Match` against both `1.2.7` and `*.*.*`.
    pub fn compatibility(&self, required: &SemVersion) -> CompatScore {
        if !self.major.matches(required.major) {
            return CompatScore::None;
        }
        if !self.minor.matches(required.minor) {
            return CompatScore::Major;
        }
        if !self.patch.matches(required.patch) {
            return CompatScore::Minor;
        }
        if self.patch.is_wildcard() && !required.patch.is_wildcard() {
            return CompatScore::Patch;
        }
        CompatScore::Match
    }
}

fn parse_part(version: &str, component: &str) -> Result<VersionPart, VersionParseError> {
    if component.is_empty() {
        return Err(VersionParseError::EmptyComponent(version.to_string()));
    }
    if component == "*" {
        return Ok(VersionPart::Wildcard);
    }
    // Reject signs and whitespace that u64::from_str would tolerate.
    if !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError::InvalidComponent {
            version: version.to_string(),
            component: component.to_string(),
        });
    }
    component
        .parse::<u64>()
        .map(VersionPart::Number)
        .map_err(|_| VersionParseError::InvalidComponent {
            version: version.to_string(),
            component: component.to_string(),
        })
}

impl FromStr for SemVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut parts = s.split('.');

        let major = parse_part(s, parts.next().unwrap_or_default())?;
        let minor = match parts.next() {
            Some(c) => parse_part(s, c)?,
            None => VersionPart::Wildcard,
        };
        let patch = match parts.next() {
            Some(c) => parse_part(s, c)?,
            None => VersionPart::Wildcard,
        };
        if parts.next().is_some() {
            return Err(VersionParseError::TooManyComponents(s.to_string()));
        }

        Ok(SemVersion {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for SemVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for SemVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
