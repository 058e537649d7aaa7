//! Semantic version parsing and comparison
//!
//! Release tags are parsed leniently: a leading `v`, missing minor/patch
//! components and a fourth numeric component are all accepted. The same
//! parser is used for the running version and for feed tags so that
//! upgrade decisions and feed ordering never disagree.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, UpdateError};

/// Comparable `major.minor.patch[-prerelease]` version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticVersion(Version);

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Parse a version or release tag such as `v1.2.3`, `1.2` or `1.2.3-beta.1`
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let unprefixed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        // Build metadata never participates in ordering
        let without_build = unprefixed.split('+').next().unwrap_or_default();

        let (core, pre) = match without_build.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (without_build, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.is_empty() || parts.len() > 4 {
            return Err(UpdateError::version_parse(
                input,
                "expected one to four numeric components",
            ));
        }

        let mut numbers = [0u64; 3];
        for (i, part) in parts.iter().enumerate() {
            let value: u64 = part.parse().map_err(|_| {
                UpdateError::version_parse(input, format!("'{}' is not a number", part))
            })?;
            if i < 3 {
                numbers[i] = value;
            }
        }

        let prerelease = match pre {
            Some(pre) => Prerelease::new(pre)
                .map_err(|e| UpdateError::version_parse(input, e.to_string()))?,
            None => Prerelease::EMPTY,
        };
        if pre.is_some() && prerelease.is_empty() {
            return Err(UpdateError::version_parse(input, "empty prerelease tag"));
        }

        Ok(Self(Version {
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
            pre: prerelease,
            build: BuildMetadata::EMPTY,
        }))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Prerelease tag, if any
    pub fn prerelease(&self) -> Option<&str> {
        if self.0.pre.is_empty() {
            None
        } else {
            Some(self.0.pre.as_str())
        }
    }

    /// `true` if `self` is strictly newer than `other`
    pub fn is_upgrade(&self, other: &SemanticVersion) -> bool {
        self > other
    }

    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // semver orders a prerelease before the same release
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for SemanticVersion {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_tag_forms() {
        assert_eq!(v("v1.2.3"), SemanticVersion::new(1, 2, 3));
        assert_eq!(v("V1.2.3"), SemanticVersion::new(1, 2, 3));
        assert_eq!(v("1.2"), SemanticVersion::new(1, 2, 0));
        assert_eq!(v("7"), SemanticVersion::new(7, 0, 0));
        assert_eq!(v("1.2.3.4"), SemanticVersion::new(1, 2, 3));
        assert_eq!(v("1.2.3+build.5"), SemanticVersion::new(1, 2, 3));
        assert_eq!(v(" v0.4.0 ").to_string(), "0.4.0");
    }

    #[test]
    fn test_parse_prerelease() {
        let beta = v("1.2.3-beta.1");
        assert_eq!(beta.prerelease(), Some("beta.1"));
        assert_eq!(beta.to_string(), "1.2.3-beta.1");
        assert_eq!(v("1.2.3").prerelease(), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "v", "latest", "1.x.3", "1.2.3.4.5", "1.2.3-", "-beta"] {
            let err = SemanticVersion::parse(input).unwrap_err();
            assert!(
                matches!(err, UpdateError::VersionParse { .. }),
                "expected parse error for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_ordering() {
        assert!(v("1.2.4") > v("1.2.3"));
        assert!(v("1.10.0") > v("1.9.9"));
        assert!(v("2.0.0") > v("1.99.99"));
        assert!(v("1.2.3-beta") < v("1.2.3"));
        assert!(v("1.2.3-alpha") < v("1.2.3-beta"));
        assert!(v("1.2.4-alpha") > v("1.2.3"));
    }

    #[test]
    fn test_is_upgrade() {
        assert!(v("v3.1.0").is_upgrade(&v("3.0.9")));
        assert!(!v("3.0.0").is_upgrade(&v("3.0.0")));
        assert!(!v("3.0.0-rc.1").is_upgrade(&v("3.0.0")));
        assert!(v("3.0.0").is_upgrade(&v("3.0.0-rc.1")));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("v1.2.3-rc.1")).unwrap();
        assert_eq!(json, "\"1.2.3-rc.1\"");
        let back: SemanticVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("1.2.3-rc.1"));
    }
}
