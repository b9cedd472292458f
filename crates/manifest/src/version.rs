//! NPM-style version ranges used by `requiredSaleorVersion`.
//!
//! Ranges follow the npm grammar (`||` alternatives, hyphen ranges, `~`, `^`,
//! comparison operators and x-ranges) and desugar to sets of comparators the
//! same way npm does. Prereleases are matched with the *natural* policy: a
//! prerelease version is compared against every comparator by plain semver
//! precedence, so `3.14.0-a.0` satisfies `^3.13`.

mod parser;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Serialize, Serializer};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum VersionReqError {
    #[error("invalid comparator: {0}")]
    InvalidComparator(String),

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("invalid hyphen range: {0}")]
    InvalidHyphenRange(String),

    #[error("version component overflow in {0}")]
    Overflow(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Exact,
    Greater,
    GreaterEq,
    Less,
    LessEq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Comparator {
    pub(crate) op: Op,
    pub(crate) version: Version,
}

impl Comparator {
    pub(crate) fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    fn matches(&self, version: &Version) -> bool {
        let ordering = precedence(version, &self.version);
        match self.op {
            Op::Exact => ordering == Ordering::Equal,
            Op::Greater => ordering == Ordering::Greater,
            Op::GreaterEq => ordering != Ordering::Less,
            Op::Less => ordering == Ordering::Less,
            Op::LessEq => ordering != Ordering::Greater,
        }
    }
}

/// Semver precedence: build metadata is ignored, prereleases sort before
/// their release.
fn precedence(left: &Version, right: &Version) -> Ordering {
    (left.major, left.minor, left.patch, &left.pre).cmp(&(
        right.major,
        right.minor,
        right.patch,
        &right.pre,
    ))
}

/// A parsed version range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReq {
    raw: String,
    /// Alternatives joined by `||`; an empty comparator set matches anything.
    alternatives: Vec<Vec<Comparator>>,
}

impl VersionReq {
    pub fn parse(input: &str) -> Result<Self, VersionReqError> {
        let alternatives = parser::parse_range_set(input)?;
        Ok(Self {
            raw: input.to_string(),
            alternatives,
        })
    }

    /// Whether `version` satisfies at least one alternative of the range.
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|set| set.iter().all(|comparator| comparator.matches(version)))
    }

    /// The range expression as written in the manifest.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for VersionReq {
    type Err = VersionReqError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for VersionReq {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(input: &str) -> Version {
        Version::parse(input).expect("valid version")
    }

    fn req(input: &str) -> VersionReq {
        VersionReq::parse(input).expect("valid range")
    }

    #[test]
    fn caret_ranges() {
        let range = req("^3.13.0");
        assert!(range.matches(&v("3.13.0")));
        assert!(range.matches(&v("3.20.5")));
        assert!(!range.matches(&v("3.12.0")));
        assert!(!range.matches(&v("4.0.0")));

        let zero_minor = req("^0.2.3");
        assert!(zero_minor.matches(&v("0.2.9")));
        assert!(!zero_minor.matches(&v("0.3.0")));

        let zero_patch = req("^0.0.3");
        assert!(zero_patch.matches(&v("0.0.3")));
        assert!(!zero_patch.matches(&v("0.0.4")));
    }

    #[test]
    fn tilde_ranges() {
        let range = req("~1.2.3");
        assert!(range.matches(&v("1.2.9")));
        assert!(!range.matches(&v("1.3.0")));
        assert!(req("~1").matches(&v("1.9.0")));
        assert!(!req("~1").matches(&v("2.0.0")));
    }

    #[test]
    fn x_ranges_and_partials() {
        assert!(req("*").matches(&v("0.0.1")));
        assert!(req("").matches(&v("9.9.9")));
        assert!(req("3.x").matches(&v("3.99.0")));
        assert!(!req("3.x").matches(&v("4.0.0")));
        assert!(req("3.13").matches(&v("3.13.7")));
        assert!(!req("3.13").matches(&v("3.14.0")));
        assert!(req("1.2.3").matches(&v("1.2.3")));
        assert!(!req("1.2.3").matches(&v("1.2.4")));
    }

    #[test]
    fn comparison_operators() {
        assert!(req(">=3.13").matches(&v("3.13.0")));
        assert!(!req(">3.13").matches(&v("3.13.9")));
        assert!(req(">3.13").matches(&v("3.14.0")));
        assert!(req("<=3.13").matches(&v("3.13.9")));
        assert!(!req("<3.13").matches(&v("3.13.0")));
        assert!(req(">= 3.10.0 < 3.20.0").matches(&v("3.19.1")));
        assert!(!req(">*").matches(&v("1.0.0")));
    }

    #[test]
    fn hyphen_ranges() {
        let range = req("1.2 - 2.3.4");
        assert!(range.matches(&v("1.2.0")));
        assert!(range.matches(&v("2.3.4")));
        assert!(!range.matches(&v("2.3.5")));

        let partial_upper = req("1.2.3 - 2");
        assert!(partial_upper.matches(&v("2.9.9")));
        assert!(!partial_upper.matches(&v("3.0.0")));
    }

    #[test]
    fn alternatives() {
        let range = req("^2.0 || ~3.13 || >=4.1.0");
        assert!(range.matches(&v("2.5.0")));
        assert!(range.matches(&v("3.13.2")));
        assert!(!range.matches(&v("3.14.0")));
        assert!(range.matches(&v("4.2.0")));
    }

    #[test]
    fn prereleases_use_natural_ordering() {
        assert!(req("^3.13").matches(&v("3.14.0-a.0")));
        assert!(req(">=3.13.0").matches(&v("3.14.0-a.0")));
        assert!(!req(">=3.13.0").matches(&v("3.13.0-a.0")));
        assert!(!req("^3.13").matches(&v("4.0.0-a.0")));
        assert!(req(">=3.13.0-a.0").matches(&v("3.13.0-a.1")));
    }

    #[test]
    fn build_metadata_is_ignored() {
        assert!(req("=1.2.3").matches(&v("1.2.3+build.7")));
    }

    #[test]
    fn rejects_malformed_ranges() {
        for input in ["abc", "^", ">=1.2.3.4", "1.2.x-beta", "1 - ", "1.2 - 3 - 4", "^a.b"] {
            assert!(VersionReq::parse(input).is_err(), "{input} should not parse");
        }
    }

    #[test]
    fn display_keeps_original_expression() {
        assert_eq!(req("^3.13 || 4.x").to_string(), "^3.13 || 4.x");
        assert_eq!(
            serde_json::to_value(req(">=3.13")).unwrap(),
            serde_json::json!(">=3.13")
        );
    }
}
