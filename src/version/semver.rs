use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease, Version};

use crate::version::error::VersionError;

/// A semantic version whose missing trailing components count as zero.
///
/// `"1.2"` and `"1.2.0"` parse to equal values, so every comparison
/// operator behaves component-wise after zero padding. Pre-release and
/// build suffixes follow semver precedence: `1.2.0-rc.1 < 1.2.0`, and
/// `1.2.0+linux == 1.2.0`.
#[derive(Debug, Clone)]
pub struct SemanticVersion(Version);

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
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

    /// First release of the following minor line: `1.2.3` -> `1.3.0`.
    ///
    /// `None` if the minor component is already `u64::MAX`.
    pub fn next_minor(&self) -> Option<Self> {
        let minor = self.0.minor.checked_add(1)?;
        Some(Self::new(self.0.major, minor, 0))
    }

    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // Build metadata doesn't take part in precedence
        self.0.cmp_precedence(&other.0)
    }
}

impl Hash for SemanticVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.major.hash(state);
        self.0.minor.hash(state);
        self.0.patch.hash(state);
        self.0.pre.hash(state);
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Parse a version string, padding partial versions with zeros.
///
/// Examples:
/// - "1" -> 1.0.0
/// - "1.2" -> 1.2.0
/// - "1.2.3-rc.1+build.5" -> 1.2.3-rc.1+build.5
///
/// A leading `v` is NOT accepted; listers strip it through their filter.
pub fn parse_version(version: &str) -> Result<SemanticVersion, VersionError> {
    let invalid = || VersionError::InvalidVersion(version.to_string());

    let (rest, build) = match version.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (version, None),
    };
    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (rest, None),
    };

    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }

    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        *slot = part.parse().map_err(|_| invalid())?;
    }

    let mut parsed = Version::new(numbers[0], numbers[1], numbers[2]);
    if let Some(pre) = pre {
        if pre.is_empty() {
            return Err(invalid());
        }
        parsed.pre = Prerelease::new(pre).map_err(|_| invalid())?;
    }
    if let Some(build) = build {
        if build.is_empty() {
            return Err(invalid());
        }
        parsed.build = BuildMetadata::new(build).map_err(|_| invalid())?;
    }

    Ok(SemanticVersion(parsed))
}

/// Compare two version strings semantically.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, VersionError> {
    Ok(parse_version(a)?.cmp(&parse_version(b)?))
}

/// Sort versions by their major, minor and patch components.
///
/// Fails on the first version that doesn't parse. The sort is stable, so
/// equal versions (`"3"` and `"3.0.0"`) keep their relative order.
pub fn sort_versions(versions: Vec<String>) -> Result<Vec<String>, VersionError> {
    let mut keyed = versions
        .into_iter()
        .map(|v| parse_version(&v).map(|parsed| (parsed, v)))
        .collect::<Result<Vec<_>, _>>()?;

    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));

    Ok(keyed.into_iter().map(|(_, v)| v).collect())
}

/// Sort versions as plain strings.
pub fn sort_alphanumeric(mut versions: Vec<String>) -> Vec<String> {
    versions.sort();
    versions
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", SemanticVersion::new(1, 0, 0))]
    #[case("1.2", SemanticVersion::new(1, 2, 0))]
    #[case("1.2.3", SemanticVersion::new(1, 2, 3))]
    #[case("01.002.3", SemanticVersion::new(1, 2, 3))]
    fn parse_version_pads_missing_components(
        #[case] input: &str,
        #[case] expected: SemanticVersion,
    ) {
        assert_eq!(parse_version(input).unwrap(), expected);
    }

    #[test]
    fn parse_version_keeps_prerelease_and_build() {
        let version = parse_version("1.2-rc.1+linux").unwrap();

        assert_eq!(version.to_string(), "1.2.0-rc.1+linux");
    }

    #[rstest]
    #[case("")]
    #[case("v1.2.3")]
    #[case("1..2")]
    #[case("1.2.")]
    #[case("1.2.3.4")]
    #[case("one.two")]
    #[case("1.2.3-")]
    #[case("1.2.3+")]
    #[case("-1.2")]
    fn parse_version_rejects_malformed_input(#[case] input: &str) {
        assert_eq!(
            parse_version(input),
            Err(VersionError::InvalidVersion(input.to_string()))
        );
    }

    #[rstest]
    #[case("1.2", "1.2.0", Ordering::Equal)]
    #[case("1.2.0+linux", "1.2.0", Ordering::Equal)]
    #[case("1", "1.0.0", Ordering::Equal)]
    #[case("1.10", "1.9.9", Ordering::Greater)]
    #[case("1.2.10", "1.2.9", Ordering::Greater)]
    #[case("0.0.1", "1", Ordering::Less)]
    #[case("1.2.0-rc.1", "1.2", Ordering::Less)]
    fn compare_versions_is_numeric_component_wise(
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(compare_versions(a, b).unwrap(), expected);
    }

    #[test]
    fn next_minor_resets_patch() {
        assert_eq!(
            SemanticVersion::new(1, 10, 5).next_minor(),
            Some(SemanticVersion::new(1, 11, 0))
        );
    }

    #[test]
    fn next_minor_is_none_at_max_minor() {
        assert_eq!(SemanticVersion::new(1, u64::MAX, 0).next_minor(), None);
    }

    #[test]
    fn sort_versions_orders_numerically() {
        let versions = vec!["1.10.0", "1.9.2", "2", "1.9.10", "0.1"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            sort_versions(versions).unwrap(),
            vec!["0.1", "1.9.2", "1.9.10", "1.10.0", "2"]
        );
    }

    #[test]
    fn sort_versions_fails_on_invalid_entry() {
        let versions = vec!["1.0.0".to_string(), "latest".to_string()];

        assert_eq!(
            sort_versions(versions),
            Err(VersionError::InvalidVersion("latest".to_string()))
        );
    }

    #[test]
    fn sort_alphanumeric_orders_as_strings() {
        let versions = vec!["1.10.0", "1.9.2", "2"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(sort_alphanumeric(versions), vec!["1.10.0", "1.9.2", "2"]);
    }
}
