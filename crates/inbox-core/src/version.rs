//! Package versions, binary versions, and the version-pair order.
//!
//! NuGet package versions may carry a fourth (revision) component and a
//! prerelease label; in-box tables store them as plain three-part
//! [`semver::Version`]s. Binary versions read from assemblies are
//! four-part [`AssemblyVersion`]s, compared as [`VersionPair`]s.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A NuGet package version (`4.3.0`, `4.0.0.1`, `9.0.0-rc.2.24473.5`).
#[derive(Debug, Clone, Eq)]
pub struct NuGetVersion {
    major: u64,
    minor: u64,
    patch: u64,
    revision: u64,
    prerelease: Option<String>,
    original: String,
}

impl NuGetVersion {
    /// Parse a NuGet version string. Build metadata (`+sha`) is discarded.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = |reason: &str| CoreError::InvalidVersion {
            value: value.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = value.trim();
        let without_metadata = trimmed.split('+').next().unwrap_or(trimmed);
        let (numbers, prerelease) = match without_metadata.split_once('-') {
            Some((numbers, label)) if !label.is_empty() => (numbers, Some(label.to_string())),
            Some(_) => return Err(invalid("empty prerelease label")),
            None => (without_metadata, None),
        };

        let mut parts = [0u64; 4];
        let mut count = 0;
        for part in numbers.split('.') {
            if count == 4 {
                return Err(invalid("more than four components"));
            }
            parts[count] = part
                .parse()
                .map_err(|_| invalid("non-numeric component"))?;
            count += 1;
        }
        if count < 2 {
            return Err(invalid("expected at least major.minor"));
        }

        Ok(NuGetVersion {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            revision: parts[3],
            prerelease,
            original: trimmed.to_string(),
        })
    }

    /// Whether the version carries a prerelease label.
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// The version as it was written (used for download URLs).
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Normalized lowercase form used by the flat container
    /// (`4.3.0`, `4.0.0.1`, `9.0.0-rc.2`).
    pub fn normalized(&self) -> String {
        let mut out = format!("{}.{}.{}", self.major, self.minor, self.patch);
        if self.revision > 0 {
            out.push_str(&format!(".{}", self.revision));
        }
        if let Some(label) = &self.prerelease {
            out.push('-');
            out.push_str(&label.to_ascii_lowercase());
        }
        out
    }

    /// Drop the revision and any prerelease label.
    pub fn as_3part(&self) -> semver::Version {
        semver::Version::new(self.major, self.minor, self.patch)
    }

    /// The closest semantic version: revision dropped, prerelease kept when
    /// it is a valid semver label.
    pub fn to_semver(&self) -> semver::Version {
        let mut version = self.as_3part();
        if let Some(label) = &self.prerelease {
            if let Ok(pre) = semver::Prerelease::new(label) {
                version.pre = pre;
            }
        }
        version
    }
}

impl PartialEq for NuGetVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.revision)
            .cmp(&(other.major, other.minor, other.patch, other.revision))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_labels(a, b),
            })
    }
}

/// Compare prerelease labels identifier by identifier; numeric identifiers
/// compare numerically and sort before alphanumeric ones.
fn compare_labels(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase()),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl fmt::Display for NuGetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl FromStr for NuGetVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        NuGetVersion::parse(s)
    }
}

/// Extract the lower bound of a NuGet version range
/// (`[4.3.0, )`, `4.3.0`, `[1.0.0]`, `(1.0, 2.0]`).
pub fn parse_range_min(range: &str) -> Result<NuGetVersion> {
    let inner = range
        .trim()
        .trim_start_matches(['[', '('])
        .trim_end_matches([']', ')']);
    let min = inner.split(',').next().unwrap_or("").trim();
    if min.is_empty() {
        return Err(CoreError::InvalidVersion {
            value: range.to_string(),
            reason: "range has no lower bound".to_string(),
        });
    }
    NuGetVersion::parse(min)
}

/// A four-part binary version (`major.minor.build.revision`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AssemblyVersion {
    pub major: u16,
    pub minor: u16,
    pub build: u16,
    pub revision: u16,
}

impl AssemblyVersion {
    pub fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        AssemblyVersion {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse a 2 to 4 component version. An empty string is `0.0.0.0`.
    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(AssemblyVersion::default());
        }
        let invalid = |reason: &str| CoreError::InvalidVersion {
            value: value.to_string(),
            reason: reason.to_string(),
        };
        let mut parts = [0u16; 4];
        let mut count = 0;
        for part in trimmed.split('.') {
            if count == 4 {
                return Err(invalid("more than four components"));
            }
            parts[count] = part.parse().map_err(|_| invalid("component out of range"))?;
            count += 1;
        }
        if count < 2 {
            return Err(invalid("expected at least major.minor"));
        }
        Ok(AssemblyVersion::new(parts[0], parts[1], parts[2], parts[3]))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// An (assembly version, file version) pair.
///
/// Ordered lexicographically: assembly version first, file version as the
/// tie-break. Field order matters for the derived `Ord`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct VersionPair {
    pub assembly: AssemblyVersion,
    pub file: AssemblyVersion,
}

impl VersionPair {
    pub fn new(assembly: AssemblyVersion, file: AssemblyVersion) -> Self {
        VersionPair { assembly, file }
    }

    /// Whether a package binary with these versions exposes more than the
    /// `reference` binary does. Equal pairs do not exceed.
    pub fn exceeds(&self, reference: &VersionPair) -> bool {
        self > reference
    }
}

impl fmt::Display for VersionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (file {})", self.assembly, self.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> NuGetVersion {
        NuGetVersion::parse(s).unwrap()
    }

    fn av(s: &str) -> AssemblyVersion {
        AssemblyVersion::parse(s).unwrap()
    }

    #[test]
    fn parse_nuget_versions() {
        let version = v("4.0.0.1");
        assert_eq!(version.as_3part(), semver::Version::new(4, 0, 0));
        assert_eq!(version.normalized(), "4.0.0.1");
        assert!(!version.is_prerelease());

        let pre = v("9.0.0-RC.2.24473.5");
        assert!(pre.is_prerelease());
        assert_eq!(pre.as_3part(), semver::Version::new(9, 0, 0));
        assert_eq!(pre.normalized(), "9.0.0-rc.2.24473.5");
        assert_eq!(pre.to_string(), "9.0.0-RC.2.24473.5");

        assert_eq!(v("1.0").as_3part(), semver::Version::new(1, 0, 0));
        assert_eq!(v("2.0.1+sha.abc").normalized(), "2.0.1");
    }

    #[test]
    fn reject_bad_nuget_versions() {
        assert!(NuGetVersion::parse("abc").is_err());
        assert!(NuGetVersion::parse("1").is_err());
        assert!(NuGetVersion::parse("1.2.3.4.5").is_err());
        assert!(NuGetVersion::parse("1.0.0-").is_err());
    }

    #[test]
    fn nuget_version_ordering() {
        assert!(v("9.0.0-preview.1") < v("9.0.0-rc.1"));
        assert!(v("9.0.0-rc.1") < v("9.0.0"));
        assert!(v("9.0.0-rc.2") < v("9.0.0-rc.10"));
        assert!(v("4.0.0") < v("4.0.0.1"));
        assert_eq!(v("1.0.0"), v("1.0"));
    }

    #[test]
    fn range_lower_bounds() {
        assert_eq!(parse_range_min("[4.3.0, )").unwrap(), v("4.3.0"));
        assert_eq!(parse_range_min("4.3.0").unwrap(), v("4.3.0"));
        assert_eq!(parse_range_min("[1.1.0]").unwrap(), v("1.1.0"));
        assert_eq!(parse_range_min("(1.0, 2.0]").unwrap(), v("1.0"));
        assert!(parse_range_min("(, 2.0]").is_err());
    }

    #[test]
    fn assembly_versions() {
        assert_eq!(av("4.1.2.0"), AssemblyVersion::new(4, 1, 2, 0));
        assert_eq!(av("4.6"), AssemblyVersion::new(4, 6, 0, 0));
        assert_eq!(av(""), AssemblyVersion::default());
        assert!(AssemblyVersion::parse("70000.0.0.0").is_err());
        assert!(av("4.0.10.0") > av("4.0.9.0"));
    }

    #[test]
    fn version_pair_order_prefers_assembly_version() {
        let low_assembly = VersionPair::new(av("4.0.0.0"), av("9.0.0.0"));
        let high_assembly = VersionPair::new(av("4.0.1.0"), av("1.0.0.0"));
        assert!(high_assembly > low_assembly);
        assert!(high_assembly.exceeds(&low_assembly));
        assert!(!low_assembly.exceeds(&high_assembly));
    }

    #[test]
    fn version_pair_file_version_breaks_ties() {
        let reference = VersionPair::new(av("4.0.1.0"), av("4.6.26515.6"));
        let newer_file = VersionPair::new(av("4.0.1.0"), av("4.6.26919.2"));
        let same = reference;
        assert!(newer_file.exceeds(&reference));
        assert!(!same.exceeds(&reference));
    }
}
