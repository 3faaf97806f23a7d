//! Target framework identities and compatibility.
//!
//! Frameworks are parsed from NuGet short folder names (`netstandard2.0`,
//! `netcoreapp2.1`, `net6.0`, `net6.0-windows`, `net461`) or from long
//! framework names (`.NETStandard,Version=v2.0`). The compatibility relation
//! answers "can a project targeting `self` consume assets built for
//! `candidate`?", and [`nearest`] picks the most specific compatible
//! framework from a candidate set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// The framework identifier (the "family" of a target framework moniker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FrameworkId {
    /// .NET Framework (`net45`, `net461`, `net48`).
    NetFramework,
    /// .NET Standard (`netstandard1.3`, `netstandard2.0`).
    NetStandard,
    /// .NET Core and .NET 5+ (`netcoreapp2.1`, `net6.0`).
    NetCoreApp,
}

impl FrameworkId {
    /// The long identifier used in framework names.
    pub fn identifier(&self) -> &'static str {
        match self {
            FrameworkId::NetFramework => ".NETFramework",
            FrameworkId::NetStandard => ".NETStandard",
            FrameworkId::NetCoreApp => ".NETCoreApp",
        }
    }

    fn from_identifier(value: &str) -> Option<Self> {
        match value {
            ".netframework" => Some(FrameworkId::NetFramework),
            ".netstandard" => Some(FrameworkId::NetStandard),
            ".netcoreapp" => Some(FrameworkId::NetCoreApp),
            _ => None,
        }
    }
}

/// A parsed target framework.
///
/// Ordering is structural (identifier, version, platform) and only serves to
/// keep maps deterministic; use [`Framework::is_compatible_with`] for the
/// compatibility partial order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Framework {
    id: FrameworkId,
    version: (u32, u32, u32),
    platform: Option<String>,
}

impl Framework {
    /// Create a framework from its identifier and version.
    pub fn new(id: FrameworkId, major: u32, minor: u32, patch: u32) -> Self {
        Framework {
            id,
            version: (major, minor, patch),
            platform: None,
        }
    }

    /// `netstandard{major}.{minor}`.
    pub fn netstandard(major: u32, minor: u32) -> Self {
        Framework::new(FrameworkId::NetStandard, major, minor, 0)
    }

    /// `netcoreapp{major}.{minor}`, or `net{major}.{minor}` from 5.0 on.
    pub fn netcoreapp(major: u32, minor: u32) -> Self {
        Framework::new(FrameworkId::NetCoreApp, major, minor, 0)
    }

    /// Attach an OS platform (`net6.0-windows`).
    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = Some(platform.to_ascii_lowercase());
        self
    }

    /// Parse a short folder name or a long framework name.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidFramework {
            value: value.to_string(),
        };
        let lower = value.trim().to_ascii_lowercase();
        if lower.starts_with('.') {
            return Self::parse_long(&lower).ok_or_else(invalid);
        }

        let (moniker, platform) = match lower.split_once('-') {
            Some((moniker, platform)) if !platform.is_empty() => {
                (moniker, Some(platform.to_string()))
            }
            Some(_) => return Err(invalid()),
            None => (lower.as_str(), None),
        };

        let (id, version) = if let Some(rest) = moniker.strip_prefix("netstandard") {
            (FrameworkId::NetStandard, parse_dotted(rest).ok_or_else(invalid)?)
        } else if let Some(rest) = moniker.strip_prefix("netcoreapp") {
            (FrameworkId::NetCoreApp, parse_dotted(rest).ok_or_else(invalid)?)
        } else if let Some(rest) = moniker.strip_prefix("net") {
            if rest.contains('.') {
                let version = parse_dotted(rest).ok_or_else(invalid)?;
                if version.0 >= 5 {
                    (FrameworkId::NetCoreApp, version)
                } else {
                    (FrameworkId::NetFramework, version)
                }
            } else {
                (FrameworkId::NetFramework, parse_compact(rest).ok_or_else(invalid)?)
            }
        } else {
            return Err(invalid());
        };

        // OS platforms only exist on .NET 5 and later.
        if platform.is_some() && !(id == FrameworkId::NetCoreApp && version.0 >= 5) {
            return Err(invalid());
        }

        Ok(Framework {
            id,
            version,
            platform,
        })
    }

    fn parse_long(lower: &str) -> Option<Self> {
        let mut parts = lower.split(',');
        let id = FrameworkId::from_identifier(parts.next()?.trim())?;
        let version = parts
            .map(str::trim)
            .find_map(|p| p.strip_prefix("version="))
            .map(|v| v.trim_start_matches('v'))?;
        let version = parse_dotted(version)?;
        Some(Framework {
            id,
            version,
            platform: None,
        })
    }

    /// The framework identifier.
    pub fn id(&self) -> FrameworkId {
        self.id
    }

    /// The `(major, minor, patch)` framework version.
    pub fn version(&self) -> (u32, u32, u32) {
        self.version
    }

    /// The OS platform, if any.
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// The NuGet short folder name (`netstandard2.0`, `net6.0-windows`, `net461`).
    pub fn short_folder_name(&self) -> String {
        let (major, minor, patch) = self.version;
        let mut name = match self.id {
            FrameworkId::NetStandard => format!("netstandard{major}.{minor}"),
            FrameworkId::NetCoreApp if major >= 5 => format!("net{major}.{minor}"),
            FrameworkId::NetCoreApp => format!("netcoreapp{major}.{minor}"),
            FrameworkId::NetFramework if patch > 0 => format!("net{major}{minor}{patch}"),
            FrameworkId::NetFramework => format!("net{major}{minor}"),
        };
        if let Some(platform) = &self.platform {
            name.push('-');
            name.push_str(platform);
        }
        name
    }

    /// The long framework name (`.NETStandard,Version=v2.0`).
    pub fn dotnet_framework_name(&self) -> String {
        let (major, minor, patch) = self.version;
        if patch > 0 {
            format!("{},Version=v{major}.{minor}.{patch}", self.id.identifier())
        } else {
            format!("{},Version=v{major}.{minor}", self.id.identifier())
        }
    }

    /// Whether a project targeting `self` can consume assets built for
    /// `candidate`.
    pub fn is_compatible_with(&self, candidate: &Framework) -> bool {
        if let Some(platform) = &candidate.platform {
            if self.platform.as_ref() != Some(platform) {
                return false;
            }
        }
        if self.id == candidate.id {
            return candidate.version <= self.version;
        }
        if candidate.id == FrameworkId::NetStandard {
            return self
                .max_netstandard()
                .is_some_and(|max| candidate.version <= max);
        }
        false
    }

    /// The highest .NET Standard version this framework implements.
    fn max_netstandard(&self) -> Option<(u32, u32, u32)> {
        let v = self.version;
        match self.id {
            FrameworkId::NetStandard => Some(v),
            FrameworkId::NetCoreApp => match v {
                (0, _, _) => None,
                (1, _, _) => Some((1, 6, 0)),
                (2, 0, _) => Some((2, 0, 0)),
                _ => Some((2, 1, 0)),
            },
            FrameworkId::NetFramework => {
                if v >= (4, 6, 1) {
                    Some((2, 0, 0))
                } else if v >= (4, 6, 0) {
                    Some((1, 3, 0))
                } else if v >= (4, 5, 1) {
                    Some((1, 2, 0))
                } else if v >= (4, 5, 0) {
                    Some((1, 1, 0))
                } else {
                    None
                }
            }
        }
    }
}

/// Return the most specific framework in `candidates` that `target` is
/// compatible with, or `None`.
///
/// Candidates sharing the target's identifier win over .NET Standard; within
/// a group the highest version wins, and a platform-specific framework beats
/// its platform-neutral twin.
pub fn nearest<'a, I>(target: &Framework, candidates: I) -> Option<&'a Framework>
where
    I: IntoIterator<Item = &'a Framework>,
{
    let compatible: Vec<&Framework> = candidates
        .into_iter()
        .filter(|c| target.is_compatible_with(c))
        .collect();

    let same_id = compatible
        .iter()
        .filter(|c| c.id == target.id)
        .max_by_key(|c| (c.version, c.platform.is_some()))
        .copied();
    if same_id.is_some() {
        return same_id;
    }

    compatible
        .into_iter()
        .filter(|c| c.id == FrameworkId::NetStandard)
        .max_by_key(|c| c.version)
}

/// Parse `2.0`, `4.6.1`, or `6` into a three-part version.
fn parse_dotted(value: &str) -> Option<(u32, u32, u32)> {
    if value.is_empty() {
        return None;
    }
    let mut parts = [0u32; 3];
    for (i, part) in value.split('.').enumerate() {
        if i >= 3 {
            return None;
        }
        parts[i] = part.parse().ok()?;
    }
    Some((parts[0], parts[1], parts[2]))
}

/// Parse the compact .NET Framework form (`45`, `461`, `403`).
fn parse_compact(value: &str) -> Option<(u32, u32, u32)> {
    if value.is_empty() || value.len() > 3 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digit = |i: usize| value.as_bytes().get(i).map_or(0, |b| u32::from(b - b'0'));
    Some((digit(0), digit(1), digit(2)))
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_folder_name())
    }
}

impl FromStr for Framework {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Framework::parse(s)
    }
}

impl TryFrom<String> for Framework {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Framework::parse(&value)
    }
}

impl From<Framework> for String {
    fn from(framework: Framework) -> Self {
        framework.short_folder_name()
    }
}
