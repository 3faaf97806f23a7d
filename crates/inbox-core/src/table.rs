//! Per-framework package tables.
//!
//! A [`PackageTable`] maps package ids (case-insensitive) to the minimum
//! in-box version. Within a build run entries only move upward: the only
//! write operation is [`PackageTable::merge_max`]. Entries can be removed
//! outright (framework reduction), never lowered.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use semver::Version;

/// A package id that compares case-insensitively but keeps its spelling.
#[derive(Debug, Clone)]
pub struct PackageId(String);

impl PackageId {
    pub fn new(id: impl Into<String>) -> Self {
        PackageId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for PackageId {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for PackageId {}

impl PartialOrd for PackageId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageId {
    fn cmp(&self, other: &Self) -> Ordering {
        let left = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let right = other.0.bytes().map(|b| b.to_ascii_lowercase());
        left.cmp(right)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a max-merge into a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The id was absent and has been added.
    Inserted,
    /// The existing version was lower and has been raised.
    Raised { previous: Version },
    /// The existing version was equal or higher; nothing changed.
    Unchanged { existing: Version },
}

/// Package id → minimum in-box version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageTable {
    entries: BTreeMap<PackageId, Version>,
}

impl PackageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table by max-merging every entry.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Version)>,
        S: Into<String>,
    {
        let mut table = PackageTable::new();
        for (id, version) in entries {
            table.merge_max(id, version);
        }
        table
    }

    /// The recorded version for `id`, if any.
    pub fn get(&self, id: &str) -> Option<&Version> {
        self.entries.get(&PackageId::new(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Record `version` for `id` unless an equal or higher version is
    /// already present. The first spelling of an id is kept.
    pub fn merge_max(&mut self, id: impl Into<String>, version: Version) -> MergeOutcome {
        let key = PackageId::new(id);
        match self.entries.get_mut(&key) {
            None => {
                self.entries.insert(key, version);
                MergeOutcome::Inserted
            }
            Some(existing) if *existing < version => {
                let previous = std::mem::replace(existing, version);
                MergeOutcome::Raised { previous }
            }
            Some(existing) => MergeOutcome::Unchanged {
                existing: existing.clone(),
            },
        }
    }

    /// Remove `id`, returning its version.
    pub fn remove(&mut self, id: &str) -> Option<Version> {
        self.entries.remove(&PackageId::new(id))
    }

    /// Entries in case-insensitive id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Version)> {
        self.entries.iter().map(|(id, v)| (id.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ver(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn merge_never_downgrades() {
        let mut table = PackageTable::new();
        assert_eq!(table.merge_max("PkgB", ver("3.0.0")), MergeOutcome::Inserted);
        assert_eq!(
            table.merge_max("PkgB", ver("2.0.0")),
            MergeOutcome::Unchanged {
                existing: ver("3.0.0")
            }
        );
        assert_eq!(table.get("PkgB"), Some(&ver("3.0.0")));
        assert_eq!(
            table.merge_max("PkgB", ver("4.0.0")),
            MergeOutcome::Raised {
                previous: ver("3.0.0")
            }
        );
        assert_eq!(table.get("PkgB"), Some(&ver("4.0.0")));
    }

    #[test]
    fn ids_are_case_insensitive() {
        let mut table = PackageTable::new();
        table.merge_max("System.Memory", ver("4.5.0"));
        table.merge_max("system.memory", ver("4.5.5"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("SYSTEM.MEMORY"), Some(&ver("4.5.5")));
        let (id, _) = table.iter().next().unwrap();
        assert_eq!(id, "System.Memory");
        assert_eq!(table.remove("System.memory"), Some(ver("4.5.5")));
        assert!(table.is_empty());
    }

    #[test]
    fn iteration_is_sorted_ignoring_case() {
        let table = PackageTable::from_entries([
            ("System.ValueTuple", ver("4.5.0")),
            ("microsoft.Win32.Primitives", ver("4.3.0")),
            ("System.Buffers", ver("4.4.0")),
        ]);
        let ids: Vec<&str> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec!["microsoft.Win32.Primitives", "System.Buffers", "System.ValueTuple"]
        );
    }

    proptest! {
        #[test]
        fn merged_version_is_the_maximum(versions in proptest::collection::vec((0u64..5, 0u64..5, 0u64..5), 1..20)) {
            let mut table = PackageTable::new();
            let mut last = None;
            for (major, minor, patch) in &versions {
                table.merge_max("Pkg", Version::new(*major, *minor, *patch));
                let current = table.get("Pkg").cloned().unwrap();
                if let Some(previous) = &last {
                    prop_assert!(current >= *previous);
                }
                last = Some(current);
            }
            let max = versions
                .iter()
                .map(|(a, b, c)| Version::new(*a, *b, *c))
                .max()
                .unwrap();
            prop_assert_eq!(table.get("Pkg"), Some(&max));
        }
    }
}
