//! Framework reduction.
//!
//! A framework inherits every in-box package of the more general
//! frameworks it is compatible with. Reduction strips from each table the
//! entries an ancestor already guarantees, leaving only the delta. The
//! ancestor chain of `F` is `nearest(F, others)`, then the nearest of that,
//! and so on until no compatible framework remains.

use std::collections::BTreeMap;
use std::fmt;

use inbox_core::{nearest, Framework, PackageTable};
use semver::Version;
use tracing::warn;

/// One entry removed from a framework table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub framework: Framework,
    pub package: String,
    pub version: Version,
    /// The ancestor whose entry made this one redundant.
    pub ancestor: Framework,
    pub ancestor_version: Version,
}

impl Removal {
    /// Whether the ancestor carried a strictly higher version, so a lower
    /// version was discarded.
    pub fn discarded_lower(&self) -> bool {
        self.ancestor_version > self.version
    }
}

/// Every removal made by one reduction pass.
#[derive(Debug, Clone, Default)]
pub struct ReductionReport {
    pub removals: Vec<Removal>,
}

impl ReductionReport {
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.removals.len()
    }
}

impl fmt::Display for ReductionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let discarded = self.removals.iter().filter(|r| r.discarded_lower()).count();
        write!(
            f,
            "{} redundant entries removed ({} below an ancestor's version)",
            self.removals.len(),
            discarded
        )
    }
}

/// The ancestor chain of `framework` within `frameworks`, nearest first.
pub fn ancestors(framework: &Framework, frameworks: &[Framework]) -> Vec<Framework> {
    let mut chain: Vec<Framework> = Vec::new();
    let mut current = framework.clone();
    while let Some(next) = nearest(&current, frameworks.iter().filter(|f| **f != current)) {
        if *next == *framework || chain.contains(next) {
            break;
        }
        chain.push(next.clone());
        current = next.clone();
    }
    chain
}

/// Reduce every table against its ancestor chain, in framework order.
pub fn reduce(tables: &mut BTreeMap<Framework, PackageTable>) -> ReductionReport {
    let frameworks: Vec<Framework> = tables.keys().cloned().collect();
    let mut report = ReductionReport::default();

    for framework in &frameworks {
        for ancestor in ancestors(framework, &frameworks) {
            let inherited: Vec<(String, Version)> = match tables.get(&ancestor) {
                Some(table) => table
                    .iter()
                    .map(|(id, v)| (id.to_string(), v.clone()))
                    .collect(),
                None => continue,
            };
            let Some(table) = tables.get_mut(framework) else {
                continue;
            };

            for (id, ancestor_version) in inherited {
                let Some(existing) = table.get(&id).cloned() else {
                    continue;
                };
                if existing > ancestor_version {
                    continue;
                }
                if existing < ancestor_version {
                    warn!(
                        package = %id,
                        %framework,
                        version = %existing,
                        %ancestor,
                        ancestor_version = %ancestor_version,
                        "compatible framework has a higher version"
                    );
                }
                table.remove(&id);
                report.removals.push(Removal {
                    framework: framework.clone(),
                    package: id,
                    version: existing,
                    ancestor: ancestor.clone(),
                    ancestor_version,
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ver(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn fw(s: &str) -> Framework {
        Framework::parse(s).unwrap()
    }

    fn table(entries: &[(&str, &str)]) -> PackageTable {
        PackageTable::from_entries(entries.iter().map(|(id, v)| (*id, ver(v))))
    }

    fn tables() -> BTreeMap<Framework, PackageTable> {
        BTreeMap::from([
            (
                fw("netstandard2.0"),
                table(&[("PkgA", "4.3.0"), ("PkgB", "4.3.0"), ("PkgC", "4.5.0")]),
            ),
            (
                fw("netcoreapp2.1"),
                table(&[("PkgA", "4.3.0"), ("PkgB", "4.5.0"), ("PkgC", "4.4.0"), ("PkgD", "1.0.0")]),
            ),
            (
                fw("netcoreapp3.0"),
                table(&[("PkgA", "4.3.0"), ("PkgB", "4.5.0"), ("PkgD", "1.1.0")]),
            ),
            (fw("net461"), table(&[("PkgA", "4.3.0")])),
        ])
    }

    #[test]
    fn ancestor_chains() {
        let frameworks: Vec<Framework> = tables().keys().cloned().collect();
        assert_eq!(
            ancestors(&fw("netcoreapp3.0"), &frameworks),
            vec![fw("netcoreapp2.1"), fw("netstandard2.0")]
        );
        assert_eq!(ancestors(&fw("net461"), &frameworks), vec![fw("netstandard2.0")]);
        assert!(ancestors(&fw("netstandard2.0"), &frameworks).is_empty());
    }

    #[test]
    fn keeps_only_the_delta() {
        let mut tables = tables();
        let report = reduce(&mut tables);

        let ids = |f: &str| -> Vec<String> {
            tables[&fw(f)].iter().map(|(id, v)| format!("{id}:{v}")).collect()
        };
        assert_eq!(ids("netstandard2.0"), vec!["PkgA:4.3.0", "PkgB:4.3.0", "PkgC:4.5.0"]);
        assert_eq!(ids("netcoreapp2.1"), vec!["PkgB:4.5.0", "PkgD:1.0.0"]);
        assert_eq!(ids("netcoreapp3.0"), vec!["PkgD:1.1.0"]);
        assert!(ids("net461").is_empty());

        let discarded: Vec<&Removal> = report.removals.iter().filter(|r| r.discarded_lower()).collect();
        assert_eq!(discarded.len(), 1);
        assert_eq!(discarded[0].package, "PkgC");
        assert_eq!(discarded[0].framework, fw("netcoreapp2.1"));
    }

    #[test]
    fn reduction_is_idempotent() {
        let mut tables = tables();
        let first = reduce(&mut tables);
        assert!(!first.is_empty());
        let snapshot = tables.clone();

        let second = reduce(&mut tables);
        assert!(second.is_empty());
        assert_eq!(tables, snapshot);
    }

    #[test]
    fn unrelated_frameworks_are_untouched() {
        let mut tables = BTreeMap::from([
            (fw("netcoreapp3.1"), table(&[("PkgA", "1.0.0")])),
            (fw("net472"), table(&[("PkgA", "1.0.0")])),
        ]);
        assert!(reduce(&mut tables).is_empty());
    }

    proptest! {
        #[test]
        fn second_pass_removes_nothing(
            entries in proptest::collection::vec((0usize..4, 0usize..4, 0u64..4), 0..40)
        ) {
            let frameworks = [
                fw("netstandard2.0"),
                fw("netcoreapp2.1"),
                fw("netcoreapp3.0"),
                fw("net461"),
            ];
            let ids = ["PkgA", "PkgB", "PkgC", "PkgD"];
            let mut tables: BTreeMap<Framework, PackageTable> = frameworks
                .iter()
                .map(|f| (f.clone(), PackageTable::new()))
                .collect();
            for (f, id, minor) in entries {
                if let Some(table) = tables.get_mut(&frameworks[f]) {
                    table.merge_max(ids[id], Version::new(1, minor, 0));
                }
            }

            reduce(&mut tables);
            let snapshot = tables.clone();
            prop_assert!(reduce(&mut tables).is_empty());
            prop_assert_eq!(tables, snapshot);
        }
    }
}
