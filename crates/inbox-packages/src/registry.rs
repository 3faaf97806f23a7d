//! The framework package registry.
//!
//! Tables are registered through a [`RegistryBuilder`] and frozen into a
//! [`FrameworkPackageRegistry`]. Each table may name a parent table of the
//! same family; a lookup checks the table's own entries first and then
//! walks the parent links. Parents are resolved once, at build time, so the
//! finished registry is an immutable forest that can be shared freely
//! across threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use inbox_core::{nearest, Framework, FrameworkFamily, PackageTable};
use once_cell::sync::Lazy;
use semver::Version;
use tracing::debug;

use crate::error::{PackagesError, Result};
use crate::generated;

/// A table as it appears in generated source.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub family: FrameworkFamily,
    /// Short folder name, e.g. `netcoreapp2.1`.
    pub framework: &'static str,
    /// Shared framework supplying the packages, e.g. `Microsoft.NETCore.App`.
    pub framework_name: &'static str,
    /// Short folder name of the parent table in the same family.
    pub parent: Option<&'static str>,
    pub packages: &'static [(&'static str, &'static str)],
}

/// The in-box packages of one family at one framework.
#[derive(Debug)]
pub struct FrameworkPackages {
    family: FrameworkFamily,
    framework: Framework,
    framework_name: String,
    parent: Option<Arc<FrameworkPackages>>,
    packages: PackageTable,
}

impl FrameworkPackages {
    pub fn family(&self) -> FrameworkFamily {
        self.family
    }

    pub fn framework(&self) -> &Framework {
        &self.framework
    }

    pub fn framework_name(&self) -> &str {
        &self.framework_name
    }

    pub fn parent(&self) -> Option<&FrameworkPackages> {
        self.parent.as_deref()
    }

    /// Entries stored on this table, excluding inherited ones.
    pub fn packages(&self) -> &PackageTable {
        &self.packages
    }

    /// This table followed by its ancestors, nearest first.
    pub fn lineage(&self) -> impl Iterator<Item = &FrameworkPackages> {
        std::iter::successors(Some(self), |t| t.parent())
    }

    /// The in-box version of `id`: the first table in the lineage that
    /// lists it decides.
    pub fn min_version(&self, id: &str) -> Option<&Version> {
        self.lineage().find_map(|t| t.packages.get(id))
    }

    /// Whether `id` at `version` is already supplied by the framework.
    pub fn is_in_box(&self, id: &str, version: &Version) -> bool {
        self.min_version(id).is_some_and(|min| version <= min)
    }

    /// Every effective entry with the framework that supplies it: own
    /// entries first, then each ancestor's entries not already shadowed.
    pub fn effective_packages(&self) -> Vec<(&str, &Version, &Framework)> {
        let mut seen = PackageTable::new();
        let mut out = Vec::new();
        for table in self.lineage() {
            for (id, version) in table.packages.iter() {
                if seen.contains(id) {
                    continue;
                }
                seen.merge_max(id, version.clone());
                out.push((id, version, &table.framework));
            }
        }
        out
    }
}

struct PendingTable {
    family: FrameworkFamily,
    framework: Framework,
    framework_name: String,
    parent: Option<Framework>,
    packages: PackageTable,
}

/// Collects tables and links them into a registry.
///
/// Registration order does not matter; parents are resolved in
/// [`RegistryBuilder::build`].
#[derive(Default)]
pub struct RegistryBuilder {
    pending: Vec<PendingTable>,
    errors: Vec<PackagesError>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generated table. Parse failures surface from `build`.
    pub fn add(&mut self, spec: TableSpec) -> &mut Self {
        match parse_spec(&spec) {
            Ok(table) => self.pending.push(table),
            Err(e) => self.errors.push(e),
        }
        self
    }

    /// Register a table built at runtime.
    pub fn add_table(
        &mut self,
        family: FrameworkFamily,
        framework: Framework,
        framework_name: impl Into<String>,
        parent: Option<Framework>,
        packages: PackageTable,
    ) -> &mut Self {
        self.pending.push(PendingTable {
            family,
            framework,
            framework_name: framework_name.into(),
            parent,
            packages,
        });
        self
    }

    /// Link parents and freeze the registry.
    ///
    /// Fails when a table is registered twice, names a parent that is not
    /// registered in its family, or takes part in a parent cycle.
    pub fn build(self) -> Result<FrameworkPackageRegistry> {
        if let Some(e) = self.errors.into_iter().next() {
            return Err(e);
        }

        let mut pending: BTreeMap<(FrameworkFamily, Framework), PendingTable> = BTreeMap::new();
        for table in self.pending {
            let key = (table.family, table.framework.clone());
            if pending.contains_key(&key) {
                return Err(PackagesError::Duplicate {
                    family: table.family,
                    framework: table.framework.to_string(),
                });
            }
            pending.insert(key, table);
        }

        for table in pending.values() {
            if let Some(parent) = &table.parent {
                if !pending.contains_key(&(table.family, parent.clone())) {
                    return Err(PackagesError::MissingParent {
                        family: table.family,
                        framework: table.framework.to_string(),
                        parent: parent.to_string(),
                    });
                }
            }
        }

        // Link parents before children. A round that links nothing means
        // every remaining table sits on a cycle.
        let mut built: BTreeMap<(FrameworkFamily, Framework), Arc<FrameworkPackages>> =
            BTreeMap::new();
        while !pending.is_empty() {
            let ready: Vec<(FrameworkFamily, Framework)> = pending
                .iter()
                .filter(|(_, t)| {
                    t.parent
                        .as_ref()
                        .map_or(true, |p| built.contains_key(&(t.family, p.clone())))
                })
                .map(|(key, _)| key.clone())
                .collect();

            if ready.is_empty() {
                let Some((family, framework)) = pending.keys().next() else {
                    break;
                };
                return Err(PackagesError::ParentCycle {
                    family: *family,
                    framework: framework.to_string(),
                });
            }

            for key in ready {
                let Some(table) = pending.remove(&key) else {
                    continue;
                };
                let parent = table
                    .parent
                    .as_ref()
                    .and_then(|p| built.get(&(table.family, p.clone())))
                    .cloned();
                built.insert(
                    key,
                    Arc::new(FrameworkPackages {
                        family: table.family,
                        framework: table.framework,
                        framework_name: table.framework_name,
                        parent,
                        packages: table.packages,
                    }),
                );
            }
        }

        let mut tables: BTreeMap<FrameworkFamily, BTreeMap<Framework, Arc<FrameworkPackages>>> =
            BTreeMap::new();
        for ((family, framework), table) in built {
            tables.entry(family).or_default().insert(framework, table);
        }
        debug!(
            tables = tables.values().map(BTreeMap::len).sum::<usize>(),
            "built framework package registry"
        );
        Ok(FrameworkPackageRegistry { tables })
    }
}

fn parse_spec(spec: &TableSpec) -> Result<PendingTable> {
    let framework = Framework::parse(spec.framework)?;
    let parent = spec.parent.map(Framework::parse).transpose()?;

    let mut packages = PackageTable::new();
    for (id, version) in spec.packages {
        let parsed = Version::parse(version).map_err(|_| PackagesError::InvalidVersion {
            framework: spec.framework.to_string(),
            package: id.to_string(),
            version: version.to_string(),
        })?;
        packages.merge_max(*id, parsed);
    }

    Ok(PendingTable {
        family: spec.family,
        framework,
        framework_name: spec.framework_name.to_string(),
        parent,
        packages,
    })
}

static BUILTIN: Lazy<Result<FrameworkPackageRegistry>> = Lazy::new(|| {
    let mut builder = RegistryBuilder::new();
    generated::register_all(&mut builder);
    builder.build()
});

/// Immutable in-box package tables, by family and framework.
#[derive(Debug)]
pub struct FrameworkPackageRegistry {
    tables: BTreeMap<FrameworkFamily, BTreeMap<Framework, Arc<FrameworkPackages>>>,
}

impl FrameworkPackageRegistry {
    /// The registry built from the bundled tables. Built on first use and
    /// shared for the life of the process.
    pub fn builtin() -> Result<&'static FrameworkPackageRegistry> {
        Lazy::force(&BUILTIN).as_ref().map_err(Clone::clone)
    }

    /// Frameworks with a table in `family`.
    pub fn frameworks(&self, family: FrameworkFamily) -> impl Iterator<Item = &Framework> {
        self.tables.get(&family).into_iter().flat_map(|t| t.keys())
    }

    /// The table for `framework` in `family`, or, when `framework` has no
    /// table of its own, the nearest compatible framework's table.
    pub fn packages_for(
        &self,
        family: FrameworkFamily,
        framework: &Framework,
    ) -> Option<&FrameworkPackages> {
        let tables = self.tables.get(&family)?;
        if let Some(table) = tables.get(framework) {
            return Some(Arc::as_ref(table));
        }
        let nearest = nearest(framework, tables.keys())?;
        tables.get(nearest).map(Arc::as_ref)
    }

    /// Whether `id` at `version` is in-box for `framework` in `family`.
    pub fn is_in_box(
        &self,
        family: FrameworkFamily,
        framework: &Framework,
        id: &str,
        version: &Version,
    ) -> bool {
        self.packages_for(family, framework)
            .is_some_and(|t| t.is_in_box(id, version))
    }

    /// Whether `id` at `version` is in-box for a project targeting
    /// `framework` with the given shared framework references. The default
    /// family always applies; overlays apply only when referenced.
    pub fn is_framework_package(
        &self,
        framework: &Framework,
        references: &[FrameworkFamily],
        id: &str,
        version: &Version,
    ) -> bool {
        std::iter::once(FrameworkFamily::Default)
            .chain(references.iter().copied().filter(FrameworkFamily::is_overlay))
            .any(|family| self.is_in_box(family, framework, id, version))
    }
}
