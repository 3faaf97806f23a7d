//! Runtime graph and dependency-closure imports.
//!
//! Some packages are part of a framework only through the native runtime
//! packages it pulls in. These are folded into a table with max-merge, so
//! an import never lowers what evaluation already recorded.

use inbox_core::{nearest, Framework, MergeOutcome, NuGetVersion, PackageTable};
use inbox_registry::DependencyGroup;
use tracing::{debug, warn};

use crate::error::Result;
use crate::source::PackageSource;

/// Merge every (dependency, minimum version) pair of `id@version`'s
/// `runtime.json`, across all runtime identifiers, into `table`. Returns
/// the number of entries inserted or raised. A package without a
/// `runtime.json` contributes nothing.
pub fn apply_runtime_graph<S: PackageSource + ?Sized>(
    source: &S,
    id: &str,
    version: &NuGetVersion,
    table: &mut PackageTable,
) -> Result<usize> {
    let archive = source.open(id, version)?;
    let Some(graph) = archive.runtime_graph()? else {
        warn!(id, %version, "package has no runtime.json");
        return Ok(0);
    };

    let mut changed = 0;
    for (dependency, min_version) in graph.dependencies() {
        match table.merge_max(dependency.as_str(), min_version.as_3part()) {
            MergeOutcome::Inserted | MergeOutcome::Raised { .. } => changed += 1,
            MergeOutcome::Unchanged { .. } => {}
        }
    }
    debug!(id, %version, changed, "applied runtime graph");
    Ok(changed)
}

/// Record `id@version` and, recursively, the minimum versions of its
/// dependencies for `framework`.
///
/// A package already recorded at an equal or higher version is not
/// expanded again, which also ends cycles. Failures below the top-level
/// package are logged and that branch is dropped.
pub fn apply_package_dependencies<S: PackageSource + ?Sized>(
    source: &S,
    id: &str,
    version: &NuGetVersion,
    framework: &Framework,
    table: &mut PackageTable,
) -> Result<()> {
    let wanted = version.as_3part();
    if table.get(id).is_some_and(|existing| *existing >= wanted) {
        return Ok(());
    }
    table.merge_max(id, wanted);

    let archive = source.open(id, version)?;
    let groups = archive.dependency_groups()?;
    let Some(group) = nearest_group(&groups, framework) else {
        return Ok(());
    };

    for dependency in &group.packages {
        if let Err(e) = apply_package_dependencies(
            source,
            &dependency.id,
            &dependency.min_version,
            framework,
            table,
        ) {
            warn!(
                parent = id,
                id = %dependency.id,
                version = %dependency.min_version,
                error = %e,
                "could not expand dependency"
            );
        }
    }
    Ok(())
}

/// The dependency group that applies to `framework`: the nearest
/// framework-specific group, else the framework-agnostic one.
fn nearest_group<'a>(groups: &'a [DependencyGroup], framework: &Framework) -> Option<&'a DependencyGroup> {
    let specific = nearest(
        framework,
        groups.iter().filter_map(|g| g.target_framework.as_ref()),
    );
    match specific {
        Some(target) => groups
            .iter()
            .find(|g| g.target_framework.as_ref() == Some(target)),
        None => groups.iter().find(|g| g.target_framework.is_none()),
    }
}
