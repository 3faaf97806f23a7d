//! Table generation pipeline.
//!
//! For each tracked framework: enumerate reference packs, keep the newest
//! pack of each major.minor, evaluate its reference assemblies, run the
//! configured runtime imports, apply the pack's overrides. Once every
//! framework is built, each family's tables are reduced against their
//! compatible ancestors.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use inbox_core::{Framework, FrameworkFamily, NuGetVersion, PackageTable};
use inbox_registry::PackageArchive;
use tracing::{debug, info, warn};

use crate::config::{GenerateOptions, ImportKind, TrackedFramework};
use crate::error::{GenError, Result};
use crate::evaluate::{evaluate_package, is_reference_assembly, reference_versions, Evaluation};
use crate::overrides::{apply_overrides, OverrideReport};
use crate::reduce::{reduce, ReductionReport};
use crate::runtime_graph::{apply_package_dependencies, apply_runtime_graph};
use crate::source::PackageSource;

/// Reduced tables, by family and framework.
pub type FamilyTables = BTreeMap<FrameworkFamily, BTreeMap<Framework, PackageTable>>;

/// Statistics for one reference pack.
#[derive(Debug, Clone)]
pub struct FrameworkBuild {
    pub family: FrameworkFamily,
    pub framework: Framework,
    /// Reference pack id and version the table was built from.
    pub package: String,
    pub version: String,
    /// Comparable reference assemblies in the pack.
    pub references: usize,
    /// Packages the evaluator recorded.
    pub evaluated: usize,
    /// Table size before reduction.
    pub entries: usize,
}

/// Summary of a generator run.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub duration_ms: u64,
    pub builds: Vec<FrameworkBuild>,
    /// Reference packs that could not be opened, as `id@version`.
    pub skipped: Vec<String>,
    pub overrides: OverrideReport,
    pub reductions: BTreeMap<FrameworkFamily, ReductionReport>,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Generation Report ===")?;
        writeln!(f, "Duration: {} ms", self.duration_ms)?;

        for family in FrameworkFamily::ALL {
            let builds: Vec<&FrameworkBuild> =
                self.builds.iter().filter(|b| b.family == family).collect();
            if builds.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "--- {family} ---")?;
            for build in builds {
                writeln!(
                    f,
                    "  {:<16} {} {}: {} references, {} evaluated, {} entries",
                    build.framework.short_folder_name(),
                    build.package,
                    build.version,
                    build.references,
                    build.evaluated,
                    build.entries,
                )?;
            }
            if let Some(reduction) = self.reductions.get(&family) {
                writeln!(f, "  Reduction: {reduction}")?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Overrides: {}", self.overrides)?;
        if !self.skipped.is_empty() {
            writeln!(f, "Skipped: {}", self.skipped.join(", "))?;
        }
        Ok(())
    }
}

/// Output of a successful run.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub tables: FamilyTables,
    pub report: GenerationReport,
}

/// Build and reduce the tables for every tracked framework.
pub fn generate<S: PackageSource + ?Sized>(
    source: &S,
    options: &GenerateOptions,
) -> Result<GenerationOutput> {
    if options.frameworks.is_empty() {
        return Err(GenError::NoFrameworks);
    }
    let start = Instant::now();
    let mut tables = FamilyTables::new();
    let mut report = GenerationReport::default();

    for tracked in &options.frameworks {
        let family = tracked.family();
        info!(framework = %tracked.name, %family, "processing framework");

        for (package, version) in candidate_versions(source, tracked)? {
            let archive = match source.open(&package, &version) {
                Ok(archive) => archive,
                Err(e) => {
                    warn!(package = %package, %version, error = %e, "skipping reference pack");
                    report.skipped.push(format!("{package}@{version}"));
                    continue;
                }
            };

            let (table, build) = build_table(source, tracked, &archive, options, &mut report.overrides)?;
            info!(
                framework = %build.framework,
                package = %build.package,
                version = %build.version,
                entries = build.entries,
                "built table"
            );

            let family_tables = tables.entry(family).or_default();
            match family_tables.get_mut(&build.framework) {
                Some(existing) => {
                    debug!(framework = %build.framework, "merging tables for the same framework");
                    for (id, version) in table.iter() {
                        existing.merge_max(id, version.clone());
                    }
                }
                None => {
                    family_tables.insert(build.framework.clone(), table);
                }
            }
            report.builds.push(build);
        }
    }

    for (family, family_tables) in tables.iter_mut() {
        let reduction = reduce(family_tables);
        info!(%family, removed = reduction.len(), "reduced tables");
        report.reductions.insert(*family, reduction);
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    Ok(GenerationOutput { tables, report })
}

/// Reference packs to process for `tracked`, highest first: the listed
/// versions of `<name>.Ref` followed by the configured seeds, keeping only
/// the first version of each major.minor.
pub fn candidate_versions<S: PackageSource + ?Sized>(
    source: &S,
    tracked: &TrackedFramework,
) -> Result<Vec<(String, NuGetVersion)>> {
    let ref_id = tracked.ref_package_id();
    let mut versions: Vec<(String, NuGetVersion)> = source
        .listed_versions(&ref_id)
        .into_iter()
        .map(|v| (ref_id.clone(), v))
        .collect();
    for seed in &tracked.extra_versions {
        versions.push((seed.package.clone(), NuGetVersion::parse(&seed.version)?));
    }

    let mut last: Option<(u64, u64)> = None;
    versions.retain(|(_, v)| {
        let line = (v.major(), v.minor());
        if last == Some(line) {
            return false;
        }
        last = Some(line);
        true
    });
    Ok(versions)
}

/// The comparable reference assemblies of a pack: `ref/` entries, else
/// `build/` entries. A pack with neither cannot provide a baseline.
pub fn reference_files(archive: &PackageArchive) -> Result<Vec<&str>> {
    let mut files = archive.files_under("ref");
    if files.is_empty() {
        files = archive.files_under("build");
    }
    let references: Vec<&str> = files
        .into_iter()
        .filter(|f| is_reference_assembly(f))
        .collect();
    if references.is_empty() {
        return Err(unexpected_format(archive));
    }
    Ok(references)
}

/// The framework a pack targets, from the folder of its first reference
/// assembly (`ref/net6.0/System.Runtime.dll` is `net6.0`).
fn pack_framework(archive: &PackageArchive, references: &[&str]) -> Result<Framework> {
    let tfm = references
        .first()
        .and_then(|path| path.split(|c: char| c == '/' || c == '\\').nth(1))
        .ok_or_else(|| unexpected_format(archive))?;
    Ok(Framework::parse(tfm)?)
}

fn unexpected_format(archive: &PackageArchive) -> GenError {
    GenError::UnexpectedPackageFormat {
        id: archive.id().to_string(),
        version: archive.version().to_string(),
    }
}

fn build_table<S: PackageSource + ?Sized>(
    source: &S,
    tracked: &TrackedFramework,
    archive: &PackageArchive,
    options: &GenerateOptions,
    overrides: &mut OverrideReport,
) -> Result<(PackageTable, FrameworkBuild)> {
    let references = reference_files(archive)?;
    let framework = pack_framework(archive, &references)?;
    let mut table = PackageTable::new();

    let mut evaluated = 0;
    if options.evaluate_assemblies {
        for (id, versions) in reference_versions(archive, &references) {
            if let Evaluation::Recorded(_) =
                evaluate_package(source, &id, &framework, &versions, &mut table)
            {
                evaluated += 1;
            }
        }
    }

    for import in tracked.imports_for(&framework) {
        let version = import.parsed_version()?;
        let applied = match import.kind {
            ImportKind::RuntimeJson => {
                apply_runtime_graph(source, &import.package, &version, &mut table).map(|_| ())
            }
            ImportKind::Dependencies => {
                apply_package_dependencies(source, &import.package, &version, &framework, &mut table)
            }
        };
        if let Err(e) = applied {
            warn!(
                package = %import.package,
                %version,
                %framework,
                error = %e,
                "runtime import failed"
            );
        }
    }

    if let Some(records) = archive.package_overrides() {
        overrides.extend(apply_overrides(&mut table, &records));
    }

    let build = FrameworkBuild {
        family: tracked.family(),
        framework,
        package: archive.id().to_string(),
        version: archive.version().to_string(),
        references: references.len(),
        evaluated,
        entries: table.len(),
    };
    Ok((table, build))
}
