//! Package evaluation against a reference baseline.
//!
//! For a library shipped in a framework's reference pack, find the highest
//! stable package version whose binary does not expose more than the
//! framework's own copy. Versions are scanned from the top; a candidate
//! whose binary is newer than the reference "wins" (it carries API the
//! framework lacks) and the scan moves on to the next lower version. The
//! first candidate that does not win becomes the in-box version.

use inbox_core::{Framework, PackageTable, VersionPair};
use inbox_registry::{read_version_pair, AssetVersion, PackageArchive};
use semver::Version;
use tracing::{debug, warn};

use crate::source::PackageSource;

/// Framework compatibility facades. Their versions track the framework,
/// not any package, so they are never compared.
pub const COMPAT_FACADES: &[&str] = &[
    "mscorlib",
    "Microsoft.VisualBasic",
    "System",
    "System.ComponentModel.DataAnnotations",
    "System.Configuration",
    "System.Core",
    "System.Data",
    "System.Drawing",
    "System.IO.Compression.FileSystem",
    "System.Net",
    "System.Numerics",
    "System.Runtime.Serialization",
    "System.Security",
    "System.ServiceProcess",
    "System.ServiceModel.Web",
    "System.Transactions",
    "System.Web",
    "System.Windows",
    "System.Xml",
    "System.Xml.Serialization",
    "System.Xml.Linq",
    "WindowsBase",
];

pub fn is_compat_facade(name: &str) -> bool {
    COMPAT_FACADES.iter().any(|f| f.eq_ignore_ascii_case(name))
}

/// How an evaluation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// The candidate was recorded as the in-box version.
    Recorded(Version),
    /// The table already held this version or a higher one.
    AlreadySatisfied(Version),
    /// Every stable version exposes more than the reference (or none exist).
    NoCandidate,
    /// A candidate archive could not be read; the package was skipped.
    Skipped,
}

/// Whether a candidate's binaries expose more than `reference`.
///
/// Binaries are checked in order. A newer assembly version wins outright
/// and an older one loses outright. On an equal assembly version a newer
/// file version wins; otherwise the next binary is checked.
pub fn package_wins(assets: &[AssetVersion], reference: &VersionPair) -> bool {
    for asset in assets {
        let candidate = &asset.versions;
        if candidate.assembly > reference.assembly {
            return true;
        }
        if candidate.assembly < reference.assembly {
            return false;
        }
        if candidate.file > reference.file {
            return true;
        }
    }
    false
}

/// Record in `table` the in-box version of `id` for `framework`.
pub fn evaluate_package<S: PackageSource + ?Sized>(
    source: &S,
    id: &str,
    framework: &Framework,
    reference: &VersionPair,
    table: &mut PackageTable,
) -> Evaluation {
    for candidate in source.stable_versions(id) {
        let version = candidate.as_3part();
        if let Some(existing) = table.get(id) {
            if *existing >= version {
                return Evaluation::AlreadySatisfied(existing.clone());
            }
        }

        let assets = match source.asset_versions(id, &candidate, framework) {
            Ok(assets) => assets,
            Err(e) => {
                warn!(id, version = %candidate, error = %e, "skipping package");
                return Evaluation::Skipped;
            }
        };
        if assets.is_empty() {
            debug!(id, version = %candidate, %framework, "no matching assets");
            continue;
        }

        if package_wins(&assets, reference) {
            debug!(id, version = %candidate, %reference, "package exceeds the framework copy");
            continue;
        }

        debug!(id, version = %candidate, %framework, "in-box");
        table.merge_max(id, version.clone());
        return Evaluation::Recorded(version);
    }
    Evaluation::NoCandidate
}

/// The (package id, reference versions) pairs a framework reference pack
/// declares.
///
/// A `*PlatformManifest.txt` is used when the pack carries one, and every
/// record in it is evaluated; a record with no package of that name
/// contributes nothing. Without a manifest each reference assembly is
/// read, leaving out non-`.dll` files and compatibility facades.
/// Unreadable assemblies are skipped with a warning.
pub fn reference_versions(
    archive: &PackageArchive,
    reference_files: &[&str],
) -> Vec<(String, VersionPair)> {
    if let Some(manifest) = archive.platform_manifest() {
        return manifest
            .into_iter()
            .map(|entry| (entry.package_id().to_string(), entry.versions))
            .collect();
    }

    let mut out = Vec::new();
    for &file in reference_files.iter().filter(|f| is_reference_assembly(f)) {
        let Some(image) = archive.entry(file) else {
            continue;
        };
        match read_version_pair(image) {
            Ok(versions) => out.push((stem(file).to_string(), versions)),
            Err(e) => warn!(file, error = %e, "unreadable reference assembly"),
        }
    }
    out
}

/// A `.dll` that is not a compatibility facade.
pub fn is_reference_assembly(file: &str) -> bool {
    file.to_ascii_lowercase().ends_with(".dll") && !is_compat_facade(stem(file))
}

fn stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{nupkg, pair, FakeSource};

    fn ver(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn source() -> FakeSource {
        let mut source = FakeSource::new();
        source.with_assets("PkgA", "3.0.0", pair("4.3.0.0", "4.700.0.0"));
        source.with_assets("PkgA", "2.5.0", pair("4.2.0.0", "4.600.0.0"));
        source.with_assets("PkgA", "2.0.0", pair("4.1.0.0", "4.500.0.0"));
        source
    }

    #[test]
    fn first_non_winning_version_is_recorded() {
        let source = source();
        let mut table = PackageTable::new();
        let outcome = evaluate_package(
            &source,
            "PkgA",
            &Framework::netcoreapp(2, 1),
            &pair("4.2.0.0", "4.600.0.0"),
            &mut table,
        );
        assert_eq!(outcome, Evaluation::Recorded(ver("2.5.0")));
        assert_eq!(table.get("PkgA"), Some(&ver("2.5.0")));
        assert_eq!(
            *source.opened.borrow(),
            vec!["PkgA@3.0.0".to_string(), "PkgA@2.5.0".to_string()]
        );
    }

    #[test]
    fn equal_file_version_loses() {
        let source = source();
        let mut table = PackageTable::new();
        let reference = pair("4.3.0.0", "4.700.0.0");
        evaluate_package(&source, "PkgA", &Framework::netcoreapp(3, 0), &reference, &mut table);
        assert_eq!(table.get("PkgA"), Some(&ver("3.0.0")));

        let mut table = PackageTable::new();
        let reference = pair("4.3.0.0", "4.699.0.0");
        evaluate_package(&source, "PkgA", &Framework::netcoreapp(3, 0), &reference, &mut table);
        assert_eq!(table.get("PkgA"), Some(&ver("2.5.0")));
    }

    #[test]
    fn every_version_winning_records_nothing() {
        let source = source();
        let mut table = PackageTable::new();
        let outcome = evaluate_package(
            &source,
            "PkgA",
            &Framework::netstandard(2, 0),
            &pair("4.0.0.0", "4.0.0.0"),
            &mut table,
        );
        assert_eq!(outcome, Evaluation::NoCandidate);
        assert!(table.is_empty());
        assert_eq!(
            evaluate_package(&source, "Unknown", &Framework::netstandard(2, 0), &pair("1.0", "1.0"), &mut table),
            Evaluation::NoCandidate
        );
    }

    #[test]
    fn existing_higher_version_stops_the_scan() {
        let source = source();
        let mut table = PackageTable::from_entries([("PkgA", ver("3.0.0"))]);
        let outcome = evaluate_package(
            &source,
            "PkgA",
            &Framework::netcoreapp(2, 1),
            &pair("4.2.0.0", "4.600.0.0"),
            &mut table,
        );
        assert_eq!(outcome, Evaluation::AlreadySatisfied(ver("3.0.0")));
        assert!(source.opened.borrow().is_empty());
        assert_eq!(table.get("PkgA"), Some(&ver("3.0.0")));
    }

    #[test]
    fn versions_without_assets_are_passed_over() {
        let mut source = source();
        source.without_assets("PkgA", "3.0.0");
        let mut table = PackageTable::new();
        evaluate_package(
            &source,
            "PkgA",
            &Framework::netcoreapp(3, 0),
            &pair("4.3.0.0", "4.700.0.0"),
            &mut table,
        );
        assert_eq!(table.get("PkgA"), Some(&ver("2.5.0")));
    }

    #[test]
    fn unreadable_archive_skips_the_package() {
        let mut source = source();
        source.broken("PkgA", "3.0.0");
        let mut table = PackageTable::new();
        let outcome = evaluate_package(
            &source,
            "PkgA",
            &Framework::netcoreapp(3, 0),
            &pair("4.3.0.0", "4.700.0.0"),
            &mut table,
        );
        assert_eq!(outcome, Evaluation::Skipped);
        assert!(table.is_empty());
    }

    #[test]
    fn rerunning_never_lowers_the_baseline() {
        let source = source();
        let mut table = PackageTable::new();
        let framework = Framework::netcoreapp(3, 0);
        evaluate_package(&source, "PkgA", &framework, &pair("4.3.0.0", "4.700.0.0"), &mut table);
        evaluate_package(&source, "PkgA", &framework, &pair("4.1.0.0", "4.500.0.0"), &mut table);
        assert_eq!(table.get("PkgA"), Some(&ver("3.0.0")));
    }

    #[test]
    fn mixed_assets_decide_on_the_first_difference() {
        let asset = |assembly: &str, file: &str| AssetVersion {
            path: String::new(),
            versions: pair(assembly, file),
        };
        let reference = pair("4.0.0.0", "4.0.0.0");
        assert!(!package_wins(&[asset("3.0.0.0", "9.0.0.0"), asset("5.0.0.0", "0.0")], &reference));
        assert!(package_wins(&[asset("4.0.0.0", "4.0.0.0"), asset("4.0.0.0", "4.0.0.1")], &reference));
        assert!(!package_wins(&[], &reference));
    }

    #[test]
    fn platform_manifest_records_are_all_evaluated() {
        let manifest = b"System.Memory.dll|Microsoft.NETCore.App.Ref|4.2.1.0|4.700.19.46214\n\
System.Core.dll|Microsoft.NETCore.App.Ref|4.0.0.0|4.700.19.46214\n\
libclrjit.so|Microsoft.NETCore.App.Ref||4.700.19.46214\n";
        let bytes = nupkg(&[
            ("ref/netcoreapp3.0/System.Memory.dll", b"not read"),
            ("data/PlatformManifest.txt", manifest),
        ]);
        let archive = PackageArchive::from_bytes("Microsoft.NETCore.App.Ref", "3.0.0", bytes).unwrap();
        let refs = reference_versions(&archive, &["ref/netcoreapp3.0/System.Memory.dll"]);
        assert_eq!(
            refs,
            vec![
                ("System.Memory".to_string(), pair("4.2.1.0", "4.700.19.46214")),
                ("System.Core".to_string(), pair("4.0.0.0", "4.700.19.46214")),
                ("libclrjit".to_string(), pair("0.0.0.0", "4.700.19.46214")),
            ]
        );
    }

    #[test]
    fn unreadable_reference_assemblies_are_skipped() {
        let bytes = nupkg(&[
            ("ref/netstandard2.0/System.Buffers.dll", b"garbage"),
            ("ref/netstandard2.0/mscorlib.dll", b"garbage"),
        ]);
        let archive = PackageArchive::from_bytes("NETStandard.Library", "2.0.0", bytes).unwrap();
        let files: Vec<&str> = archive.files_under("ref");
        assert!(reference_versions(&archive, &files).is_empty());
    }

    #[test]
    fn facades_are_matched_ignoring_case() {
        assert!(is_compat_facade("MSCORLIB"));
        assert!(is_compat_facade("System.Xml.Linq"));
        assert!(!is_compat_facade("System.Memory"));
    }
}
