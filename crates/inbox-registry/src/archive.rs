//! `.nupkg` archive reader.
//!
//! A package archive is a zip file. The whole archive is read into memory
//! on open; framework reference packs are a few megabytes at most. Entry
//! lookups are case-insensitive and entries keep their archive order, which
//! matters when the first reference file determines the target framework.

use std::io::{Cursor, Read};

use inbox_core::{AssemblyVersion, NuGetVersion, VersionPair};

use crate::error::{RegistryError, Result};
use crate::nuspec::{self, DependencyGroup};
use crate::runtime_json::RuntimeGraph;

const OVERRIDES_PATH: &str = "data/PackageOverrides.txt";
const PLATFORM_MANIFEST_SUFFIX: &str = "platformmanifest.txt";

/// A curated version override: `packageId|version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRecord {
    pub id: String,
    /// Three-part version; any prerelease label has been dropped.
    pub version: semver::Version,
}

/// One record of a `*PlatformManifest.txt` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformManifestEntry {
    /// File name as listed (`System.Runtime.dll`).
    pub file: String,
    pub versions: VersionPair,
}

impl PlatformManifestEntry {
    /// The package id this file corresponds to (file name without extension).
    pub fn package_id(&self) -> &str {
        file_stem(&self.file)
    }
}

/// An opened package archive.
#[derive(Debug)]
pub struct PackageArchive {
    id: String,
    version: String,
    entries: Vec<(String, Vec<u8>)>,
}

impl PackageArchive {
    /// Read every file entry of the zip archive in `bytes`.
    pub fn from_bytes(id: &str, version: &str, bytes: Vec<u8>) -> Result<Self> {
        let invalid = |detail: String| RegistryError::InvalidArchive {
            id: id.to_string(),
            version: version.to_string(),
            detail,
        };

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| invalid(e.to_string()))?;
        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut file = zip.by_index(index).map_err(|e| invalid(e.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().replace('\\', "/");
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| invalid(format!("reading {name}: {e}")))?;
            entries.push((name, data));
        }

        Ok(PackageArchive {
            id: id.to_string(),
            version: version.to_string(),
            entries,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// All file paths in archive order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// File paths below the top-level directory `folder`, in archive order.
    pub fn files_under<'a>(&'a self, folder: &str) -> Vec<&'a str> {
        let prefix = format!("{}/", folder.trim_end_matches('/').to_ascii_lowercase());
        self.files()
            .filter(|name| name.to_ascii_lowercase().starts_with(&prefix))
            .collect()
    }

    /// The contents of `path`, if present.
    pub fn entry(&self, path: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(path))
            .map(|(_, data)| data.as_slice())
    }

    /// Dependency groups declared by the root `.nuspec`. An archive without
    /// a manifest declares none.
    pub fn dependency_groups(&self) -> Result<Vec<DependencyGroup>> {
        let manifest = self
            .entries
            .iter()
            .find(|(name, _)| !name.contains('/') && name.to_ascii_lowercase().ends_with(".nuspec"));
        match manifest {
            Some((_, data)) => nuspec::dependency_groups(data),
            None => Ok(Vec::new()),
        }
    }

    /// The root `runtime.json` graph, if the package carries one.
    pub fn runtime_graph(&self) -> Result<Option<RuntimeGraph>> {
        self.entry("runtime.json")
            .map(RuntimeGraph::from_slice)
            .transpose()
    }

    /// Records of `data/PackageOverrides.txt`, if present. Malformed lines
    /// are skipped.
    pub fn package_overrides(&self) -> Option<Vec<OverrideRecord>> {
        let data = self.entry(OVERRIDES_PATH)?;
        let text = String::from_utf8_lossy(data);
        Some(text.lines().filter_map(parse_override_line).collect())
    }

    /// Records of the first `*PlatformManifest.txt` file, if present.
    pub fn platform_manifest(&self) -> Option<Vec<PlatformManifestEntry>> {
        let (_, data) = self
            .entries
            .iter()
            .find(|(name, _)| name.to_ascii_lowercase().ends_with(PLATFORM_MANIFEST_SUFFIX))?;
        let text = String::from_utf8_lossy(data);
        Some(text.lines().filter_map(parse_manifest_line).collect())
    }
}

fn parse_override_line(line: &str) -> Option<OverrideRecord> {
    let parts: Vec<&str> = line.trim().split('|').collect();
    let [id, version] = parts.as_slice() else {
        return None;
    };
    if id.is_empty() {
        return None;
    }
    let version = NuGetVersion::parse(version).ok()?;
    Some(OverrideRecord {
        id: id.to_string(),
        version: version.as_3part(),
    })
}

fn parse_manifest_line(line: &str) -> Option<PlatformManifestEntry> {
    let parts: Vec<&str> = line.trim().split('|').collect();
    let [file, _, assembly, file_version] = parts.as_slice() else {
        return None;
    };
    let assembly = AssemblyVersion::parse(assembly).ok()?;
    let file_version = AssemblyVersion::parse(file_version).ok()?;
    Some(PlatformManifestEntry {
        file: file.to_string(),
        versions: VersionPair::new(assembly, file_version),
    })
}

/// File name without directory or extension.
pub(crate) fn file_stem(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Build an in-memory `.nupkg` for tests.
#[cfg(test)]
pub(crate) fn build_nupkg(files: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(files: &[(&str, &[u8])]) -> PackageArchive {
        PackageArchive::from_bytes("Test.Pkg", "1.0.0", build_nupkg(files)).unwrap()
    }

    #[test]
    fn entries_keep_archive_order() {
        let archive = open(&[
            ("Test.Pkg.nuspec", b"<package/>"),
            ("ref/net6.0/System.Runtime.dll", b"MZ"),
            ("ref/net6.0/System.Buffers.dll", b"MZ"),
            ("build/Test.Pkg.props", b""),
        ]);
        assert_eq!(
            archive.files_under("ref"),
            vec!["ref/net6.0/System.Runtime.dll", "ref/net6.0/System.Buffers.dll"]
        );
        assert_eq!(archive.files_under("BUILD/"), vec!["build/Test.Pkg.props"]);
        assert!(archive.files_under("lib").is_empty());
        assert_eq!(archive.entry("REF/net6.0/system.runtime.dll"), Some(&b"MZ"[..]));
        assert!(archive.entry("runtime.json").is_none());
    }

    #[test]
    fn garbage_is_an_invalid_archive() {
        let err = PackageArchive::from_bytes("Bad", "1.0.0", b"not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArchive { .. }));
    }

    #[test]
    fn overrides_drop_prerelease_and_skip_malformed_lines() {
        let archive = open(&[(
            "data/PackageOverrides.txt",
            b"System.Memory|4.5.5\r\nMicrosoft.Win32.Registry|6.0.0-rc.2.21480.5\nbroken line\nA|B|C\n|1.0.0\n",
        )]);
        let overrides = archive.package_overrides().unwrap();
        assert_eq!(
            overrides,
            vec![
                OverrideRecord {
                    id: "System.Memory".into(),
                    version: semver::Version::new(4, 5, 5),
                },
                OverrideRecord {
                    id: "Microsoft.Win32.Registry".into(),
                    version: semver::Version::new(6, 0, 0),
                },
            ]
        );
        assert!(open(&[("a.txt", b"")]).package_overrides().is_none());
    }

    #[test]
    fn platform_manifest_records() {
        let archive = open(&[(
            "data/PlatformManifest.txt",
            b"System.Runtime.dll|Microsoft.NETCore.App.Ref|6.0.0.0|6.0.21.52210\nlibclrjit.so|Microsoft.NETCore.App.Ref||6.0.21.52210\nshort|line\n",
        )]);
        let manifest = archive.platform_manifest().unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[0].package_id(), "System.Runtime");
        assert_eq!(manifest[0].versions.assembly, AssemblyVersion::new(6, 0, 0, 0));
        assert_eq!(manifest[1].versions.assembly, AssemblyVersion::default());
        assert_eq!(manifest[1].versions.file, AssemblyVersion::new(6, 0, 21, 52210));
    }

    #[test]
    fn file_stems() {
        assert_eq!(file_stem("ref/net6.0/System.Runtime.dll"), "System.Runtime");
        assert_eq!(file_stem("lib\\netstandard2.0\\Pkg.dll"), "Pkg");
        assert_eq!(file_stem("README"), "README");
    }
}
