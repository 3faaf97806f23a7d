//! In-memory package source for generator tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};

use inbox_core::{AssemblyVersion, Framework, NuGetVersion, VersionPair};
use inbox_registry::{AssetVersion, PackageArchive, RegistryError};

use crate::source::PackageSource;

/// Zip `files` into a `.nupkg`.
pub(crate) fn nupkg(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub(crate) fn pair(assembly: &str, file: &str) -> VersionPair {
    VersionPair::new(
        AssemblyVersion::parse(assembly).unwrap(),
        AssemblyVersion::parse(file).unwrap(),
    )
}

pub(crate) fn nuspec(groups: &[(&str, &[(&str, &str)])]) -> Vec<u8> {
    let mut xml = String::from("<package><metadata><dependencies>");
    for (framework, dependencies) in groups {
        xml.push_str(&format!(r#"<group targetFramework="{framework}">"#));
        for (id, version) in *dependencies {
            xml.push_str(&format!(r#"<dependency id="{id}" version="{version}" />"#));
        }
        xml.push_str("</group>");
    }
    xml.push_str("</dependencies></metadata></package>");
    xml.into_bytes()
}

fn key(id: &str, version: &str) -> (String, String) {
    (
        id.to_ascii_lowercase(),
        NuGetVersion::parse(version).unwrap().normalized(),
    )
}

#[derive(Default)]
pub(crate) struct FakeSource {
    versions: HashMap<String, Vec<NuGetVersion>>,
    archives: HashMap<(String, String), Vec<u8>>,
    assets: HashMap<(String, String), Vec<AssetVersion>>,
    broken: HashSet<(String, String)>,
    /// Every `id@version` opened, in order.
    pub opened: RefCell<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&mut self, id: &str, version: &str) {
        let versions = self.versions.entry(id.to_ascii_lowercase()).or_default();
        let version = NuGetVersion::parse(version).unwrap();
        if !versions.contains(&version) {
            versions.push(version);
        }
    }

    /// Publish an archive with the given files.
    pub fn publish(&mut self, id: &str, version: &str, files: &[(&str, &[u8])]) {
        self.list(id, version);
        self.archives.insert(key(id, version), nupkg(files));
    }

    /// Publish a version whose `id`-named binary has the given versions.
    pub fn with_assets(&mut self, id: &str, version: &str, versions: VersionPair) {
        self.list(id, version);
        self.assets.insert(
            key(id, version),
            vec![AssetVersion {
                path: format!("lib/netstandard2.0/{id}.dll"),
                versions,
            }],
        );
    }

    /// Publish a version that has no binary for any framework.
    pub fn without_assets(&mut self, id: &str, version: &str) {
        self.list(id, version);
        self.assets.insert(key(id, version), Vec::new());
    }

    /// Publish a version whose archive cannot be read.
    pub fn broken(&mut self, id: &str, version: &str) {
        self.list(id, version);
        self.broken.insert(key(id, version));
    }

    fn sorted(&self, id: &str, include_prerelease: bool) -> Vec<NuGetVersion> {
        let mut versions: Vec<NuGetVersion> = self
            .versions
            .get(&id.to_ascii_lowercase())
            .into_iter()
            .flatten()
            .filter(|v| include_prerelease || !v.is_prerelease())
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.cmp(a));
        versions
    }

    fn check_broken(&self, id: &str, version: &NuGetVersion) -> Result<(), RegistryError> {
        if self.broken.contains(&key(id, version.as_str())) {
            return Err(RegistryError::InvalidArchive {
                id: id.to_string(),
                version: version.to_string(),
                detail: "corrupt".to_string(),
            });
        }
        Ok(())
    }
}

impl PackageSource for FakeSource {
    fn stable_versions(&self, id: &str) -> Vec<NuGetVersion> {
        self.sorted(id, false)
    }

    fn listed_versions(&self, id: &str) -> Vec<NuGetVersion> {
        self.sorted(id, true)
    }

    fn open(&self, id: &str, version: &NuGetVersion) -> Result<PackageArchive, RegistryError> {
        self.opened.borrow_mut().push(format!("{id}@{version}"));
        self.check_broken(id, version)?;
        let bytes = self
            .archives
            .get(&key(id, version.as_str()))
            .cloned()
            .ok_or_else(|| RegistryError::VersionNotFound {
                id: id.to_string(),
                version: version.to_string(),
            })?;
        PackageArchive::from_bytes(id, version.as_str(), bytes)
    }

    fn asset_versions(
        &self,
        id: &str,
        version: &NuGetVersion,
        _framework: &Framework,
    ) -> Result<Vec<AssetVersion>, RegistryError> {
        self.opened.borrow_mut().push(format!("{id}@{version}"));
        self.check_broken(id, version)?;
        Ok(self
            .assets
            .get(&key(id, version.as_str()))
            .cloned()
            .unwrap_or_default())
    }
}
