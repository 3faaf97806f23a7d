//! Asset selection inside a candidate package.
//!
//! The binary that matters for a candidate is the one an application would
//! load at run time, since servicing bumps the runtime asset while the
//! compile asset may stay pinned. Lookup order for a target framework:
//!
//! 1. `lib/<tfm>/` for the nearest compatible `<tfm>`;
//! 2. `runtimes/win/lib/<tfm>/`, a single concrete runtime identifier;
//! 3. `ref/<tfm>/`.
//!
//! A folder holding only the `_._` placeholder counts as selected but
//! empty, so the lookup falls through to the next source.

use std::collections::BTreeMap;

use inbox_core::{nearest, Framework, VersionPair};

use crate::archive::{file_stem, PackageArchive};
use crate::assembly::read_version_pair;
use crate::error::Result;

const ASSET_ROOTS: [&str; 3] = ["lib", "runtimes/win/lib", "ref"];
const MANAGED_EXTENSIONS: [&str; 3] = [".dll", ".exe", ".winmd"];

/// A selected binary and its versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetVersion {
    pub path: String,
    pub versions: VersionPair,
}

/// Read the versions of every selected asset named after the package.
pub fn resolve_asset_versions(
    archive: &PackageArchive,
    framework: &Framework,
) -> Result<Vec<AssetVersion>> {
    let assets = ASSET_ROOTS
        .iter()
        .map(|root| nearest_assets(archive, root, framework))
        .find(|assets| !assets.is_empty())
        .unwrap_or_default();

    let mut out = Vec::new();
    for path in assets {
        if !file_stem(path).eq_ignore_ascii_case(archive.id()) {
            continue;
        }
        let Some(image) = archive.entry(path) else {
            continue;
        };
        let versions = read_version_pair(image)?;
        tracing::debug!(
            id = archive.id(),
            version = archive.version(),
            path,
            %versions,
            "resolved asset"
        );
        out.push(AssetVersion {
            path: path.to_string(),
            versions,
        });
    }
    Ok(out)
}

/// Managed files directly inside `<root>/<tfm>/` for the nearest `<tfm>`.
fn nearest_assets<'a>(archive: &'a PackageArchive, root: &str, target: &Framework) -> Vec<&'a str> {
    let depth = root.matches('/').count() + 1;
    let mut folders: BTreeMap<String, Vec<&'a str>> = BTreeMap::new();
    for path in archive.files_under(root) {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() != depth + 2 {
            continue;
        }
        folders
            .entry(segments[depth].to_ascii_lowercase())
            .or_default()
            .push(path);
    }

    let frameworks: Vec<(Framework, &String)> = folders
        .keys()
        .filter_map(|folder| Framework::parse(folder).ok().map(|f| (f, folder)))
        .collect();
    let candidates: Vec<&Framework> = frameworks.iter().map(|(f, _)| f).collect();
    let Some(best) = nearest(target, candidates) else {
        return Vec::new();
    };
    let Some((_, folder)) = frameworks.iter().find(|(f, _)| f == best) else {
        return Vec::new();
    };

    folders[*folder]
        .iter()
        .copied()
        .filter(|path| {
            let lower = path.to_ascii_lowercase();
            MANAGED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        })
        .collect()
}
