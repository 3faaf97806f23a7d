//! Tracked frameworks and generator options.
//!
//! The defaults reproduce the four shared frameworks the bundled tables are
//! built from. Every field is deserializable so the CLI can take overrides
//! from `inbox.toml`.

use inbox_core::{Framework, FrameworkFamily, NuGetVersion};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An additional framework package version processed after the reference
/// pack listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedVersion {
    pub package: String,
    pub version: String,
}

/// How a runtime import pulls packages into a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportKind {
    /// Every dependency of the package's `runtime.json`.
    RuntimeJson,
    /// The package and its dependency closure.
    Dependencies,
}

/// A package folded into one framework's table after evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeImport {
    pub framework: Framework,
    pub kind: ImportKind,
    pub package: String,
    pub version: String,
}

impl RuntimeImport {
    fn new(framework: Framework, kind: ImportKind, package: &str, version: &str) -> Self {
        RuntimeImport {
            framework,
            kind,
            package: package.to_string(),
            version: version.to_string(),
        }
    }

    pub fn parsed_version(&self) -> Result<NuGetVersion> {
        Ok(NuGetVersion::parse(&self.version)?)
    }
}

/// A shared framework whose reference packs feed the tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFramework {
    /// Shared framework name, e.g. `Microsoft.NETCore.App`.
    pub name: String,
    /// Family the tables belong to; derived from `name` when absent.
    #[serde(default)]
    pub family: Option<FrameworkFamily>,
    #[serde(default)]
    pub extra_versions: Vec<SeedVersion>,
    #[serde(default, rename = "runtime_import")]
    pub runtime_imports: Vec<RuntimeImport>,
}

impl TrackedFramework {
    pub fn new(name: &str) -> Self {
        TrackedFramework {
            name: name.to_string(),
            family: None,
            extra_versions: Vec::new(),
            runtime_imports: Vec::new(),
        }
    }

    pub fn family(&self) -> FrameworkFamily {
        self.family
            .or_else(|| FrameworkFamily::for_framework_name(&self.name))
            .unwrap_or(FrameworkFamily::Default)
    }

    /// The reference pack package id (`<name>.Ref`).
    pub fn ref_package_id(&self) -> String {
        format!("{}.Ref", self.name)
    }

    fn seed(mut self, package: &str, version: &str) -> Self {
        self.extra_versions.push(SeedVersion {
            package: package.to_string(),
            version: version.to_string(),
        });
        self
    }

    fn import(mut self, import: RuntimeImport) -> Self {
        self.runtime_imports.push(import);
        self
    }

    /// Imports configured for `framework`.
    pub fn imports_for<'a>(&'a self, framework: &'a Framework) -> impl Iterator<Item = &'a RuntimeImport> {
        self.runtime_imports
            .iter()
            .filter(move |i| i.framework == *framework)
    }
}

/// The default tracked frameworks.
///
/// .NET Core 2.x shipped no reference packs, so its framework packages are
/// seeded directly. For `netcoreapp2.0` the runtime graph of
/// `Microsoft.NETCore.Targets` and the closures of the native crypto
/// packages stand in for the missing reference assemblies.
pub fn default_frameworks() -> Vec<TrackedFramework> {
    let netcoreapp20 = Framework::netcoreapp(2, 0);
    let dependencies = |package: &str, version: &str| {
        RuntimeImport::new(netcoreapp20.clone(), ImportKind::Dependencies, package, version)
    };

    vec![
        TrackedFramework::new("Microsoft.NETCore.App")
            .seed("Microsoft.NETCore.App", "2.1.0")
            .seed("Microsoft.NETCore.App", "2.0.0")
            .import(RuntimeImport::new(
                netcoreapp20.clone(),
                ImportKind::RuntimeJson,
                "Microsoft.NETCore.Targets",
                "1.1.4",
            ))
            .import(dependencies("runtime.native.System.Security.Cryptography", "4.3.4"))
            .import(dependencies(
                "runtime.native.System.Security.Cryptography.OpenSsl",
                "4.3.3",
            ))
            .import(dependencies(
                "runtime.native.System.Security.Cryptography.Apple",
                "4.3.1",
            ))
            .import(dependencies("Microsoft.NETCore.App", "2.0.0")),
        TrackedFramework::new("Microsoft.AspNetCore.App"),
        TrackedFramework::new("Microsoft.WindowsDesktop.App"),
        TrackedFramework::new("NETStandard.Library").seed("NETStandard.Library", "2.0.0"),
    ]
}

/// Options for one generator run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub frameworks: Vec<TrackedFramework>,
    /// Compare reference assemblies against published packages. When off,
    /// only runtime imports and overrides populate the tables.
    pub evaluate_assemblies: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            frameworks: default_frameworks(),
            evaluate_assemblies: true,
        }
    }
}
