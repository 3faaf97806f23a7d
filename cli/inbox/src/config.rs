//! `inbox.toml` configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use inbox_gen::{default_frameworks, GenerateOptions, TrackedFramework};
use inbox_registry::HttpRegistryConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "inbox.toml";

/// The top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboxConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
    /// Tracked frameworks. Empty means the built-in defaults.
    #[serde(default, rename = "framework")]
    pub frameworks: Vec<TrackedFramework>,
}

/// Where packages come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub flat_container_url: Option<String>,
    #[serde(default)]
    pub registration_url: Option<String>,
    /// Read packages from a local mirror directory instead of the feed.
    #[serde(default)]
    pub mirror: Option<PathBuf>,
    /// Parent directory for the session cache (default: system temp dir).
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Generator settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateConfig {
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub evaluate_assemblies: Option<bool>,
}

impl InboxConfig {
    /// Search upward from `start_dir` for `inbox.toml`, returning it with
    /// the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(Some((Self::load(&candidate)?, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn http_config(&self) -> HttpRegistryConfig {
        let mut config = HttpRegistryConfig::default();
        if let Some(url) = &self.registry.flat_container_url {
            config.flat_container_url = url.clone();
        }
        if let Some(url) = &self.registry.registration_url {
            config.registration_url = url.clone();
        }
        if let Some(secs) = self.registry.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn generate_options(&self) -> GenerateOptions {
        let frameworks = if self.frameworks.is_empty() {
            default_frameworks()
        } else {
            self.frameworks.clone()
        };
        GenerateOptions {
            frameworks,
            evaluate_assemblies: self.generate.evaluate_assemblies.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inbox_core::{Framework, FrameworkFamily};
    use inbox_gen::ImportKind;

    const SAMPLE: &str = r#"
[registry]
mirror = "packages"
timeout_secs = 5

[generate]
output_dir = "src/generated"
evaluate_assemblies = false

[[framework]]
name = "Microsoft.NETCore.App"
extra_versions = [{ package = "Microsoft.NETCore.App", version = "2.1.0" }]

[[framework.runtime_import]]
framework = "netcoreapp2.0"
kind = "runtime-json"
package = "Microsoft.NETCore.Targets"
version = "1.1.4"

[[framework]]
name = "Contoso.Web.App"
family = "aspnetcore"
"#;

    #[test]
    fn parses_every_section() {
        let config: InboxConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.registry.mirror, Some(PathBuf::from("packages")));
        assert_eq!(config.http_config().timeout, Duration::from_secs(5));

        let options = config.generate_options();
        assert!(!options.evaluate_assemblies);
        assert_eq!(options.frameworks.len(), 2);
        let netcore = &options.frameworks[0];
        assert_eq!(netcore.extra_versions[0].version, "2.1.0");
        assert_eq!(netcore.runtime_imports[0].kind, ImportKind::RuntimeJson);
        assert_eq!(netcore.runtime_imports[0].framework, Framework::netcoreapp(2, 0));
        assert_eq!(options.frameworks[1].family(), FrameworkFamily::AspNetCore);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: InboxConfig = toml::from_str("").unwrap();
        let options = config.generate_options();
        assert!(options.evaluate_assemblies);
        assert_eq!(options.frameworks.len(), 4);
        assert!(config.http_config().flat_container_url.starts_with("https://"));
    }

    #[test]
    fn found_by_walking_upward() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[generate]\nevaluate_assemblies = true\n")
            .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, found) = InboxConfig::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(found, dir.path());
        assert_eq!(config.generate.evaluate_assemblies, Some(true));
    }

    #[test]
    fn malformed_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[generate\n").unwrap();
        let err = InboxConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
