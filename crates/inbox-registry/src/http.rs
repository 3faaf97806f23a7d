//! NuGet v3 HTTP backend.
//!
//! Uses three surfaces of a v3 feed:
//! - flat container listing: `GET {flat}/{id}/index.json` → `{"versions": [...]}`
//! - registration (metadata): `GET {registration}/{id}/index.json`, whose
//!   pages may be inlined or linked by `@id`; the default hive lists
//!   SemVer 2.0 versions
//! - content: `GET {flat}/{id}/{version}/{id}.{version}.nupkg`
//!
//! Requests are blocking and never retried. Downloads go through the
//! session [`PackageCache`] when one is attached.

use std::time::Duration;

use inbox_core::NuGetVersion;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::cache::PackageCache;
use crate::client::{CatalogEntry, RegistryBackend};
use crate::error::{RegistryError, Result};

const DEFAULT_FLAT_CONTAINER_URL: &str = "https://api.nuget.org/v3-flatcontainer";
/// The SemVer 2.0 registration hive (`RegistrationsBaseUrl/3.6.0`), served
/// gzip-compressed. The SemVer 1.0 hives omit dotted prerelease labels.
const DEFAULT_REGISTRATION_URL: &str = "https://api.nuget.org/v3/registration5-gz-semver2";

/// Endpoint and client settings for [`HttpRegistry`].
#[derive(Debug, Clone)]
pub struct HttpRegistryConfig {
    pub flat_container_url: String,
    pub registration_url: String,
    pub timeout: Duration,
}

impl Default for HttpRegistryConfig {
    fn default() -> Self {
        HttpRegistryConfig {
            flat_container_url: DEFAULT_FLAT_CONTAINER_URL.to_string(),
            registration_url: DEFAULT_REGISTRATION_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// A NuGet v3 feed.
pub struct HttpRegistry {
    config: HttpRegistryConfig,
    client: reqwest::blocking::Client,
    cache: Option<PackageCache>,
}

#[derive(Debug, Deserialize)]
struct FlatVersions {
    versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegistrationIndex {
    #[serde(default)]
    items: Vec<RegistrationPage>,
}

#[derive(Debug, Deserialize)]
struct RegistrationPage {
    #[serde(rename = "@id")]
    id: String,
    #[serde(default)]
    items: Option<Vec<RegistrationLeaf>>,
}

#[derive(Debug, Deserialize)]
struct RegistrationLeaf {
    #[serde(rename = "catalogEntry")]
    catalog_entry: CatalogEntryJson,
}

#[derive(Debug, Deserialize)]
struct CatalogEntryJson {
    version: String,
    #[serde(default = "listed_by_default")]
    listed: bool,
}

fn listed_by_default() -> bool {
    true
}

impl HttpRegistry {
    /// Create a backend with the given endpoints.
    pub fn new(config: HttpRegistryConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(config.timeout)
            .user_agent(concat!("inbox/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::Http {
                url: config.flat_container_url.clone(),
                status: None,
                detail: e.to_string(),
            })?;
        Ok(HttpRegistry {
            config,
            client,
            cache: None,
        })
    }

    /// Serve repeated downloads from `cache`.
    pub fn with_cache(mut self, cache: PackageCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn flat_index_url(&self, id: &str) -> String {
        format!(
            "{}/{}/index.json",
            self.config.flat_container_url.trim_end_matches('/'),
            id.to_ascii_lowercase()
        )
    }

    fn registration_url(&self, id: &str) -> String {
        format!(
            "{}/{}/index.json",
            self.config.registration_url.trim_end_matches('/'),
            id.to_ascii_lowercase()
        )
    }

    fn content_url(&self, id: &str, version: &NuGetVersion) -> String {
        let id = id.to_ascii_lowercase();
        let version = version.normalized();
        format!(
            "{}/{id}/{version}/{id}.{version}.nupkg",
            self.config.flat_container_url.trim_end_matches('/'),
        )
    }

    fn get(&self, url: &str, id: &str) -> Result<reqwest::blocking::Response> {
        let response = self.client.get(url).send().map_err(|e| RegistryError::Http {
            url: url.to_string(),
            status: None,
            detail: e.to_string(),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::PackageNotFound { id: id.to_string() });
        }
        if !status.is_success() {
            return Err(RegistryError::Http {
                url: url.to_string(),
                status: Some(status.as_u16()),
                detail: status.to_string(),
            });
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, id: &str) -> Result<T> {
        let body = self
            .get(url, id)?
            .text()
            .map_err(|e| RegistryError::Http {
                url: url.to_string(),
                status: None,
                detail: e.to_string(),
            })?;
        serde_json::from_str(&body).map_err(|e| RegistryError::MalformedResponse {
            url: url.to_string(),
            detail: e.to_string(),
        })
    }
}

impl RegistryBackend for HttpRegistry {
    fn list_versions(&self, id: &str) -> Result<Vec<NuGetVersion>> {
        let url = self.flat_index_url(id);
        let listing: FlatVersions = self.get_json(&url, id)?;
        Ok(parse_versions(&listing.versions))
    }

    fn catalog(&self, id: &str) -> Result<Vec<CatalogEntry>> {
        let url = self.registration_url(id);
        let index: RegistrationIndex = self.get_json(&url, id)?;

        let mut entries = Vec::new();
        for page in index.items {
            let leaves = match page.items {
                Some(leaves) => leaves,
                None => {
                    let linked: RegistrationPage = self.get_json(&page.id, id)?;
                    linked.items.unwrap_or_default()
                }
            };
            entries.extend(catalog_entries(leaves));
        }
        Ok(entries)
    }

    fn download(&self, id: &str, version: &NuGetVersion) -> Result<Vec<u8>> {
        let key = version.normalized();
        if let Some(cache) = &self.cache {
            if let Some(bytes) = cache.get(id, &key)? {
                tracing::debug!(id, version = %key, "archive served from session cache");
                return Ok(bytes);
            }
        }

        let url = self.content_url(id, version);
        tracing::debug!(%url, "downloading package");
        let bytes = self
            .get(&url, id)
            .map_err(|e| match e {
                RegistryError::PackageNotFound { .. } => RegistryError::VersionNotFound {
                    id: id.to_string(),
                    version: version.to_string(),
                },
                other => other,
            })?
            .bytes()
            .map_err(|e| RegistryError::Http {
                url: url.clone(),
                status: None,
                detail: e.to_string(),
            })?
            .to_vec();

        if let Some(cache) = &self.cache {
            cache.store(id, &key, &bytes)?;
        }
        Ok(bytes)
    }
}

/// Parse version strings, dropping any that are not valid NuGet versions.
fn parse_versions(raw: &[String]) -> Vec<NuGetVersion> {
    raw.iter()
        .filter_map(|v| NuGetVersion::parse(v).ok())
        .collect()
}

fn catalog_entries(leaves: Vec<RegistrationLeaf>) -> impl Iterator<Item = CatalogEntry> {
    leaves.into_iter().filter_map(|leaf| {
        NuGetVersion::parse(&leaf.catalog_entry.version)
            .ok()
            .map(|version| CatalogEntry {
                version,
                listed: leaf.catalog_entry.listed,
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> HttpRegistry {
        HttpRegistry::new(HttpRegistryConfig {
            flat_container_url: "https://feed.example/flat/".to_string(),
            registration_url: "https://feed.example/reg".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn endpoint_urls_are_lowercase() {
        let registry = registry();
        assert_eq!(
            registry.flat_index_url("System.Memory"),
            "https://feed.example/flat/system.memory/index.json"
        );
        assert_eq!(
            registry.registration_url("System.Memory"),
            "https://feed.example/reg/system.memory/index.json"
        );
        let version = NuGetVersion::parse("9.0.0-RC.1").unwrap();
        assert_eq!(
            registry.content_url("Microsoft.NETCore.App.Ref", &version),
            "https://feed.example/flat/microsoft.netcore.app.ref/9.0.0-rc.1/microsoft.netcore.app.ref.9.0.0-rc.1.nupkg"
        );
    }

    #[test]
    fn default_registration_hive_lists_semver2_versions() {
        let config = HttpRegistryConfig::default();
        assert_eq!(
            config.registration_url,
            "https://api.nuget.org/v3/registration5-gz-semver2"
        );

        let json = r#"{
            "items": [{
                "@id": "https://feed.example/reg/microsoft.netcore.app.ref/index.json#page/9.0.0/9.0.0",
                "items": [
                    { "catalogEntry": { "version": "9.0.0-rc.2.24473.5" } },
                    { "catalogEntry": { "version": "9.0.0+build.7" } }
                ]
            }]
        }"#;
        let index: RegistrationIndex = serde_json::from_str(json).unwrap();
        let page = index.items.into_iter().next().unwrap();
        let entries: Vec<CatalogEntry> = catalog_entries(page.items.unwrap()).collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].version.is_prerelease());
        assert_eq!(entries[0].version.normalized(), "9.0.0-rc.2.24473.5");
        assert!(!entries[1].version.is_prerelease());
    }

    #[test]
    fn registration_page_parsing() {
        let json = r#"{
            "items": [
                {
                    "@id": "https://feed.example/reg/pkg/index.json#page/1.0.0/2.0.0",
                    "items": [
                        { "catalogEntry": { "version": "1.0.0", "listed": false } },
                        { "catalogEntry": { "version": "2.0.0" } },
                        { "catalogEntry": { "version": "not-a-version" } }
                    ]
                },
                { "@id": "https://feed.example/reg/pkg/page2.json" }
            ]
        }"#;
        let index: RegistrationIndex = serde_json::from_str(json).unwrap();
        assert_eq!(index.items.len(), 2);
        assert!(index.items[1].items.is_none());

        let first = index.items.into_iter().next().unwrap();
        let entries: Vec<CatalogEntry> = catalog_entries(first.items.unwrap()).collect();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].listed);
        assert!(entries[1].listed);
    }

    #[test]
    fn flat_listing_skips_invalid_versions() {
        let listing: FlatVersions =
            serde_json::from_str(r#"{ "versions": ["1.0.0", "bogus", "2.0.0-beta"] }"#).unwrap();
        let versions = parse_versions(&listing.versions);
        assert_eq!(versions.len(), 2);
        assert!(versions[1].is_prerelease());
    }
}
