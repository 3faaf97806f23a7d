//! `runtime.json` runtime dependency graphs.
//!
//! ```json
//! { "runtimes": {
//!     "win7-x64": {
//!       "#import": [ "win7" ],
//!       "runtime.native.System": {
//!         "runtime.win7-x64.runtime.native.System": "4.3.0"
//!       } } } }
//! ```

use std::collections::BTreeMap;

use inbox_core::{parse_range_min, NuGetVersion};
use serde::Deserialize;

use crate::error::Result;

/// Runtime identifiers and the native dependencies each one adds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeGraph {
    #[serde(default)]
    runtimes: BTreeMap<String, RuntimeDescription>,
}

/// One runtime identifier's entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuntimeDescription {
    #[serde(rename = "#import", default)]
    pub imports: Vec<String>,
    /// Package id → (dependency id → version range).
    #[serde(flatten)]
    pub dependency_sets: BTreeMap<String, BTreeMap<String, String>>,
}

impl RuntimeGraph {
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Runtime identifiers in sorted order.
    pub fn runtime_ids(&self) -> impl Iterator<Item = &str> {
        self.runtimes.keys().map(String::as_str)
    }

    pub fn runtime(&self, rid: &str) -> Option<&RuntimeDescription> {
        self.runtimes.get(rid)
    }

    /// Every (dependency id, minimum version) pair across all runtimes.
    /// The same id may appear more than once. Unparseable ranges are skipped.
    pub fn dependencies(&self) -> Vec<(String, NuGetVersion)> {
        let mut out = Vec::new();
        for (rid, runtime) in &self.runtimes {
            for dependencies in runtime.dependency_sets.values() {
                for (id, range) in dependencies {
                    match parse_range_min(range) {
                        Ok(version) => out.push((id.clone(), version)),
                        Err(e) => {
                            tracing::warn!(rid = %rid, id = %id, error = %e, "ignoring runtime dependency")
                        }
                    }
                }
            }
        }
        out
    }
}
