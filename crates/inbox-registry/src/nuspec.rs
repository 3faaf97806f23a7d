//! `.nuspec` dependency groups.
//!
//! Only `package/metadata/dependencies` is read. Dependencies listed
//! directly under `<dependencies>` (the pre-group layout) form a single
//! group with no target framework. Groups whose target framework is not one
//! this tool models are dropped.

use inbox_core::{parse_range_min, Framework, NuGetVersion};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{RegistryError, Result};

/// A declared dependency: package id plus the minimum of its version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDependency {
    pub id: String,
    pub min_version: NuGetVersion,
}

/// Dependencies for one target framework (`None` applies to any framework).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGroup {
    pub target_framework: Option<Framework>,
    pub packages: Vec<PackageDependency>,
}

/// Parse the dependency groups of a `.nuspec` document.
pub fn dependency_groups(xml: &[u8]) -> Result<Vec<DependencyGroup>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut groups: Vec<DependencyGroup> = Vec::new();
    let mut ungrouped: Vec<PackageDependency> = Vec::new();
    let mut in_dependencies = false;
    // Some(None) while inside a group with an unsupported framework.
    let mut current: Option<Option<DependencyGroup>> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| RegistryError::InvalidNuspec {
                detail: format!("at byte {}: {e}", reader.buffer_position()),
            })?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"dependencies" if !is_empty => in_dependencies = true,
                    b"group" if in_dependencies => {
                        let group = open_group(e)?;
                        if is_empty {
                            groups.extend(group);
                        } else {
                            current = Some(group);
                        }
                    }
                    b"dependency" if in_dependencies => {
                        let dependency = read_dependency(e)?;
                        match current.as_mut() {
                            Some(Some(group)) => group.packages.push(dependency),
                            Some(None) => {}
                            None => ungrouped.push(dependency),
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"dependencies" => in_dependencies = false,
                b"group" => {
                    if let Some(group) = current.take() {
                        groups.extend(group);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !ungrouped.is_empty() {
        groups.push(DependencyGroup {
            target_framework: None,
            packages: ungrouped,
        });
    }
    Ok(groups)
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| RegistryError::InvalidNuspec {
            detail: e.to_string(),
        })?;
        if attr.key.local_name().as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| RegistryError::InvalidNuspec {
                    detail: e.to_string(),
                })?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// `None` when the group targets a framework outside the modeled set.
fn open_group(element: &BytesStart<'_>) -> Result<Option<DependencyGroup>> {
    let target = attribute(element, b"targetFramework")?.unwrap_or_default();
    if target.trim().is_empty() {
        return Ok(Some(DependencyGroup {
            target_framework: None,
            packages: Vec::new(),
        }));
    }
    match parse_target_framework(&target) {
        Some(framework) => Ok(Some(DependencyGroup {
            target_framework: Some(framework),
            packages: Vec::new(),
        })),
        None => {
            tracing::debug!(target_framework = %target, "skipping dependency group");
            Ok(None)
        }
    }
}

fn read_dependency(element: &BytesStart<'_>) -> Result<PackageDependency> {
    let id = attribute(element, b"id")?.ok_or_else(|| RegistryError::InvalidNuspec {
        detail: "dependency without id".to_string(),
    })?;
    let range = attribute(element, b"version")?.unwrap_or_else(|| "0.0.0".to_string());
    let min_version = parse_range_min(&range)?;
    Ok(PackageDependency { id, min_version })
}

/// Accept both short folder names (`netstandard2.0`) and the nuspec long
/// form (`.NETStandard2.0`, `.NETFramework4.6.1`).
fn parse_target_framework(value: &str) -> Option<Framework> {
    let lower = value.trim().to_ascii_lowercase();
    let short = if let Some(rest) = lower.strip_prefix(".netstandard") {
        format!("netstandard{rest}")
    } else if let Some(rest) = lower.strip_prefix(".netcoreapp") {
        format!("netcoreapp{rest}")
    } else if let Some(rest) = lower.strip_prefix(".netframework") {
        format!("net{rest}")
    } else {
        lower
    };
    Framework::parse(&short).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUSPEC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata>
    <id>runtime.native.System.Security.Cryptography.OpenSsl</id>
    <version>4.3.3</version>
    <dependencies>
      <group targetFramework=".NETStandard1.6">
        <dependency id="System.Collections" version="4.3.0" />
        <dependency id="System.Runtime" version="[4.3.1, )" />
      </group>
      <group targetFramework="netcoreapp2.0" />
      <group targetFramework="MonoAndroid10">
        <dependency id="Xamarin.Only" version="1.0.0" />
      </group>
      <group>
        <dependency id="Any.Framework" version="(1.0.0, 2.0.0]" />
      </group>
    </dependencies>
  </metadata>
</package>"#;

    #[test]
    fn parses_groups() {
        let groups = dependency_groups(NUSPEC.as_bytes()).unwrap();
        assert_eq!(groups.len(), 3);

        assert_eq!(groups[0].target_framework, Some(Framework::netstandard(1, 6)));
        let ids: Vec<&str> = groups[0].packages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["System.Collections", "System.Runtime"]);
        assert_eq!(groups[0].packages[1].min_version.to_string(), "4.3.1");

        assert_eq!(groups[1].target_framework, Some(Framework::netcoreapp(2, 0)));
        assert!(groups[1].packages.is_empty());

        assert_eq!(groups[2].target_framework, None);
        assert_eq!(groups[2].packages[0].id, "Any.Framework");
    }

    #[test]
    fn ungrouped_dependencies() {
        let xml = br#"<package><metadata><dependencies>
            <dependency id="Legacy" version="1.2.0" />
        </dependencies></metadata></package>"#;
        let groups = dependency_groups(xml).unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].target_framework.is_none());
        assert_eq!(groups[0].packages[0].min_version.to_string(), "1.2.0");
    }

    #[test]
    fn no_dependencies() {
        let xml = br#"<package><metadata><id>X</id></metadata></package>"#;
        assert!(dependency_groups(xml).unwrap().is_empty());
    }

    #[test]
    fn long_framework_names() {
        assert_eq!(
            parse_target_framework(".NETFramework4.6.1"),
            Some(Framework::parse("net461").unwrap())
        );
        assert_eq!(
            parse_target_framework(".NETCoreApp2.1"),
            Some(Framework::netcoreapp(2, 1))
        );
        assert!(parse_target_framework("portable-net45+win8").is_none());
    }
}
