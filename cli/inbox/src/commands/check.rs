//! `inbox check`: query the bundled registry for one package version.

use anyhow::{Context, Result};
use inbox_core::{Framework, FrameworkFamily, NuGetVersion};
use inbox_packages::FrameworkPackageRegistry;

use super::{parse_family, parse_framework};

/// Answer for one query.
#[derive(Debug, PartialEq, Eq)]
pub struct CheckOutcome {
    pub in_box: bool,
    /// Framework of the table the lookup started from.
    pub table: Option<Framework>,
    /// The in-box version, when the framework ships the package at all.
    pub min_version: Option<String>,
}

pub fn run(framework: &str, package: &str, version: &str, family: Option<&str>) -> Result<()> {
    let framework = parse_framework(framework)?;
    let family = parse_family(family)?;
    let version = NuGetVersion::parse(version).with_context(|| format!("parsing version '{version}'"))?;
    let registry = FrameworkPackageRegistry::builtin().context("loading bundled tables")?;

    let outcome = check(registry, family, &framework, package, &version);
    let verdict = if outcome.in_box { "is in-box" } else { "is not in-box" };
    println!("{package} {version} {verdict} for {framework} ({family})");
    match (&outcome.table, &outcome.min_version) {
        (Some(table), Some(min)) => println!("  in-box version: {min} (from the {table} table)"),
        (Some(table), None) => println!("  not listed in the {table} table or its parents"),
        (None, _) => println!("  no {family} table is compatible with {framework}"),
    }
    Ok(())
}

pub fn check(
    registry: &FrameworkPackageRegistry,
    family: FrameworkFamily,
    framework: &Framework,
    package: &str,
    version: &NuGetVersion,
) -> CheckOutcome {
    let Some(table) = registry.packages_for(family, framework) else {
        return CheckOutcome {
            in_box: false,
            table: None,
            min_version: None,
        };
    };
    CheckOutcome {
        in_box: table.is_in_box(package, &version.to_semver()),
        table: Some(table.framework().clone()),
        min_version: table.min_version(package).map(ToString::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(framework: &str, package: &str, version: &str) -> CheckOutcome {
        let registry = FrameworkPackageRegistry::builtin().unwrap();
        check(
            registry,
            FrameworkFamily::Default,
            &Framework::parse(framework).unwrap(),
            package,
            &NuGetVersion::parse(version).unwrap(),
        )
    }

    #[test]
    fn inherited_and_own_entries() {
        let memory = query("netcoreapp2.1", "System.Memory", "4.5.5");
        assert!(memory.in_box);
        assert_eq!(memory.min_version.as_deref(), Some("4.5.5"));

        let runtime = query("netcoreapp2.1", "System.Runtime", "4.3.1");
        assert!(runtime.in_box);
        assert!(!query("netcoreapp2.1", "System.Runtime", "4.3.2").in_box);
    }

    #[test]
    fn prerelease_below_the_in_box_version_is_in_box() {
        assert!(query("netcoreapp2.1", "System.Memory", "4.5.5-preview1").in_box);
    }

    #[test]
    fn nearest_table_answers_for_newer_frameworks() {
        let outcome = query("net8.0", "System.Memory", "4.5.0");
        assert!(outcome.in_box);
        assert_eq!(outcome.table, Some(Framework::netcoreapp(2, 1)));
    }

    #[test]
    fn missing_family_has_no_table() {
        let registry = FrameworkPackageRegistry::builtin().unwrap();
        let outcome = check(
            registry,
            FrameworkFamily::WindowsDesktop,
            &Framework::netcoreapp(2, 1),
            "System.Memory",
            &NuGetVersion::parse("1.0.0").unwrap(),
        );
        assert_eq!(
            outcome,
            CheckOutcome {
                in_box: false,
                table: None,
                min_version: None
            }
        );
    }
}
