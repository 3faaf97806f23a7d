//! `inbox show`: print a framework's effective table.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use inbox_core::Framework;
use inbox_packages::{FrameworkPackageRegistry, FrameworkPackages};

use super::{parse_family, parse_framework};

pub fn run(framework: &str, family: Option<&str>) -> Result<()> {
    let framework = parse_framework(framework)?;
    let family = parse_family(family)?;
    let registry = FrameworkPackageRegistry::builtin().context("loading bundled tables")?;

    let Some(table) = registry.packages_for(family, &framework) else {
        anyhow::bail!("no {family} table is compatible with {framework}");
    };
    if table.framework() != &framework {
        println!("{framework} has no table of its own; using {}", table.framework());
    }
    print!("{}", render(table));
    Ok(())
}

/// Own entries first, then each ancestor's entries that are not shadowed.
pub fn render(table: &FrameworkPackages) -> String {
    let effective = table.effective_packages();
    let width = effective.iter().map(|(id, _, _)| id.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (depth, ancestor) in table.lineage().enumerate() {
        let entries: Vec<_> = effective
            .iter()
            .filter(|(_, _, from)| *from == ancestor.framework())
            .collect();
        let label = describe(ancestor.framework(), ancestor.framework_name());
        if depth == 0 {
            let _ = writeln!(out, "{label} [{}]", ancestor.family());
        } else {
            let _ = writeln!(out, "inherited from {label}");
        }
        for (id, version, _) in &entries {
            let _ = writeln!(out, "  {id:<width$}  {version}");
        }
        if entries.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
    }
    let _ = writeln!(out, "{} packages", effective.len());
    out
}

fn describe(framework: &Framework, name: &str) -> String {
    format!("{framework} ({name})")
}
