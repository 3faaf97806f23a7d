//! Rust source emission for reduced tables.
//!
//! One module per framework that has a table in any family. Each module
//! holds a constant table per family present at that framework and a
//! `register` function that hands them to the runtime registry builder. A
//! `mod.rs` declares the modules and registers them all.
//!
//! Every table's parent is the nearest compatible framework among the
//! tables of its own family, so an overlay inherits from the nearest
//! overlay table even when the default family's nearest framework differs.
//! A table with no compatible ancestor in its family has no parent.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use inbox_core::{nearest, Framework, FrameworkFamily, PackageTable};
use tracing::info;

use crate::error::{GenError, Result};
use crate::pipeline::FamilyTables;

const HEADER: &str = "//! Generated by `inbox generate`. Do not edit.";

/// A generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedModule {
    pub file_name: String,
    pub source: String,
}

/// Module name for a framework (`net6.0-windows` becomes `net6_0_windows`).
pub fn module_name(framework: &Framework) -> String {
    framework
        .short_folder_name()
        .chars()
        .map(|c| if c == '.' || c == '-' { '_' } else { c })
        .collect()
}

fn family_path(family: FrameworkFamily) -> &'static str {
    match family {
        FrameworkFamily::Default => "FrameworkFamily::Default",
        FrameworkFamily::AspNetCore => "FrameworkFamily::AspNetCore",
        FrameworkFamily::WindowsDesktop => "FrameworkFamily::WindowsDesktop",
    }
}

/// A family's table at one framework and the framework it inherits from.
struct FamilyTable<'a> {
    family: FrameworkFamily,
    table: &'a PackageTable,
    parent: Option<&'a Framework>,
}

/// Render every module plus `mod.rs`. Returns nothing when there are no
/// tables.
pub fn emit_modules(tables: &FamilyTables) -> Vec<EmittedModule> {
    let frameworks: BTreeSet<&Framework> = tables.values().flat_map(|t| t.keys()).collect();
    if frameworks.is_empty() {
        return Vec::new();
    }

    let mut modules: Vec<EmittedModule> = Vec::new();
    for &framework in &frameworks {
        let families: Vec<FamilyTable<'_>> = FrameworkFamily::ALL
            .into_iter()
            .filter_map(|family| {
                let family_tables = tables.get(&family)?;
                let table = family_tables.get(framework)?;
                let parent = nearest(framework, family_tables.keys().filter(|f| *f != framework));
                Some(FamilyTable {
                    family,
                    table,
                    parent,
                })
            })
            .collect();

        modules.push(EmittedModule {
            file_name: format!("{}.rs", module_name(framework)),
            source: render_module(framework, &families),
        });
    }

    let names: Vec<String> = frameworks.iter().map(|f| module_name(f)).collect();
    modules.push(EmittedModule {
        file_name: "mod.rs".to_string(),
        source: render_mod(&names),
    });
    modules
}

fn render_module(framework: &Framework, families: &[FamilyTable<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "//! In-box packages for {}.", framework.short_folder_name());
    out.push_str("//!\n");
    out.push_str(HEADER);
    out.push_str("\n\nuse inbox_core::FrameworkFamily;\n\n");
    out.push_str("use crate::registry::{RegistryBuilder, TableSpec};\n");

    for entry in families {
        out.push('\n');
        let _ = writeln!(out, "pub(crate) const {}: &[(&str, &str)] = &[", entry.family.const_name());
        for (id, version) in entry.table.iter() {
            let _ = writeln!(out, "    ({:?}, {:?}),", id, version.to_string());
        }
        out.push_str("];\n");
    }

    out.push_str("\npub(crate) fn register(builder: &mut RegistryBuilder) {\n");
    for entry in families {
        let parent_expr = match entry.parent {
            Some(p) => format!("Some({:?})", p.short_folder_name()),
            None => "None".to_string(),
        };
        let _ = writeln!(out, "    builder.add(TableSpec {{");
        let _ = writeln!(out, "        family: {},", family_path(entry.family));
        let _ = writeln!(out, "        framework: {:?},", framework.short_folder_name());
        let _ = writeln!(
            out,
            "        framework_name: {:?},",
            entry.family.framework_name(framework)
        );
        let _ = writeln!(out, "        parent: {parent_expr},");
        let _ = writeln!(out, "        packages: {},", entry.family.const_name());
        out.push_str("    });\n");
    }
    out.push_str("}\n");
    out
}

fn render_mod(names: &[String]) -> String {
    let mut out = String::new();
    out.push_str("//! Bundled in-box package tables.\n//!\n");
    out.push_str(HEADER);
    out.push_str("\n\nuse crate::registry::RegistryBuilder;\n\n");
    for name in names {
        let _ = writeln!(out, "mod {name};");
    }
    out.push_str("\npub(crate) fn register_all(builder: &mut RegistryBuilder) {\n");
    for name in names {
        let _ = writeln!(out, "    {name}::register(builder);");
    }
    out.push_str("}\n");
    out
}

/// Write the emitted modules into `dir`, creating it if needed. Returns the
/// written paths.
pub fn write_modules(dir: &Path, modules: &[EmittedModule]) -> Result<Vec<PathBuf>> {
    let emit_error = |path: &Path, e: std::io::Error| GenError::Emit {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };
    fs::create_dir_all(dir).map_err(|e| emit_error(dir, e))?;

    let mut written = Vec::with_capacity(modules.len());
    for module in modules {
        let path = dir.join(&module.file_name);
        fs::write(&path, &module.source).map_err(|e| emit_error(&path, e))?;
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "wrote table modules");
    Ok(written)
}
