//! `inbox generate`: build the tables and write the Rust modules.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use inbox_gen::{emit_modules, generate, write_modules, GenerationOutput, PackageSource, RegistrySource};
use inbox_registry::{HttpRegistry, LocalRegistry, PackageCache};
use tracing::info;

use crate::config::InboxConfig;

const DEFAULT_OUTPUT_DIR: &str = "generated";

/// Command-line settings that take precedence over `inbox.toml`.
#[derive(Debug, Default)]
pub struct GenerateArgs {
    pub output: Option<PathBuf>,
    pub mirror: Option<PathBuf>,
    pub no_assemblies: bool,
}

pub fn run(config: &InboxConfig, config_dir: &Path, args: &GenerateArgs) -> Result<()> {
    let mut options = config.generate_options();
    if args.no_assemblies {
        options.evaluate_assemblies = false;
    }

    let output_dir = args
        .output
        .clone()
        .or_else(|| config.generate.output_dir.as_ref().map(|p| config_dir.join(p)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
    let mirror = args
        .mirror
        .clone()
        .or_else(|| config.registry.mirror.as_ref().map(|p| config_dir.join(p)));

    let output = match mirror {
        Some(dir) => {
            info!(mirror = %dir.display(), "reading packages from mirror");
            let source = RegistrySource::new(LocalRegistry::new(dir));
            build(&source, &options)?
        }
        None => {
            let cache = match &config.registry.cache_dir {
                Some(dir) => PackageCache::session_in(&config_dir.join(dir)),
                None => PackageCache::session(),
            }
            .context("creating package cache")?;
            let registry = HttpRegistry::new(config.http_config())
                .context("creating registry client")?
                .with_cache(cache);
            let source = RegistrySource::new(registry);
            build(&source, &options)?
        }
    };

    let modules = emit_modules(&output.tables);
    let written = write_modules(&output_dir, &modules)
        .with_context(|| format!("writing modules to {}", output_dir.display()))?;

    println!("{}", output.report);
    println!("Wrote {} files to {}", written.len(), output_dir.display());
    Ok(())
}

fn build<S: PackageSource>(source: &S, options: &inbox_gen::GenerateOptions) -> Result<GenerationOutput> {
    generate(source, options).context("generating in-box package tables")
}
