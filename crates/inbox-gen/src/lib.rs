//! In-box package table generator.
//!
//! Builds, for every tracked shared framework, the table of NuGet packages
//! the framework already supplies, then reduces those tables so each
//! framework stores only what its compatible ancestors do not.
//!
//! Stages, in order:
//!
//! 1. [`evaluate`] compares each reference assembly against the published
//!    versions of the package of the same name.
//! 2. [`runtime_graph`] folds in native runtime dependencies.
//! 3. [`overrides`] applies the reference pack's curated overrides.
//! 4. [`reduce`] strips entries inherited from compatible frameworks.
//! 5. [`emit`] renders the reduced tables as Rust modules for
//!    `inbox-packages`.
//!
//! [`pipeline::generate`] drives stages 1 to 4 over a [`PackageSource`].

pub mod config;
pub mod emit;
pub mod error;
pub mod evaluate;
pub mod overrides;
pub mod pipeline;
pub mod reduce;
pub mod runtime_graph;
pub mod source;

#[cfg(test)]
mod testing;

pub use config::{default_frameworks, GenerateOptions, ImportKind, RuntimeImport, TrackedFramework};
pub use emit::{emit_modules, write_modules, EmittedModule};
pub use error::{GenError, Result};
pub use evaluate::{evaluate_package, Evaluation};
pub use overrides::{apply_overrides, OverrideOutcome, OverrideReport};
pub use pipeline::{generate, FamilyTables, GenerationOutput, GenerationReport};
pub use reduce::{reduce, ReductionReport};
pub use runtime_graph::{apply_package_dependencies, apply_runtime_graph};
pub use source::{PackageSource, RegistrySource};
