//! Framework in-box package lookup.
//!
//! Answers "does this framework already ship package X at version V?" from
//! the tables produced by `inbox-gen`. The bundled tables live in the
//! `generated` module and are loaded into [`FrameworkPackageRegistry::builtin`]
//! on first use.
//!
//! ```
//! use inbox_core::{Framework, FrameworkFamily};
//! use inbox_packages::FrameworkPackageRegistry;
//! use semver::Version;
//!
//! let registry = FrameworkPackageRegistry::builtin().unwrap();
//! assert!(registry.is_in_box(
//!     FrameworkFamily::Default,
//!     &Framework::netcoreapp(2, 1),
//!     "System.Memory",
//!     &Version::new(4, 5, 5),
//! ));
//! ```

pub mod error;
mod generated;
pub mod registry;

pub use error::{PackagesError, Result};
pub use registry::{FrameworkPackageRegistry, FrameworkPackages, RegistryBuilder, TableSpec};
