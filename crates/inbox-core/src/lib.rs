//! Core data model for framework in-box package analysis.
//!
//! A target framework (for example `net6.0` or `netstandard2.0`) ships a set
//! of NuGet packages "in box": referencing such a package at or below the
//! in-box version adds nothing to the application. This crate holds the
//! shared vocabulary used by the table generator and the runtime registry:
//!
//! - [`Framework`]: a parsed target framework plus the compatibility
//!   relation and the [`nearest`] reduction over candidate frameworks.
//! - [`FrameworkFamily`]: the default runtime family and the named overlay
//!   families (ASP.NET Core, Windows Desktop).
//! - [`NuGetVersion`], [`AssemblyVersion`], [`VersionPair`]: package and
//!   binary versions with their total orders.
//! - [`PackageTable`]: a case-insensitive map from package id to minimum
//!   in-box version that only ever grows upward.

pub mod error;
pub mod family;
pub mod framework;
pub mod table;
pub mod version;

pub use error::{CoreError, Result};
pub use family::FrameworkFamily;
pub use framework::{nearest, Framework, FrameworkId};
pub use table::{MergeOutcome, PackageId, PackageTable};
pub use version::{parse_range_min, AssemblyVersion, NuGetVersion, VersionPair};
