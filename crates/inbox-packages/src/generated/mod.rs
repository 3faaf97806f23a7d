//! Bundled in-box package tables.
//!
//! Generated by `inbox generate`. Do not edit.

use crate::registry::RegistryBuilder;

mod netstandard2_0;
mod netcoreapp2_1;

pub(crate) fn register_all(builder: &mut RegistryBuilder) {
    netstandard2_0::register(builder);
    netcoreapp2_1::register(builder);
}
