//! In-box packages for netcoreapp2.1.
//!
//! Generated by `inbox generate`. Do not edit.

use inbox_core::FrameworkFamily;

use crate::registry::{RegistryBuilder, TableSpec};

pub(crate) const DEFAULT: &[(&str, &str)] = &[
    ("System.Collections.Immutable", "1.5.0"),
    ("System.ComponentModel.Annotations", "4.4.1"),
    ("System.Diagnostics.DiagnosticSource", "4.5.0"),
    ("System.Memory", "4.5.5"),
    ("System.Reflection.DispatchProxy", "4.5.0"),
    ("System.Reflection.Metadata", "1.6.0"),
    ("System.Threading.Tasks.Dataflow", "4.9.0"),
    ("System.Threading.Tasks.Extensions", "4.5.4"),
    ("System.ValueTuple", "4.5.0"),
];

pub(crate) fn register(builder: &mut RegistryBuilder) {
    builder.add(TableSpec {
        family: FrameworkFamily::Default,
        framework: "netcoreapp2.1",
        framework_name: "Microsoft.NETCore.App",
        parent: Some("netstandard2.0"),
        packages: DEFAULT,
    });
}
