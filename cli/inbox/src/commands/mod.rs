//! CLI command implementations.

pub mod check;
pub mod generate;
pub mod show;

use anyhow::{Context, Result};
use inbox_core::{Framework, FrameworkFamily};

pub(crate) fn parse_framework(value: &str) -> Result<Framework> {
    Framework::parse(value).with_context(|| format!("parsing framework '{value}'"))
}

pub(crate) fn parse_family(value: Option<&str>) -> Result<FrameworkFamily> {
    match value {
        Some(value) => value
            .parse::<FrameworkFamily>()
            .with_context(|| format!("parsing family '{value}'")),
        None => Ok(FrameworkFamily::Default),
    }
}
