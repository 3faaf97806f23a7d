//! Framework families: the default runtime family and named overlays.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::framework::{Framework, FrameworkId};

/// A grouping key under which per-framework package tables are indexed.
///
/// The default family covers the base runtime (`Microsoft.NETCore.App`) and
/// .NET Standard (`NETStandard.Library`). Overlay families hold the
/// additional packages a shared framework reference brings in on top of the
/// default family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkFamily {
    Default,
    /// Web hosting (`Microsoft.AspNetCore.App`).
    #[serde(alias = "web-hosting")]
    AspNetCore,
    /// Desktop hosting (`Microsoft.WindowsDesktop.App`).
    #[serde(alias = "desktop-hosting")]
    WindowsDesktop,
}

impl FrameworkFamily {
    /// All families, default first.
    pub const ALL: [FrameworkFamily; 3] = [
        FrameworkFamily::Default,
        FrameworkFamily::AspNetCore,
        FrameworkFamily::WindowsDesktop,
    ];

    /// Stable lowercase key.
    pub fn key(&self) -> &'static str {
        match self {
            FrameworkFamily::Default => "default",
            FrameworkFamily::AspNetCore => "aspnetcore",
            FrameworkFamily::WindowsDesktop => "windowsdesktop",
        }
    }

    /// Family owning a shared framework or SDK package name.
    pub fn for_framework_name(name: &str) -> Option<Self> {
        match name {
            "Microsoft.NETCore.App" | "NETStandard.Library" => Some(FrameworkFamily::Default),
            "Microsoft.AspNetCore.App" => Some(FrameworkFamily::AspNetCore),
            "Microsoft.WindowsDesktop.App" => Some(FrameworkFamily::WindowsDesktop),
            _ => None,
        }
    }

    /// The shared framework name that provides this family's packages for
    /// `framework`.
    pub fn framework_name(&self, framework: &Framework) -> &'static str {
        match self {
            FrameworkFamily::Default => match framework.id() {
                FrameworkId::NetStandard => "NETStandard.Library",
                _ => "Microsoft.NETCore.App",
            },
            FrameworkFamily::AspNetCore => "Microsoft.AspNetCore.App",
            FrameworkFamily::WindowsDesktop => "Microsoft.WindowsDesktop.App",
        }
    }

    /// Identifier used for emitted table constants.
    pub fn const_name(&self) -> &'static str {
        match self {
            FrameworkFamily::Default => "DEFAULT",
            FrameworkFamily::AspNetCore => "ASPNETCORE",
            FrameworkFamily::WindowsDesktop => "WINDOWSDESKTOP",
        }
    }

    pub fn is_overlay(&self) -> bool {
        *self != FrameworkFamily::Default
    }
}

impl fmt::Display for FrameworkFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FrameworkFamily {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "" => Ok(FrameworkFamily::Default),
            "aspnetcore" | "web-hosting" | "microsoft.aspnetcore.app" => {
                Ok(FrameworkFamily::AspNetCore)
            }
            "windowsdesktop" | "desktop-hosting" | "microsoft.windowsdesktop.app" => {
                Ok(FrameworkFamily::WindowsDesktop)
            }
            _ => Err(CoreError::UnknownFamily {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_for_framework_names() {
        assert_eq!(
            FrameworkFamily::for_framework_name("NETStandard.Library"),
            Some(FrameworkFamily::Default)
        );
        assert_eq!(
            FrameworkFamily::for_framework_name("Microsoft.AspNetCore.App"),
            Some(FrameworkFamily::AspNetCore)
        );
        assert_eq!(FrameworkFamily::for_framework_name("Other.App"), None);
    }

    #[test]
    fn default_family_name_depends_on_framework() {
        let family = FrameworkFamily::Default;
        assert_eq!(
            family.framework_name(&Framework::netstandard(2, 0)),
            "NETStandard.Library"
        );
        assert_eq!(
            family.framework_name(&Framework::netcoreapp(6, 0)),
            "Microsoft.NETCore.App"
        );
    }

    #[test]
    fn parse_family_keys_and_aliases() {
        assert_eq!("web-hosting".parse::<FrameworkFamily>().unwrap(), FrameworkFamily::AspNetCore);
        assert_eq!(
            "WindowsDesktop".parse::<FrameworkFamily>().unwrap(),
            FrameworkFamily::WindowsDesktop
        );
        assert!("mobile".parse::<FrameworkFamily>().is_err());
    }
}
