//! Target triples.

use std::fmt;

/// A parsed `arch-vendor-os[-environment]` target triple.
///
/// Parsing is lenient: missing components are empty strings. The original
/// spelling is preserved for `-target` arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Triple {
    raw: String,
    arch: String,
    vendor: String,
    os: String,
    environment: String,
}

impl Triple {
    /// Parses a triple string.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.splitn(4, '-');
        let mut next = || parts.next().unwrap_or_default().to_string();
        let arch = next();
        let vendor = next();
        let os = next();
        let environment = next();
        Self {
            raw: raw.to_string(),
            arch,
            vendor,
            os,
            environment,
        }
    }

    /// The triple as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The architecture component (`x86_64`, `arm64`, ...).
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// The vendor component.
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// The OS component, including any version suffix.
    pub fn os(&self) -> &str {
        &self.os
    }

    /// The environment component (`gnu`, `simulator`, ...).
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The OS name with any trailing version stripped.
    pub fn os_name(&self) -> &str {
        let end = self
            .os
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(self.os.len());
        &self.os[..end]
    }

    /// The version trailing the OS name, if any (`13.0` in `macosx13.0`).
    pub fn os_version(&self) -> Option<&str> {
        let name_len = self.os_name().len();
        let version = &self.os[name_len..];
        (!version.is_empty()).then_some(version)
    }

    /// Returns `true` for any Apple OS.
    pub fn is_os_darwin(&self) -> bool {
        matches!(
            self.os_name(),
            "darwin" | "macos" | "macosx" | "ios" | "tvos" | "watchos"
        )
    }

    /// Returns `true` for macOS.
    pub fn is_macos(&self) -> bool {
        matches!(self.os_name(), "darwin" | "macos" | "macosx")
    }

    /// Returns `true` for Windows targets.
    pub fn is_os_windows(&self) -> bool {
        self.os_name() == "windows"
    }

    /// Returns `true` for simulator environments.
    pub fn is_simulator(&self) -> bool {
        self.environment == "simulator"
    }

    /// Suffix used in Apple runtime library names (`osx`, `iossim`, ...).
    pub fn darwin_library_suffix(&self) -> &'static str {
        match (self.os_name(), self.is_simulator()) {
            ("ios", false) => "ios",
            ("ios", true) => "iossim",
            ("tvos", false) => "tvos",
            ("tvos", true) => "tvossim",
            ("watchos", false) => "watchos",
            ("watchos", true) => "watchossim",
            _ => "osx",
        }
    }

    /// Name of the per-platform directory under the runtime resource
    /// directory (`macosx`, `iphonesimulator`, `linux`, ...).
    pub fn platform_dir_name(&self) -> &str {
        match (self.os_name(), self.is_simulator()) {
            ("darwin" | "macos" | "macosx", _) => "macosx",
            ("ios", false) => "iphoneos",
            ("ios", true) => "iphonesimulator",
            ("tvos", false) => "appletvos",
            ("tvos", true) => "appletvsimulator",
            ("watchos", false) => "watchos",
            ("watchos", true) => "watchsimulator",
            (name, _) => name,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
