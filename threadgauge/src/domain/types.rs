//! Core domain types using newtype pattern for type safety

use std::fmt;

/// Operating system family, used to key platform quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    /// Platform this binary was compiled for
    #[must_use]
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` identifier to a platform family
    #[must_use]
    pub fn from_os(os: &str) -> Self {
        match os {
            "linux" | "android" => Self::Linux,
            "macos" | "ios" => Self::MacOs,
            "windows" => Self::Windows,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// Per-thread stack size in KB, where 0 means "platform default"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackSizeKb(pub u32);

impl StackSizeKb {
    pub const PLATFORM_DEFAULT: Self = Self(0);

    #[must_use]
    pub fn is_platform_default(self) -> bool {
        self.0 == 0
    }

    /// Size to hand to `thread::Builder::stack_size`, `None` for the default
    #[must_use]
    pub fn bytes(self) -> Option<usize> {
        if self.is_platform_default() {
            None
        } else {
            Some(self.0 as usize * 1024)
        }
    }
}

impl fmt::Display for StackSizeKb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_platform_default() {
            write!(f, "default")
        } else {
            write!(f, "{} KB", self.0)
        }
    }
}

/// Which engine component a run belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Probe,
    Stress,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probe => write!(f, "max threads probe"),
            Self::Stress => write!(f, "stress test"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_from_os() {
        assert_eq!(Platform::from_os("linux"), Platform::Linux);
        assert_eq!(Platform::from_os("macos"), Platform::MacOs);
        assert_eq!(Platform::from_os("windows"), Platform::Windows);
        assert_eq!(Platform::from_os("freebsd"), Platform::Other);
    }

    #[test]
    fn test_stack_size_bytes() {
        assert_eq!(StackSizeKb(0).bytes(), None);
        assert_eq!(StackSizeKb(256).bytes(), Some(256 * 1024));
        assert_eq!(StackSizeKb::PLATFORM_DEFAULT.to_string(), "default");
        assert_eq!(StackSizeKb(512).to_string(), "512 KB");
    }
}
