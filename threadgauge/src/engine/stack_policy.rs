//! Stack-size strategy table
//!
//! Some platform/size pairs are known to destabilize thread creation. The
//! table maps `(platform, requested size)` to either the requested size or the
//! platform default; the probe records a note whenever the fallback is taken.
//! Kept free of any thread creation so it can be tested in isolation.

use crate::domain::{Platform, StackSizeKb};

/// A platform/size combination that must fall back to the default stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackQuirk {
    pub platform: Platform,
    pub requested_kb: u32,
}

/// Known quirks: an explicit 512 KB stack on Windows is unstable once a few
/// thousand threads are live.
pub const BUILTIN_QUIRKS: &[StackQuirk] =
    &[StackQuirk { platform: Platform::Windows, requested_kb: 512 }];

/// Resolved stack size for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackChoice {
    /// Use the requested size (may itself be the platform default)
    Requested(StackSizeKb),
    /// Requested size is a known quirk; use the platform default instead
    Fallback { requested: StackSizeKb },
}

impl StackChoice {
    /// Size actually handed to the thread builder
    #[must_use]
    pub fn effective(self) -> StackSizeKb {
        match self {
            Self::Requested(size) => size,
            Self::Fallback { .. } => StackSizeKb::PLATFORM_DEFAULT,
        }
    }

    #[must_use]
    pub fn overridden(self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

#[derive(Debug, Clone)]
pub struct StackSizePolicy {
    quirks: Vec<StackQuirk>,
}

impl StackSizePolicy {
    #[must_use]
    pub fn builtin() -> Self {
        Self::with_quirks(BUILTIN_QUIRKS.to_vec())
    }

    #[must_use]
    pub fn with_quirks(quirks: Vec<StackQuirk>) -> Self {
        Self { quirks }
    }

    #[must_use]
    pub fn resolve(&self, platform: Platform, requested: StackSizeKb) -> StackChoice {
        if requested.is_platform_default() {
            return StackChoice::Requested(requested);
        }
        let quirky = self
            .quirks
            .iter()
            .any(|q| q.platform == platform && q.requested_kb == requested.0);
        if quirky {
            StackChoice::Fallback { requested }
        } else {
            StackChoice::Requested(requested)
        }
    }
}

impl Default for StackSizePolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quirk_falls_back_to_default() {
        let policy = StackSizePolicy::builtin();
        let choice = policy.resolve(Platform::Windows, StackSizeKb(512));
        assert_eq!(choice, StackChoice::Fallback { requested: StackSizeKb(512) });
        assert_eq!(choice.effective(), StackSizeKb::PLATFORM_DEFAULT);
        assert!(choice.overridden());
    }

    #[test]
    fn test_same_size_elsewhere_is_kept() {
        let policy = StackSizePolicy::builtin();
        for platform in [Platform::Linux, Platform::MacOs, Platform::Other] {
            let choice = policy.resolve(platform, StackSizeKb(512));
            assert_eq!(choice.effective(), StackSizeKb(512));
            assert!(!choice.overridden());
        }
    }

    #[test]
    fn test_other_sizes_on_quirky_platform_are_kept() {
        let policy = StackSizePolicy::builtin();
        assert_eq!(policy.resolve(Platform::Windows, StackSizeKb(1024)).effective(), StackSizeKb(1024));
        assert!(!policy.resolve(Platform::Windows, StackSizeKb(0)).overridden());
    }

    #[test]
    fn test_custom_table() {
        let policy = StackSizePolicy::with_quirks(vec![StackQuirk {
            platform: Platform::Linux,
            requested_kb: 128,
        }]);
        assert!(policy.resolve(Platform::Linux, StackSizeKb(128)).overridden());
        assert!(!policy.resolve(Platform::Windows, StackSizeKb(512)).overridden());
    }
}
