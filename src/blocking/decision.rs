use std::collections::HashSet;

use serde::Serialize;

use crate::{models::BlockConfig, unlock::UnlockState};

pub const SYSTEM_UI_PACKAGE: &str = "com.android.systemui";
pub const SETTINGS_PACKAGE: &str = "com.android.settings";

/// Packages that never trigger the block screen: ourselves, the system
/// chrome, settings, and whatever launcher and dialer the device defaults to.
#[derive(Debug, Clone)]
pub struct IgnoredPackages {
    packages: HashSet<String>,
}

impl IgnoredPackages {
    pub fn new(own_package: &str) -> Self {
        let packages = [own_package, SYSTEM_UI_PACKAGE, SETTINGS_PACKAGE]
            .into_iter()
            .map(String::from)
            .collect();
        Self { packages }
    }

    /// Add a platform-resolved package; unresolved (`None`) entries are skipped.
    pub fn with_resolved(mut self, package: Option<String>) -> Self {
        if let Some(package) = package.filter(|p| !p.is_empty()) {
            self.packages.insert(package);
        }
        self
    }

    pub fn contains(&self, package_name: &str) -> bool {
        self.packages.contains(package_name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    BlockingDisabled,
    Ignored,
    Unlocked,
    NotBlocked,
    Debounced,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BlockDecision {
    Block,
    Skip(SkipReason),
}

impl BlockDecision {
    pub fn should_block(&self) -> bool {
        matches!(self, BlockDecision::Block)
    }
}

pub struct DecisionInput<'a> {
    pub package_name: &'a str,
    pub config: &'a BlockConfig,
    pub unlock_state: UnlockState,
    pub ignored: &'a IgnoredPackages,
    pub now_ms: i64,
    /// When the observer last showed the block screen, for any package.
    pub last_block_ms: Option<i64>,
    pub debounce_ms: i64,
}

/// Block iff enabled, not ignored, locked, listed, and outside the de-bounce
/// window. The first failing condition is reported.
pub fn decide(input: &DecisionInput<'_>) -> BlockDecision {
    if !input.config.blocking_enabled {
        return BlockDecision::Skip(SkipReason::BlockingDisabled);
    }
    if input.ignored.contains(input.package_name) {
        return BlockDecision::Skip(SkipReason::Ignored);
    }
    if input.unlock_state.is_unlocked() {
        return BlockDecision::Skip(SkipReason::Unlocked);
    }
    if !input.config.is_blocked(input.package_name) {
        return BlockDecision::Skip(SkipReason::NotBlocked);
    }
    if let Some(last) = input.last_block_ms {
        if input.now_ms - last < input.debounce_ms {
            return BlockDecision::Skip(SkipReason::Debounced);
        }
    }
    BlockDecision::Block
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn config(enabled: bool, blocked: &[&str]) -> BlockConfig {
        BlockConfig {
            blocked_apps: blocked.iter().map(|p| p.to_string()).collect(),
            blocking_enabled: enabled,
        }
    }

    fn run(
        package: &str,
        config: &BlockConfig,
        unlock_state: UnlockState,
        last_block_ms: Option<i64>,
    ) -> BlockDecision {
        let ignored = IgnoredPackages::new("dev.nutting.focaccia")
            .with_resolved(Some("com.android.launcher3".into()));
        decide(&DecisionInput {
            package_name: package,
            config,
            unlock_state,
            ignored: &ignored,
            now_ms: NOW,
            last_block_ms,
            debounce_ms: 1000,
        })
    }

    #[test]
    fn blocks_listed_app_while_locked() {
        let config = config(true, &["x"]);
        assert_eq!(run("x", &config, UnlockState::Locked, None), BlockDecision::Block);
    }

    #[test]
    fn unlocked_suppresses_block() {
        let config = config(true, &["x"]);
        let unlocked = UnlockState::Unlocked {
            until_ms: NOW + 10,
        };
        assert_eq!(
            run("x", &config, unlocked, None),
            BlockDecision::Skip(SkipReason::Unlocked)
        );
    }

    #[test]
    fn disabled_wins_over_everything() {
        let config = config(false, &["x", "dev.nutting.focaccia"]);
        for state in [
            UnlockState::Locked,
            UnlockState::Unlocked { until_ms: NOW + 1 },
        ] {
            for last in [None, Some(NOW), Some(NOW - 5_000)] {
                for package in ["x", "y", "dev.nutting.focaccia"] {
                    assert_eq!(
                        run(package, &config, state, last),
                        BlockDecision::Skip(SkipReason::BlockingDisabled)
                    );
                }
            }
        }
    }

    #[test]
    fn ignored_packages_never_block() {
        let config = config(
            true,
            &[
                "dev.nutting.focaccia",
                SYSTEM_UI_PACKAGE,
                SETTINGS_PACKAGE,
                "com.android.launcher3",
            ],
        );
        for package in &config.blocked_apps {
            assert_eq!(
                run(package, &config, UnlockState::Locked, None),
                BlockDecision::Skip(SkipReason::Ignored)
            );
        }
    }

    #[test]
    fn unlisted_app_passes() {
        let config = config(true, &["x"]);
        assert_eq!(
            run("y", &config, UnlockState::Locked, None),
            BlockDecision::Skip(SkipReason::NotBlocked)
        );
    }

    #[test]
    fn debounce_is_one_second() {
        let config = config(true, &["x"]);
        assert_eq!(
            run("x", &config, UnlockState::Locked, Some(NOW - 999)),
            BlockDecision::Skip(SkipReason::Debounced)
        );
        assert_eq!(
            run("x", &config, UnlockState::Locked, Some(NOW - 1000)),
            BlockDecision::Block
        );
    }

    #[test]
    fn unresolved_platform_packages_are_skipped() {
        let ignored = IgnoredPackages::new("me")
            .with_resolved(None)
            .with_resolved(Some(String::new()));
        assert!(ignored.contains("me"));
        assert!(!ignored.contains(""));
    }
}
