use std::sync::Arc;

use crate::{
    models::{EventKind, ForegroundEvent},
    store::BlockedAppsRepository,
    unlock::UnlockController,
};

use super::decision::{decide, BlockDecision, DecisionInput, IgnoredPackages};

// Fires on every window change; keep quiet unless debugging.
const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_info};

/// Brings the block screen to the front.
pub trait BlockScreenLauncher: Send + Sync {
    fn show_block_screen(&self, package_name: &str);
}

/// Turns foreground-app events into block screens.
///
/// Events are judged one at a time against fresh settings; nothing is
/// queued. `last_block_ms` is the only state kept between events.
pub struct ForegroundObserver {
    repo: BlockedAppsRepository,
    unlock: UnlockController,
    ignored: IgnoredPackages,
    launcher: Arc<dyn BlockScreenLauncher>,
    debounce_ms: i64,
    last_block_ms: Option<i64>,
}

impl ForegroundObserver {
    pub fn new(
        repo: BlockedAppsRepository,
        unlock: UnlockController,
        ignored: IgnoredPackages,
        launcher: Arc<dyn BlockScreenLauncher>,
        debounce_ms: i64,
    ) -> Self {
        Self {
            repo,
            unlock,
            ignored,
            launcher,
            debounce_ms,
            last_block_ms: None,
        }
    }

    /// Returns `None` for events that are not foreground changes.
    pub fn on_event(&mut self, event: &ForegroundEvent) -> Option<BlockDecision> {
        if event.kind != EventKind::WindowStateChanged {
            return None;
        }
        let package_name = event.package_name.as_deref()?;

        let config = self.repo.block_config();
        let decision = decide(&DecisionInput {
            package_name,
            config: &config,
            unlock_state: self.unlock.window().state(event.timestamp_ms),
            ignored: &self.ignored,
            now_ms: event.timestamp_ms,
            last_block_ms: self.last_block_ms,
            debounce_ms: self.debounce_ms,
        });

        match decision {
            BlockDecision::Block => {
                self.last_block_ms = Some(event.timestamp_ms);
                log_info!("Blocking {package_name}");
                self.launcher.show_block_screen(package_name);
            }
            BlockDecision::Skip(reason) => {
                log_debug!("Not blocking {package_name}: {reason:?}");
            }
        }

        Some(decision)
    }

    pub fn last_block_ms(&self) -> Option<i64> {
        self.last_block_ms
    }
}
