use anyhow::Result;
use log::info;

use crate::unlock::UnlockController;

pub const TAG_HINT: &str = "Scan your NFC tag to unblock";

/// What the host should do with the block screen after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenOutcome {
    Stay,
    /// Unblocked; dismiss the screen and let the app through.
    Close,
    /// Dismiss the screen and return to the launcher.
    GoHome,
}

/// Uppercase hex, two digits per byte, no separators.
pub fn format_tag_id(raw_id: &[u8]) -> String {
    raw_id.iter().map(|byte| format!("{byte:02X}")).collect()
}

/// State behind the block screen.
pub struct BlockedScreen {
    unlock: UnlockController,
    debug: bool,
    has_tag: bool,
}

impl BlockedScreen {
    /// Whether a tag is registered is captured once, when the screen opens.
    pub fn open(unlock: UnlockController, debug: bool) -> Self {
        let has_tag = unlock.registered_tag_id().is_some();
        Self {
            unlock,
            debug,
            has_tag,
        }
    }

    pub fn tag_hint(&self) -> Option<&'static str> {
        self.has_tag.then_some(TAG_HINT)
    }

    pub fn debug_unlock_available(&self) -> bool {
        self.debug
    }

    pub async fn on_tag_scanned(&self, raw_id: &[u8]) -> Result<ScreenOutcome> {
        let tag_id = format_tag_id(raw_id);
        match self.unlock.try_unlock_with_tag(&tag_id).await? {
            Some(_) => Ok(ScreenOutcome::Close),
            None => Ok(ScreenOutcome::Stay),
        }
    }

    /// Unlock without a tag; only honoured in debug mode.
    pub async fn debug_unlock(&self) -> Result<ScreenOutcome> {
        if !self.debug {
            return Ok(ScreenOutcome::Stay);
        }
        info!("Debug unlock from block screen");
        self.unlock.unlock().await?;
        Ok(ScreenOutcome::Close)
    }

    pub fn go_back(&self) -> ScreenOutcome {
        ScreenOutcome::GoHome
    }
}
