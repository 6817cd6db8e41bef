use std::cmp;

use serde::{Deserialize, Serialize};

use crate::config::UNLOCK_DURATION_MS;

/// Whether blocking is currently suppressed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum UnlockState {
    Locked,
    #[serde(rename_all = "camelCase")]
    Unlocked { until_ms: i64 },
}

impl Default for UnlockState {
    fn default() -> Self {
        UnlockState::Locked
    }
}

impl UnlockState {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, UnlockState::Unlocked { .. })
    }
}

/// The persisted "blocking disabled until" deadline.
///
/// Expiry is never stored: a deadline in the past reads as locked.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnlockWindow {
    pub disabled_until_ms: i64,
}

impl UnlockWindow {
    pub const NONE: UnlockWindow = UnlockWindow {
        disabled_until_ms: 0,
    };

    pub fn new(disabled_until_ms: i64) -> Self {
        Self { disabled_until_ms }
    }

    /// A fresh window opened at `now_ms`; replaces any previous deadline.
    pub fn opened_at(now_ms: i64) -> Self {
        Self::new(now_ms.saturating_add(UNLOCK_DURATION_MS))
    }

    pub fn is_unlocked(&self, now_ms: i64) -> bool {
        now_ms < self.disabled_until_ms
    }

    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        cmp::max(self.disabled_until_ms.saturating_sub(now_ms), 0)
    }

    pub fn state(&self, now_ms: i64) -> UnlockState {
        if self.is_unlocked(now_ms) {
            UnlockState::Unlocked {
                until_ms: self.disabled_until_ms,
            }
        } else {
            UnlockState::Locked
        }
    }
}
