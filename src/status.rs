//! The persistent "apps unblocked" indicator shown while a window is open.

use std::sync::{Mutex, PoisonError};

use log::info;
use serde::Serialize;

pub const NOTIFICATION_TITLE: &str = "Apps unblocked";
pub const RELOCK_ACTION_LABEL: &str = "Reblock";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotification {
    pub title: String,
    /// e.g. `"29:59 remaining"`.
    pub text: String,
    /// Label of the action that calls `UnlockController::relock`.
    pub relock_action: String,
    pub remaining_ms: i64,
}

impl StatusNotification {
    pub fn for_remaining(remaining_ms: i64) -> Self {
        Self {
            title: NOTIFICATION_TITLE.into(),
            text: format!("{} remaining", format_remaining(remaining_ms)),
            relock_action: RELOCK_ACTION_LABEL.into(),
            remaining_ms,
        }
    }
}

/// `M:SS` from whole seconds, truncating; negative input renders as `0:00`.
pub fn format_remaining(remaining_ms: i64) -> String {
    let total_seconds = (remaining_ms / 1000).max(0);
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Where countdown updates are rendered (an ongoing notification on Android).
pub trait StatusSurface: Send + Sync {
    /// Create or replace the indicator. Must not alert the user on updates.
    fn show(&self, notification: &StatusNotification);

    fn dismiss(&self);
}

/// Fallback surface for hosts without a notification area.
#[derive(Debug, Default)]
pub struct LogStatusSurface;

impl StatusSurface for LogStatusSurface {
    fn show(&self, notification: &StatusNotification) {
        log::debug!("{}: {}", notification.title, notification.text);
    }

    fn dismiss(&self) {
        info!("Unlock indicator dismissed");
    }
}

/// Keeps every update; used by tests and simulations.
#[derive(Debug, Default)]
pub struct RecordingStatusSurface {
    shown: Mutex<Vec<StatusNotification>>,
    dismissed: Mutex<usize>,
}

impl RecordingStatusSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<StatusNotification> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<StatusNotification> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn dismiss_count(&self) -> usize {
        *self.dismissed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StatusSurface for RecordingStatusSurface {
    fn show(&self, notification: &StatusNotification) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification.clone());
    }

    fn dismiss(&self) {
        *self.dismissed.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_time_formatting() {
        assert_eq!(format_remaining(1_800_000), "30:00");
        assert_eq!(format_remaining(1_799_999), "29:59");
        assert_eq!(format_remaining(61_000), "1:01");
        assert_eq!(format_remaining(999), "0:00");
        assert_eq!(format_remaining(-5_000), "0:00");
    }

    #[test]
    fn notification_carries_relock_action() {
        let notification = StatusNotification::for_remaining(90_500);
        assert_eq!(notification.title, "Apps unblocked");
        assert_eq!(notification.text, "1:30 remaining");
        assert_eq!(notification.relock_action, "Reblock");
    }
}
