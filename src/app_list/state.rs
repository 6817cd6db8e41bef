use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::AppInfo;

/// Everything the main list screen renders.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppListState {
    pub apps: Vec<AppInfo>,
    pub blocked_apps: BTreeSet<String>,
    pub blocking_enabled: bool,
    pub registered_tag_id: Option<String>,
    pub blocking_disabled_until: i64,
    pub is_registering: bool,
    /// Set right after a successful registration so the UI can confirm it once.
    pub just_registered: bool,
    pub accessibility_enabled: bool,
}

impl AppListState {
    pub fn is_unlocked(&self, now_ms: i64) -> bool {
        now_ms < self.blocking_disabled_until
    }

    /// Whole minutes left plus one, for the approximate "unblocked for ~N min"
    /// line: 31 at exactly 30:00 left, 1 with under a minute left.
    pub fn minutes_remaining(&self, now_ms: i64) -> Option<i64> {
        let remaining = self.blocking_disabled_until - now_ms;
        (remaining > 0).then(|| remaining / 60_000 + 1)
    }

    /// True when every listed app is in the blocked set (and the list is non-empty).
    pub fn all_blocked(&self) -> bool {
        !self.apps.is_empty()
            && self
                .apps
                .iter()
                .all(|app| self.blocked_apps.contains(&app.package_name))
    }
}
