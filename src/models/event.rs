use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// A new window (usually a new app) came to the foreground.
    WindowStateChanged,
    Other,
}

/// One accessibility event, reduced to what the blocker needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForegroundEvent {
    pub kind: EventKind,
    pub package_name: Option<String>,
    pub timestamp_ms: i64,
}

impl ForegroundEvent {
    pub fn window_changed(package_name: impl Into<String>, timestamp_ms: i64) -> Self {
        Self {
            kind: EventKind::WindowStateChanged,
            package_name: Some(package_name.into()),
            timestamp_ms,
        }
    }
}
