use serde::{Deserialize, Serialize};

/// An app as reported by the platform's package manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstalledApp {
    pub package_name: String,
    pub label: String,
    /// Has a launcher entry point.
    pub launchable: bool,
}

impl InstalledApp {
    pub fn new(package_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            label: label.into(),
            launchable: true,
        }
    }
}

/// A row in the app list screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub package_name: String,
    pub label: String,
}

impl From<InstalledApp> for AppInfo {
    fn from(app: InstalledApp) -> Self {
        Self {
            package_name: app.package_name,
            label: app.label,
        }
    }
}
