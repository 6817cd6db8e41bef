//! Which installed apps the list screen offers for blocking.

use std::collections::HashSet;

use crate::{
    blocking::decision::SETTINGS_PACKAGE,
    models::{AppInfo, InstalledApp},
};

/// The platform package manager, reduced to what the app list needs.
pub trait AppCatalog: Send + Sync {
    fn installed_apps(&self) -> Vec<InstalledApp>;

    /// Package that handles the home screen, if one can be resolved.
    fn default_launcher(&self) -> Option<String>;

    /// Package that handles dialing, if one can be resolved.
    fn default_dialer(&self) -> Option<String>;
}

/// Launchable apps minus ourselves, the launcher, the dialer and settings,
/// sorted by case-insensitive label.
pub fn blockable_apps(catalog: &dyn AppCatalog, own_package: &str) -> Vec<AppInfo> {
    let mut excluded: HashSet<String> = HashSet::from([own_package.to_string()]);
    excluded.extend(catalog.default_launcher());
    excluded.extend(catalog.default_dialer());
    excluded.insert(SETTINGS_PACKAGE.to_string());

    let mut apps: Vec<AppInfo> = catalog
        .installed_apps()
        .into_iter()
        .filter(|app| app.launchable && !excluded.contains(&app.package_name))
        .map(AppInfo::from)
        .collect();

    apps.sort_by_cached_key(|app| app.label.to_lowercase());
    apps
}

/// Fixed catalog for hosts that enumerate apps up front, and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    pub apps: Vec<InstalledApp>,
    pub launcher: Option<String>,
    pub dialer: Option<String>,
}

impl AppCatalog for StaticCatalog {
    fn installed_apps(&self) -> Vec<InstalledApp> {
        self.apps.clone()
    }

    fn default_launcher(&self) -> Option<String> {
        self.launcher.clone()
    }

    fn default_dialer(&self) -> Option<String> {
        self.dialer.clone()
    }
}
