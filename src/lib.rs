mod app_list;
mod blocking;
mod catalog;
mod clock;
mod config;
mod events;
mod models;
mod permissions;
mod status;
mod store;
mod unlock;
mod utils;

use std::{path::Path, sync::Arc};

use anyhow::Result;
use log::info;

pub use app_list::{AppListModel, AppListState};
pub use blocking::{
    decide, format_tag_id, BlockDecision, BlockScreenLauncher, BlockedScreen, DecisionInput,
    ForegroundObserver, IgnoredPackages, ScreenOutcome, SkipReason,
};
pub use catalog::{blockable_apps, AppCatalog, StaticCatalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, BLOCK_DEBOUNCE_MS, UNLOCK_DURATION_MS};
pub use events::StateEvents;
pub use models::{AppInfo, BlockConfig, EventKind, ForegroundEvent, InstalledApp};
pub use permissions::{is_accessibility_service_enabled, AccessibilitySettings};
pub use status::{
    format_remaining, LogStatusSurface, RecordingStatusSurface, StatusNotification, StatusSurface,
};
pub use store::{BlockedAppsRepository, FileStore, KeyValueStore, MemoryStore};
pub use unlock::{UnlockController, UnlockSnapshot, UnlockState, UnlockWindow};
pub use utils::logging::init_logging;

/// The host's side of the contract: everything the core asks the platform for.
#[derive(Clone)]
pub struct Platform {
    pub clock: Arc<dyn Clock>,
    pub catalog: Arc<dyn AppCatalog>,
    pub accessibility: Arc<dyn AccessibilitySettings>,
    pub status: Arc<dyn StatusSurface>,
    pub launcher: Arc<dyn BlockScreenLauncher>,
}

/// All components, wired to one store and one lock state channel.
pub struct AppState {
    pub repo: BlockedAppsRepository,
    pub unlock: UnlockController,
    pub app_list: AppListModel,
    pub config: Config,
    platform: Platform,
}

impl AppState {
    pub fn new(store: Arc<dyn KeyValueStore>, platform: Platform, config: Config) -> Self {
        let repo = BlockedAppsRepository::new(store);
        let unlock = UnlockController::new(
            repo.clone(),
            platform.clock.clone(),
            platform.status.clone(),
            StateEvents::new(),
            config.tick_interval,
        );
        let app_list = AppListModel::new(
            repo.clone(),
            unlock.clone(),
            platform.catalog.clone(),
            platform.accessibility.clone(),
            config.clone(),
        );

        Self {
            repo,
            unlock,
            app_list,
            config,
            platform,
        }
    }

    /// Settings persisted as JSON under `data_dir`.
    pub fn open(data_dir: &Path, platform: Platform, config: Config) -> Result<Self> {
        let store = FileStore::in_dir(data_dir)?;
        info!("Settings at {}", store.path().display());
        Ok(Self::new(Arc::new(store), platform, config))
    }

    /// Like [`AppState::open`], with `FOCACCIA_DEBUG` / `FOCACCIA_PACKAGE` from the environment.
    pub fn open_from_env(data_dir: &Path, platform: Platform) -> Result<Self> {
        Self::open(data_dir, platform, Config::from_env())
    }

    /// Resume a window left open by a previous process and start mirroring
    /// lock state into the app list.
    pub async fn start(&self) -> Result<UnlockState> {
        self.app_list.follow_unlock_events().await;
        let state = self.unlock.resume().await?;
        info!("Focaccia core started ({state:?})");
        Ok(state)
    }

    /// A fresh observer for the accessibility service. Launcher and dialer are
    /// resolved once, when the service is created.
    pub fn foreground_observer(&self) -> ForegroundObserver {
        let catalog = &self.platform.catalog;
        let ignored = IgnoredPackages::new(&self.config.package_name)
            .with_resolved(catalog.default_launcher())
            .with_resolved(catalog.default_dialer());

        ForegroundObserver::new(
            self.repo.clone(),
            self.unlock.clone(),
            ignored,
            self.platform.launcher.clone(),
            self.config.debounce_ms,
        )
    }

    pub fn blocked_screen(&self) -> BlockedScreen {
        BlockedScreen::open(self.unlock.clone(), self.config.debug)
    }
}
