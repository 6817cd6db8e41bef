use std::{collections::BTreeSet, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::{
    sync::{broadcast::error::RecvError, Mutex},
    task::JoinHandle,
};

use crate::{
    blocking::format_tag_id,
    catalog::{blockable_apps, AppCatalog},
    config::Config,
    permissions::{is_accessibility_service_enabled, AccessibilitySettings},
    store::BlockedAppsRepository,
    unlock::{UnlockController, UnlockState},
};

use super::AppListState;

/// Tag id registered by the debug-only "register fake tag" action.
pub const DEBUG_TAG_ID: &str = "DEBUG00";

struct Inner {
    state: Mutex<AppListState>,
    repo: BlockedAppsRepository,
    unlock: UnlockController,
    catalog: Arc<dyn AppCatalog>,
    accessibility: Arc<dyn AccessibilitySettings>,
    config: Config,
    registration_timeout: Mutex<Option<JoinHandle<()>>>,
    follower: Mutex<Option<JoinHandle<()>>>,
}

/// State holder for the main list screen. Every user action is written
/// through to the store before the in-memory state changes.
#[derive(Clone)]
pub struct AppListModel {
    inner: Arc<Inner>,
}

impl AppListModel {
    pub fn new(
        repo: BlockedAppsRepository,
        unlock: UnlockController,
        catalog: Arc<dyn AppCatalog>,
        accessibility: Arc<dyn AccessibilitySettings>,
        config: Config,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(AppListState::default()),
                repo,
                unlock,
                catalog,
                accessibility,
                config,
                registration_timeout: Mutex::new(None),
                follower: Mutex::new(None),
            }),
        }
    }

    pub async fn state(&self) -> AppListState {
        self.inner.state.lock().await.clone()
    }

    /// Enumerate apps off the async threads and reload every persisted field.
    pub async fn load_apps(&self) -> Result<AppListState> {
        let catalog = self.inner.catalog.clone();
        let own_package = self.inner.config.package_name.clone();
        let apps = tokio::task::spawn_blocking(move || blockable_apps(catalog.as_ref(), &own_package))
            .await
            .context("app enumeration worker join failed")?;

        let fresh = AppListState {
            apps,
            blocked_apps: self.inner.repo.blocked_apps(),
            blocking_enabled: self.inner.repo.is_blocking_enabled(),
            registered_tag_id: self.inner.repo.registered_tag_id(),
            blocking_disabled_until: self.inner.repo.blocking_disabled_until(),
            is_registering: false,
            just_registered: false,
            accessibility_enabled: self.accessibility_enabled(),
        };

        let mut state = self.inner.state.lock().await;
        *state = fresh;
        info!("Loaded {} blockable apps", state.apps.len());
        Ok(state.clone())
    }

    /// Re-read the fields other components can change behind our back.
    pub async fn refresh_unlock_state(&self) {
        let mut state = self.inner.state.lock().await;
        state.blocking_disabled_until = self.inner.repo.blocking_disabled_until();
        state.registered_tag_id = self.inner.repo.registered_tag_id();
        state.accessibility_enabled = self.accessibility_enabled();
    }

    pub async fn toggle_app_blocked(&self, package_name: &str) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let mut blocked = state.blocked_apps.clone();
        if !blocked.remove(package_name) {
            blocked.insert(package_name.to_string());
        }
        self.inner.repo.set_blocked_apps(&blocked)?;
        state.blocked_apps = blocked;
        Ok(())
    }

    /// Block every listed app, or clear the set if they already all are.
    pub async fn toggle_select_all(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let blocked: BTreeSet<String> = if state.all_blocked() {
            BTreeSet::new()
        } else {
            state
                .apps
                .iter()
                .map(|app| app.package_name.clone())
                .collect()
        };
        self.inner.repo.set_blocked_apps(&blocked)?;
        state.blocked_apps = blocked;
        Ok(())
    }

    pub async fn set_blocking_enabled(&self, enabled: bool) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        self.inner.repo.set_blocking_enabled(enabled)?;
        state.blocking_enabled = enabled;
        info!("Blocking {}", if enabled { "enabled" } else { "disabled" });
        Ok(())
    }

    /// Wait for a tag scan; gives up on its own after the configured timeout.
    pub async fn start_registering(&self) {
        self.inner.state.lock().await.is_registering = true;

        let inner = self.inner.clone();
        let timeout = self.inner.config.registration_timeout;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut state = inner.state.lock().await;
            if state.is_registering {
                info!("Tag registration timed out");
                state.is_registering = false;
            }
        });

        if let Some(previous) = self.inner.registration_timeout.lock().await.replace(handle) {
            previous.abort();
        }
    }

    pub async fn stop_registering(&self) {
        self.cancel_registration_timeout().await;
        self.inner.state.lock().await.is_registering = false;
    }

    pub async fn register_tag(&self, tag_id: &str) -> Result<()> {
        self.cancel_registration_timeout().await;
        self.inner.unlock.register_tag(tag_id)?;

        let mut state = self.inner.state.lock().await;
        state.registered_tag_id = Some(tag_id.to_string());
        state.is_registering = false;
        state.just_registered = true;
        Ok(())
    }

    /// Registers [`DEBUG_TAG_ID`]; only honoured in debug mode.
    pub async fn register_debug_tag(&self) -> Result<bool> {
        if !self.inner.config.debug {
            return Ok(false);
        }
        self.register_tag(DEBUG_TAG_ID).await?;
        Ok(true)
    }

    pub async fn clear_just_registered(&self) {
        self.inner.state.lock().await.just_registered = false;
    }

    /// A tag scanned while the list screen is in front: registers it if a
    /// registration is pending, otherwise unlocks when it matches.
    pub async fn on_tag_scanned(&self, raw_id: &[u8]) -> Result<()> {
        let tag_id = format_tag_id(raw_id);
        let registering = self.inner.state.lock().await.is_registering;
        if registering {
            return self.register_tag(&tag_id).await;
        }

        // Matched against the stored tag, which another screen may have replaced.
        let window = self.inner.unlock.try_unlock_with_tag(&tag_id).await?;
        let mut state = self.inner.state.lock().await;
        state.registered_tag_id = self.inner.repo.registered_tag_id();
        if let Some(window) = window {
            state.blocking_disabled_until = window.disabled_until_ms;
        }
        Ok(())
    }

    pub async fn clear_tag(&self) -> Result<()> {
        self.inner.unlock.clear_tag().await?;

        let mut state = self.inner.state.lock().await;
        state.registered_tag_id = None;
        state.blocking_disabled_until = 0;
        Ok(())
    }

    pub async fn relock_blocking(&self) -> Result<()> {
        self.inner.unlock.relock().await?;
        self.inner.state.lock().await.blocking_disabled_until = 0;
        Ok(())
    }

    pub async fn unlock_blocking(&self) -> Result<()> {
        let window = self.inner.unlock.unlock().await?;
        self.inner.state.lock().await.blocking_disabled_until = window.disabled_until_ms;
        Ok(())
    }

    /// Mirror lock state changes (notification relock, expiry, unlocks from
    /// the block screen) into this model until [`Self::stop_following`].
    pub async fn follow_unlock_events(&self) {
        let mut rx = self.inner.unlock.events().subscribe();
        let model = self.clone();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(UnlockState::Locked) => {
                        model.inner.state.lock().await.blocking_disabled_until = 0;
                    }
                    Ok(UnlockState::Unlocked { until_ms }) => {
                        model.inner.state.lock().await.blocking_disabled_until = until_ms;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("App list missed {skipped} unlock events; re-reading store");
                        model.refresh_unlock_state().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.inner.follower.lock().await.replace(handle) {
            previous.abort();
        }
    }

    pub async fn stop_following(&self) {
        if let Some(handle) = self.inner.follower.lock().await.take() {
            handle.abort();
        }
    }

    async fn cancel_registration_timeout(&self) {
        if let Some(handle) = self.inner.registration_timeout.lock().await.take() {
            handle.abort();
        }
    }

    fn accessibility_enabled(&self) -> bool {
        let services = self.inner.accessibility.enabled_services();
        is_accessibility_service_enabled(
            services.as_deref(),
            &self.inner.config.accessibility_component(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::StaticCatalog,
        clock::ManualClock,
        events::StateEvents,
        models::InstalledApp,
        status::RecordingStatusSurface,
        store::MemoryStore,
    };

    const T0: i64 = 1_700_000_000_000;

    struct EnabledServices(Option<String>);

    impl AccessibilitySettings for EnabledServices {
        fn enabled_services(&self) -> Option<String> {
            self.0.clone()
        }
    }

    struct Fixture {
        model: AppListModel,
        repo: BlockedAppsRepository,
        unlock: UnlockController,
        clock: Arc<ManualClock>,
    }

    fn fixture(debug: bool) -> Fixture {
        let config = Config {
            debug,
            ..Config::default()
        };
        let repo = BlockedAppsRepository::new(Arc::new(MemoryStore::new()));
        let clock = Arc::new(ManualClock::new(T0));
        let unlock = UnlockController::new(
            repo.clone(),
            clock.clone(),
            Arc::new(RecordingStatusSurface::new()),
            StateEvents::new(),
            Duration::from_secs(1),
        );
        let catalog = StaticCatalog {
            apps: vec![
                InstalledApp::new("com.example.b", "Bravo"),
                InstalledApp::new("com.example.a", "alpha"),
                InstalledApp::new("dev.nutting.focaccia", "Focaccia"),
            ],
            launcher: None,
            dialer: None,
        };
        let accessibility = EnabledServices(Some(config.accessibility_component()));
        let model = AppListModel::new(
            repo.clone(),
            unlock.clone(),
            Arc::new(catalog),
            Arc::new(accessibility),
            config,
        );
        Fixture {
            model,
            repo,
            unlock,
            clock,
        }
    }

    #[tokio::test]
    async fn load_reads_catalog_and_store() {
        let f = fixture(false);
        f.repo.set_blocking_enabled(true).unwrap();
        f.repo.set_registered_tag_id(Some("AA11")).unwrap();

        let state = f.model.load_apps().await.unwrap();
        let packages: Vec<&str> = state.apps.iter().map(|a| a.package_name.as_str()).collect();
        assert_eq!(packages, vec!["com.example.a", "com.example.b"]);
        assert!(state.blocking_enabled);
        assert_eq!(state.registered_tag_id.as_deref(), Some("AA11"));
        assert!(state.accessibility_enabled);
    }

    #[tokio::test]
    async fn toggles_are_written_through() {
        let f = fixture(false);
        f.model.load_apps().await.unwrap();

        f.model.toggle_app_blocked("com.example.a").await.unwrap();
        assert!(f.repo.blocked_apps().contains("com.example.a"));

        f.model.toggle_app_blocked("com.example.a").await.unwrap();
        assert!(f.repo.blocked_apps().is_empty());

        f.model.set_blocking_enabled(true).await.unwrap();
        assert!(f.repo.is_blocking_enabled());
        assert!(f.model.state().await.blocking_enabled);
    }

    #[tokio::test]
    async fn select_all_toggles_between_all_and_none() {
        let f = fixture(false);
        f.model.load_apps().await.unwrap();
        f.model.toggle_app_blocked("com.example.a").await.unwrap();

        f.model.toggle_select_all().await.unwrap();
        let all: BTreeSet<String> = ["com.example.a", "com.example.b"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(f.repo.blocked_apps(), all);

        f.model.toggle_select_all().await.unwrap();
        assert!(f.repo.blocked_apps().is_empty());
        assert!(f.model.state().await.blocked_apps.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn registration_times_out() {
        let f = fixture(false);
        f.model.start_registering().await;
        assert!(f.model.state().await.is_registering);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(!f.model.state().await.is_registering);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_while_registering_registers_tag() {
        let f = fixture(false);
        f.model.start_registering().await;
        f.model.on_tag_scanned(&[0xAA, 0x11]).await.unwrap();

        let state = f.model.state().await;
        assert_eq!(state.registered_tag_id.as_deref(), Some("AA11"));
        assert!(!state.is_registering);
        assert!(state.just_registered);
        assert_eq!(f.repo.registered_tag_id().as_deref(), Some("AA11"));

        f.model.clear_just_registered().await;
        assert!(!f.model.state().await.just_registered);
        assert!(!f.unlock.is_unlocked());
    }

    #[tokio::test(start_paused = true)]
    async fn scan_of_registered_tag_unlocks() {
        let f = fixture(false);
        f.model.register_tag("AA11").await.unwrap();

        f.model.on_tag_scanned(&[0xBB, 0x22]).await.unwrap();
        assert!(!f.unlock.is_unlocked());

        f.model.on_tag_scanned(&[0xAA, 0x11]).await.unwrap();
        assert_eq!(f.repo.blocking_disabled_until(), T0 + 1_800_000);
        assert_eq!(
            f.model.state().await.blocking_disabled_until,
            T0 + 1_800_000
        );
    }

    #[tokio::test(start_paused = true)]
    async fn scan_matches_tag_replaced_elsewhere() {
        let f = fixture(false);
        f.model.register_tag("AA11").await.unwrap();
        f.repo.set_registered_tag_id(Some("BB22")).unwrap();

        f.model.on_tag_scanned(&[0xAA, 0x11]).await.unwrap();
        assert!(!f.unlock.is_unlocked());
        assert_eq!(
            f.model.state().await.registered_tag_id.as_deref(),
            Some("BB22")
        );

        f.model.on_tag_scanned(&[0xBB, 0x22]).await.unwrap();
        assert!(f.unlock.is_unlocked());
        assert_eq!(
            f.model.state().await.blocking_disabled_until,
            T0 + 1_800_000
        );
    }

    #[tokio::test(start_paused = true)]
    async fn clear_tag_relocks() {
        let f = fixture(false);
        f.model.register_tag("AA11").await.unwrap();
        f.model.unlock_blocking().await.unwrap();

        f.model.clear_tag().await.unwrap();
        let state = f.model.state().await;
        assert_eq!(state.registered_tag_id, None);
        assert_eq!(state.blocking_disabled_until, 0);
        assert_eq!(f.repo.blocking_disabled_until(), 0);
        assert!(!f.unlock.is_counting_down().await);
    }

    #[tokio::test(start_paused = true)]
    async fn follows_relock_from_elsewhere() {
        let f = fixture(false);
        f.model.follow_unlock_events().await;

        f.unlock.unlock().await.unwrap();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(
            f.model.state().await.blocking_disabled_until,
            T0 + 1_800_000
        );

        // e.g. the notification's relock action
        f.unlock.relock().await.unwrap();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(f.model.state().await.blocking_disabled_until, 0);

        f.model.stop_following().await;
    }

    #[tokio::test(start_paused = true)]
    async fn follows_expiry() {
        let f = fixture(false);
        f.model.follow_unlock_events().await;
        f.model.unlock_blocking().await.unwrap();

        f.clock.advance(1_800_000);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(f.model.state().await.blocking_disabled_until, 0);
        assert_eq!(f.repo.blocking_disabled_until(), 0);
    }

    #[tokio::test]
    async fn debug_tag_needs_debug_mode() {
        let f = fixture(false);
        assert!(!f.model.register_debug_tag().await.unwrap());
        assert_eq!(f.repo.registered_tag_id(), None);

        let f = fixture(true);
        assert!(f.model.register_debug_tag().await.unwrap());
        assert_eq!(f.repo.registered_tag_id().as_deref(), Some("DEBUG00"));
    }
}
