use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::info;
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::{format_ms, Clock},
    events::StateEvents,
    status::StatusSurface,
    store::BlockedAppsRepository,
};

use super::{countdown::countdown_loop, UnlockState, UnlockWindow};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnlockSnapshot {
    pub state: UnlockState,
    pub remaining_ms: i64,
}

pub(super) struct Countdown {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub(super) struct Inner {
    pub(super) repo: BlockedAppsRepository,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) status: Arc<dyn StatusSurface>,
    pub(super) events: StateEvents,
    pub(super) tick_interval: Duration,
    /// Guards every transition; the running countdown, if any, lives here.
    pub(super) countdown: Mutex<Option<Countdown>>,
}

/// Owns the unlock deadline: opening, extending and closing the window,
/// and the countdown that runs while it is open.
#[derive(Clone)]
pub struct UnlockController {
    inner: Arc<Inner>,
}

impl UnlockController {
    pub fn new(
        repo: BlockedAppsRepository,
        clock: Arc<dyn Clock>,
        status: Arc<dyn StatusSurface>,
        events: StateEvents,
        tick_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                repo,
                clock,
                status,
                events,
                tick_interval,
                countdown: Mutex::new(None),
            }),
        }
    }

    pub fn window(&self) -> UnlockWindow {
        UnlockWindow::new(self.inner.repo.blocking_disabled_until())
    }

    pub fn state(&self) -> UnlockState {
        self.window().state(self.inner.clock.now_ms())
    }

    pub fn is_unlocked(&self) -> bool {
        self.state().is_unlocked()
    }

    pub fn snapshot(&self) -> UnlockSnapshot {
        let now = self.inner.clock.now_ms();
        let window = self.window();
        UnlockSnapshot {
            state: window.state(now),
            remaining_ms: window.remaining_ms(now),
        }
    }

    pub fn events(&self) -> &StateEvents {
        &self.inner.events
    }

    /// Open (or re-open) the window for the full duration from now.
    pub async fn unlock(&self) -> Result<UnlockWindow> {
        let mut slot = self.inner.countdown.lock().await;

        let window = UnlockWindow::opened_at(self.inner.clock.now_ms());
        self.inner
            .repo
            .set_blocking_disabled_until(window.disabled_until_ms)?;

        if let Some(previous) = slot.take() {
            previous.stop();
        }
        *slot = Some(self.spawn_countdown());

        info!(
            "Blocking suppressed until {}",
            format_ms(window.disabled_until_ms)
        );
        self.inner.events.publish(UnlockState::Unlocked {
            until_ms: window.disabled_until_ms,
        });

        Ok(window)
    }

    /// Close the window now. Always clears the stored deadline; only announces
    /// a change if the window was actually open.
    pub async fn relock(&self) -> Result<()> {
        let mut slot = self.inner.countdown.lock().await;

        let was_unlocked = self.state().is_unlocked();
        self.inner.repo.set_blocking_disabled_until(0)?;

        let had_countdown = match slot.take() {
            Some(countdown) => {
                countdown.stop();
                true
            }
            None => false,
        };

        if had_countdown || was_unlocked {
            self.inner.status.dismiss();
        }

        if was_unlocked {
            info!("Blocking re-enabled");
            self.inner.events.publish(UnlockState::Locked);
        }

        Ok(())
    }

    /// Unlock iff a tag is registered and `scanned_id` is exactly it.
    pub async fn try_unlock_with_tag(&self, scanned_id: &str) -> Result<Option<UnlockWindow>> {
        match self.inner.repo.registered_tag_id() {
            Some(registered) if registered == scanned_id => self.unlock().await.map(Some),
            Some(_) => {
                info!("Scanned tag does not match the registered tag");
                Ok(None)
            }
            None => {
                info!("Tag scanned but no tag is registered");
                Ok(None)
            }
        }
    }

    pub fn registered_tag_id(&self) -> Option<String> {
        self.inner.repo.registered_tag_id()
    }

    /// Replace the registered tag. Only one tag is ever registered.
    pub fn register_tag(&self, tag_id: &str) -> Result<()> {
        self.inner.repo.set_registered_tag_id(Some(tag_id))?;
        info!("Registered unlock tag");
        Ok(())
    }

    /// Forget the tag and close any open window along with it.
    pub async fn clear_tag(&self) -> Result<()> {
        self.inner.repo.set_registered_tag_id(None)?;
        info!("Cleared unlock tag");
        self.relock().await
    }

    /// Pick up a window left open by an earlier process and restart its
    /// countdown. No-op if locked or already counting down.
    pub async fn resume(&self) -> Result<UnlockState> {
        let mut slot = self.inner.countdown.lock().await;
        let state = self.state();

        if let UnlockState::Unlocked { until_ms } = state {
            if slot.is_none() {
                info!("Resuming unlock countdown until {}", format_ms(until_ms));
                *slot = Some(self.spawn_countdown());
                self.inner.events.publish(state);
            }
        }

        Ok(state)
    }

    pub async fn is_counting_down(&self) -> bool {
        self.inner
            .countdown
            .lock()
            .await
            .as_ref()
            .is_some_and(|countdown| !countdown.handle.is_finished())
    }

    fn spawn_countdown(&self) -> Countdown {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(countdown_loop(self.inner.clone(), cancel.clone()));
        Countdown { cancel, handle }
    }
}

impl Countdown {
    fn stop(self) {
        self.cancel.cancel();
        drop(self.handle);
    }
}
