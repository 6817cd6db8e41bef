use std::sync::Arc;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{status::StatusNotification, unlock::UnlockState};

use super::controller::Inner;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Refresh the status indicator every tick until the stored deadline passes
/// or the token is cancelled.
///
/// The deadline is re-read from the store on every tick, so a window extended
/// or cleared by another process is followed rather than overwritten.
pub(super) async fn countdown_loop(inner: Arc<Inner>, cancel: CancellationToken) {
    let mut ticker = time::interval(inner.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if !tick(&inner, &cancel).await {
                    break;
                }
            }
        }
    }
}

/// One countdown step. Returns false once the countdown is over.
async fn tick(inner: &Inner, cancel: &CancellationToken) -> bool {
    let mut slot = inner.countdown.lock().await;

    // A relock or re-unlock replaced this countdown while we waited.
    if cancel.is_cancelled() {
        return false;
    }

    let until_ms = inner.repo.blocking_disabled_until();
    let remaining = until_ms - inner.clock.now_ms();

    if remaining > 0 {
        inner.status.show(&StatusNotification::for_remaining(remaining));
        return true;
    }

    if until_ms != 0 {
        if let Err(err) = inner.repo.set_blocking_disabled_until(0) {
            log_error!("Failed to clear expired unlock window: {err:?}");
        }
    }

    *slot = None;
    inner.status.dismiss();
    log_info!("Unlock window expired; blocking re-enabled");
    inner.events.publish(UnlockState::Locked);
    false
}
