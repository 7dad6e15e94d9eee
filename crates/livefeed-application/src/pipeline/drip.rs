use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use super::slot::SessionSlot;

/// Starts the periodic task that releases one slow-drip event per period.
///
/// The first release happens one full period after arming. The task ends when
/// `token` is cancelled or the slot reports the epoch as stale.
pub(crate) fn spawn_slow_drip(
    slot: Arc<SessionSlot>,
    epoch: u64,
    token: CancellationToken,
    period: Duration,
) {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(
            "[SlowDrip] Timer armed for @{} ({}ms, epoch {})",
            slot.handle(),
            period.as_millis(),
            epoch
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    if !slot.drip_tick(epoch) {
                        break;
                    }
                }
            }
        }

        tracing::debug!("[SlowDrip] Timer stopped for @{} (epoch {})", slot.handle(), epoch);
    });
}
