use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use warden_core::cache::DecisionCache;

pub fn run_sweep_cycle(cache: &DecisionCache) -> usize {
    let purged = cache.purge_expired();
    if purged > 0 {
        tracing::debug!(purged, remaining = cache.len(), "expired decisions swept");
    }
    purged
}

/// Periodically drops expired decisions. The first sweep runs one `interval`
/// after spawning.
pub fn spawn_sweeper(cache: Arc<DecisionCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_sweep_cycle(&cache);
        }
    })
}
