//! Cleanup Sweep Task
//!
//! Background task that periodically runs the cache cleanup sweep, so
//! expired entries are dropped even when no write hits the quota.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::storage::Storage;

/// Spawns a background task that periodically sweeps the cache.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. It holds the write lock only for the sweep itself.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task<S>(cache: SharedCache<S>, cleanup_interval_secs: u64) -> JoinHandle<()>
where
    S: Storage + 'static,
{
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting cache cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let report = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup()
            };

            if report.removed() > 0 {
                info!(
                    "Cleanup sweep: removed {} entries, usage now {} bytes",
                    report.removed(),
                    report.usage_after
                );
            } else {
                debug!("Cleanup sweep: nothing to remove");
            }
        }
    })
}
