use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{api::VideoApi, types::Video};

/// Latest successful video list; `None` until the first fetch lands
pub type VideoSnapshot = Option<Arc<Vec<Video>>>;

/// Background task refreshing the video list on a fixed interval.
/// Dropping the handle tears the task down; `stop` also cancels a fetch
/// that is still in flight.
pub struct PollerHandle {
    shutdown_tx: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Fetch immediately, then every `interval`. Failed fetches are logged and
/// the previous snapshot stays in place.
pub fn spawn_poller(
    api: Arc<dyn VideoApi>,
    interval: Duration,
) -> (PollerHandle, watch::Receiver<VideoSnapshot>) {
    let (snapshot_tx, snapshot_rx) = watch::channel::<VideoSnapshot>(None);
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => return,
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                _ = shutdown_rx.recv() => return,
                fetched = api.list_videos() => fetched,
            };
            match fetched {
                Ok(videos) => {
                    debug!(count = videos.len(), "video list refreshed");
                    if snapshot_tx.send(Some(Arc::new(videos))).is_err() {
                        return;
                    }
                }
                Err(e) => warn!(error = %e, "failed to refresh video list"),
            }
        }
    });

    (
        PollerHandle {
            shutdown_tx,
            task: Some(task),
        },
        snapshot_rx,
    )
}
