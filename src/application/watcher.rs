use crate::domain::ports::{WatcherSource, WorkItemQueueRef};
use crate::domain::work_item::Stage;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Bridges an external discovery source into the Incoming mailbox.
///
/// One pump runs per watcher; the core never contacts the originating
/// medium itself.
pub struct WatcherPump {
    source: Arc<dyn WatcherSource>,
    queue: WorkItemQueueRef,
    poll_interval: Duration,
}

impl WatcherPump {
    pub fn new(
        source: Arc<dyn WatcherSource>,
        queue: WorkItemQueueRef,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            queue,
            poll_interval,
        }
    }

    /// Polls the source once and enqueues everything it discovered.
    pub async fn pump_once(&self) -> Result<usize> {
        let items = self.source.poll().await?;
        let discovered = items.len();
        for item in items {
            tracing::info!(item = %item.id, source = %item.header.source, "work item discovered");
            self.queue.put(Stage::Incoming, item).await?;
        }
        Ok(discovered)
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(err) = self.pump_once().await {
                        tracing::error!(error = %err, "watcher poll failed");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
    }
}
