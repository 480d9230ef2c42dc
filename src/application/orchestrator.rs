use crate::domain::approval::ApprovalGate;
use crate::domain::ports::{NotificationSinkRef, PublishBackendRef, WorkItemQueueRef};
use crate::domain::work_item::{Stage, WorkItem, WorkItemId};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Structured record of one orchestrator decision or execution.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub action_type: String,
    pub target: WorkItemId,
    pub approval_status: String,
    pub result: String,
}

/// Read-only aggregate published by the housekeeping tick.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StatusReport {
    pub generated_at: Option<DateTime<Utc>>,
    pub stage_counts: HashMap<Stage, usize>,
    pub recent_activity: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    pub poll_interval: Duration,
    pub housekeeping_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            housekeeping_interval: Duration::from_secs(30),
        }
    }
}

/// State machine over work-item stages.
///
/// Two polling loops (Incoming and Approved) plus a periodic housekeeping
/// tick. All cross-loop coordination goes through the queue's atomic
/// `try_move`; a lost race is a no-op, never an error.
pub struct Orchestrator {
    queue: WorkItemQueueRef,
    gate: ApprovalGate,
    publisher: PublishBackendRef,
    notifier: NotificationSinkRef,
    activity: RwLock<Vec<ActivityEntry>>,
    status_tx: watch::Sender<StatusReport>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        queue: WorkItemQueueRef,
        gate: ApprovalGate,
        publisher: PublishBackendRef,
        notifier: NotificationSinkRef,
        config: OrchestratorConfig,
    ) -> Self {
        let (status_tx, _) = watch::channel(StatusReport::default());
        Self {
            queue,
            gate,
            publisher,
            notifier,
            activity: RwLock::new(Vec::new()),
            status_tx,
            config,
        }
    }

    /// Latest published status; updated on every housekeeping tick.
    pub fn status(&self) -> watch::Receiver<StatusReport> {
        self.status_tx.subscribe()
    }

    /// Runs the two polling loops and the housekeeping tick until the stop
    /// flag flips. In-flight passes finish before a loop exits.
    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) {
        tracing::info!("orchestrator starting");

        let incoming = {
            let this = Arc::clone(&self);
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut tick = tokio::time::interval(this.config.poll_interval);
                loop {
                    tokio::select! {
                        _ = tick.tick() => {
                            if let Err(err) = this.process_incoming_once().await {
                                tracing::error!(error = %err, "incoming pass failed");
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            })
        };

        let approved = {
            let this = Arc::clone(&self);
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut tick = tokio::time::interval(this.config.poll_interval);
                loop {
                    tokio::select! {
                        _ = tick.tick() => {
                            if let Err(err) = this.process_approved_once().await {
                                tracing::error!(error = %err, "approved pass failed");
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            })
        };

        let housekeeping = {
            let this = Arc::clone(&self);
            let mut shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut tick = tokio::time::interval(this.config.housekeeping_interval);
                loop {
                    tokio::select! {
                        _ = tick.tick() => {
                            if let Err(err) = this.housekeeping_tick().await {
                                tracing::error!(error = %err, "housekeeping tick failed");
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            })
        };

        let _ = tokio::join!(incoming, approved, housekeeping);
        tracing::info!("orchestrator stopped");
    }

    /// One pass over Incoming: claim, plan, gate, route. Returns the number
    /// of items this pass actually claimed.
    pub async fn process_incoming_once(&self) -> Result<usize> {
        let mut handled = 0;
        for item in self.queue.list(Stage::Incoming).await? {
            // Claiming into Planned is the ownership transfer; a racing
            // orchestrator pass finds the item gone and skips it.
            if !self
                .queue
                .try_move(item.id, Stage::Incoming, Stage::Planned)
                .await?
            {
                continue;
            }
            handled += 1;

            let Some(mut item) = self.queue.get(Stage::Planned, item.id).await? else {
                continue;
            };
            item.plan = Some(synthesize_plan(&item));
            item.touch();

            let (target, approval_status, result) = if self.gate.requires_approval(&item) {
                (Stage::PendingApproval, "requires_approval", "moved_to_pending")
            } else {
                (Stage::Done, "auto_approved", "completed")
            };

            let id = item.id;
            self.queue.put(Stage::Planned, item).await?;
            self.queue.try_move(id, Stage::Planned, target).await?;
            self.log_activity("task_processing", id, approval_status, result)
                .await;
            tracing::info!(item = %id, stage = %target, "incoming item routed");
        }
        Ok(handled)
    }

    /// One pass over Approved: claim into Done, then dispatch by kind.
    pub async fn process_approved_once(&self) -> Result<usize> {
        let mut handled = 0;
        for item in self.queue.list(Stage::Approved).await? {
            if !self
                .queue
                .try_move(item.id, Stage::Approved, Stage::Done)
                .await?
            {
                continue;
            }
            handled += 1;

            let (action_type, outcome) = self.dispatch(&item).await;
            let result = match outcome {
                Ok(_) => "success".to_string(),
                Err(err) => {
                    tracing::warn!(item = %item.id, error = %err, "execution handler failed");
                    format!("failed: {err}")
                }
            };
            self.log_activity(action_type, item.id, "approved", &result)
                .await;
        }
        Ok(handled)
    }

    async fn dispatch(&self, item: &WorkItem) -> (&'static str, Result<()>) {
        use crate::domain::work_item::WorkItemKind;
        match item.kind {
            WorkItemKind::Publish => (
                "publish",
                self.publisher
                    .publish(&item.body, "public")
                    .await
                    .map(|_| ()),
            ),
            WorkItemKind::Notification | WorkItemKind::Payment => (
                "send",
                self.notifier
                    .notify(&item.header.source, &item.header.subject, &item.body)
                    .await,
            ),
            WorkItemKind::Generic => ("general_task", Ok(())),
        }
    }

    /// Recomputes and publishes the aggregate status. Read-only: never
    /// mutates item state.
    pub async fn housekeeping_tick(&self) -> Result<StatusReport> {
        let stage_counts = self.queue.counts().await?;
        let activity = self.activity.read().await;
        let recent_activity = activity.iter().rev().take(5).cloned().collect();

        let report = StatusReport {
            generated_at: Some(Utc::now()),
            stage_counts,
            recent_activity,
        };
        self.status_tx.send_replace(report.clone());
        tracing::debug!(stages = ?report.stage_counts, "status published");
        Ok(report)
    }

    pub async fn recent_activity(&self, limit: usize) -> Vec<ActivityEntry> {
        let activity = self.activity.read().await;
        activity.iter().rev().take(limit).cloned().collect()
    }

    async fn log_activity(
        &self,
        action_type: &str,
        target: WorkItemId,
        approval_status: &str,
        result: &str,
    ) {
        let mut activity = self.activity.write().await;
        activity.push(ActivityEntry {
            timestamp: Utc::now(),
            action_type: action_type.to_string(),
            target,
            approval_status: approval_status.to_string(),
            result: result.to_string(),
        });
    }
}

fn synthesize_plan(item: &WorkItem) -> String {
    format!(
        "# Plan for {}\n\n1. Review {} item from {}\n2. Prepare execution\n3. {}\n",
        item.header.subject,
        item.header.subject,
        item.header.source,
        "Request approval if required",
    )
}
