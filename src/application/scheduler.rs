use crate::domain::ports::WorkItemQueueRef;
use crate::domain::work_item::{ItemHeader, Priority, Stage, WorkItem, WorkItemKind};
use crate::error::Result;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use tokio::sync::watch;

/// When a rule fires relative to the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recurrence {
    /// Once per day at the given time of day (UTC).
    Daily(NaiveTime),
    /// Once per week on the given weekday at the given time (UTC).
    Weekly(Weekday, NaiveTime),
    /// On a fixed interval.
    Every(Duration),
}

/// Pure due-check so rule behavior is testable without a clock.
///
/// Daily/Weekly rules fire at most once per calendar day; interval rules
/// fire whenever the elapsed time since the last firing reaches the period.
pub fn is_due(recurrence: Recurrence, last_fired: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    let not_fired_today =
        |last: Option<DateTime<Utc>>| last.is_none_or(|t| t.date_naive() < now.date_naive());
    match recurrence {
        Recurrence::Daily(at) => now.time() >= at && not_fired_today(last_fired),
        Recurrence::Weekly(weekday, at) => {
            now.weekday() == weekday && now.time() >= at && not_fired_today(last_fired)
        }
        Recurrence::Every(period) => last_fired.is_none_or(|t| now - t >= period),
    }
}

type JobFn = Box<dyn Fn(DateTime<Utc>) -> (Stage, WorkItem) + Send + Sync>;

pub struct ScheduleRule {
    pub name: String,
    pub recurrence: Recurrence,
    job: JobFn,
    last_fired: Option<DateTime<Utc>>,
}

impl ScheduleRule {
    pub fn new(
        name: &str,
        recurrence: Recurrence,
        job: impl Fn(DateTime<Utc>) -> (Stage, WorkItem) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            recurrence,
            job: Box::new(job),
            last_fired: None,
        }
    }
}

/// Time-driven trigger injecting recurring synthetic work items.
///
/// Runs on its own task and shares no mutable state with the orchestrator
/// loops; everything it produces goes through the queue.
pub struct Scheduler {
    queue: WorkItemQueueRef,
    rules: Vec<ScheduleRule>,
}

impl Scheduler {
    pub fn new(queue: WorkItemQueueRef, rules: Vec<ScheduleRule>) -> Self {
        Self { queue, rules }
    }

    /// The stock rule set: a daily morning summary, a weekly post draft that
    /// goes through approval, and a periodic inbox sweep marker.
    pub fn with_default_rules(queue: WorkItemQueueRef) -> Self {
        let rules = vec![
            ScheduleRule::new(
                "morning_summary",
                Recurrence::Daily(NaiveTime::from_hms_opt(8, 0, 0).expect("valid time")),
                |now| {
                    let item = WorkItem::new(
                        WorkItemKind::Generic,
                        ItemHeader {
                            source: "scheduler".to_string(),
                            priority: Priority::Normal,
                            subject: format!("Morning summary {}", now.date_naive()),
                        },
                        "Compile the morning summary of outstanding work.",
                    );
                    (Stage::Incoming, item)
                },
            ),
            ScheduleRule::new(
                "weekly_post_draft",
                Recurrence::Weekly(
                    Weekday::Mon,
                    NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
                ),
                |now| {
                    let item = WorkItem::new(
                        WorkItemKind::Publish,
                        ItemHeader {
                            source: "scheduler".to_string(),
                            priority: Priority::Normal,
                            subject: format!("Weekly post draft {}", now.date_naive()),
                        },
                        "Draft of this week's public update, pending review.",
                    );
                    // Drafts always need a human eye before publishing.
                    (Stage::PendingApproval, item)
                },
            ),
            ScheduleRule::new(
                "inbox_sweep",
                Recurrence::Every(Duration::minutes(10)),
                |now| {
                    let item = WorkItem::new(
                        WorkItemKind::Generic,
                        ItemHeader {
                            source: "scheduler".to_string(),
                            priority: Priority::Low,
                            subject: format!("Inbox sweep {}", now.format("%H:%M")),
                        },
                        "Sweep watcher inboxes for unprocessed items.",
                    );
                    (Stage::Incoming, item)
                },
            ),
        ];
        Self::new(queue, rules)
    }

    /// Fires every due rule once. Returns how many fired.
    pub async fn tick_once(&mut self, now: DateTime<Utc>) -> Result<usize> {
        let mut fired = 0;
        for rule in &mut self.rules {
            if is_due(rule.recurrence, rule.last_fired, now) {
                let (stage, item) = (rule.job)(now);
                tracing::info!(rule = %rule.name, item = %item.id, stage = %stage, "schedule rule fired");
                self.queue.put(stage, item).await?;
                rule.last_fired = Some(now);
                fired += 1;
            }
        }
        Ok(fired)
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(rules = self.rules.len(), "scheduler starting");
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(err) = self.tick_once(Utc::now()).await {
                        tracing::error!(error = %err, "scheduler tick failed");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
        tracing::info!("scheduler stopped");
    }
}
