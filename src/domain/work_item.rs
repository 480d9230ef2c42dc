use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle position of a work item. Exactly one mailbox holds any given
/// item at a time; moving between mailboxes is the only legal transition.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Incoming,
    Planned,
    PendingApproval,
    Approved,
    Done,
    Rejected,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Incoming,
        Stage::Planned,
        Stage::PendingApproval,
        Stage::Approved,
        Stage::Done,
        Stage::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Incoming => "incoming",
            Stage::Planned => "planned",
            Stage::PendingApproval => "pending_approval",
            Stage::Approved => "approved",
            Stage::Done => "done",
            Stage::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
pub struct WorkItemId(pub Uuid);

impl WorkItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Action family, set explicitly at creation. Execution dispatch keys off
/// this tag rather than inspecting payload text.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    Payment,
    Notification,
    Publish,
    Generic,
}

/// Structured metadata carried alongside the free-text body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ItemHeader {
    pub source: String,
    pub priority: Priority,
    pub subject: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

/// A unit of pending action flowing through the orchestration stages.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub kind: WorkItemKind,
    pub header: ItemHeader,
    pub body: String,
    /// Derived step list, attached when the orchestrator plans the item.
    pub plan: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_transition_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(kind: WorkItemKind, header: ItemHeader, body: &str) -> Self {
        let now = Utc::now();
        Self {
            id: WorkItemId::new(),
            kind,
            header,
            body: body.to_string(),
            plan: None,
            created_at: now,
            last_transition_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_transition_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_round_trip() {
        for stage in Stage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            let back: Stage = serde_json::from_str(&json).unwrap();
            assert_eq!(back, stage);
        }
    }

    #[test]
    fn test_item_ids_are_unique() {
        let header = ItemHeader {
            source: "email".to_string(),
            priority: Priority::Normal,
            subject: "invoice".to_string(),
        };
        let a = WorkItem::new(WorkItemKind::Generic, header.clone(), "body");
        let b = WorkItem::new(WorkItemKind::Generic, header, "body");
        assert_ne!(a.id, b.id);
    }
}
