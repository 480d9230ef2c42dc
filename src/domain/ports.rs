use crate::domain::ledger::{Ledger, LedgerEntry, ProcessingLogEntry};
use crate::domain::payment::PaymentRequest;
use crate::domain::work_item::{Stage, WorkItem, WorkItemId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub type PaymentStoreRef = Arc<dyn PaymentStore>;
pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type ProcessingLogRef = Arc<dyn ProcessingLogStore>;
pub type WorkItemQueueRef = Arc<dyn WorkItemQueue>;
pub type NotificationSinkRef = Arc<dyn NotificationSink>;
pub type ReceiptGeneratorRef = Arc<dyn ReceiptGenerator>;
pub type PublishBackendRef = Arc<dyn PublishBackend>;

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn store(&self, payment: PaymentRequest) -> Result<()>;
    async fn get(&self, id: u64) -> Result<Option<PaymentRequest>>;
    async fn get_all(&self) -> Result<Vec<PaymentRequest>>;
    async fn count(&self) -> Result<u64>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Appends under the store's single-writer discipline. Appending a second
    /// entry for the same `payment_id` must return the existing entry
    /// unchanged.
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry>;
    async fn load(&self) -> Result<Ledger>;
}

#[async_trait]
pub trait ProcessingLogStore: Send + Sync {
    async fn append(&self, entry: ProcessingLogEntry) -> Result<()>;
    async fn recent(&self, limit: usize) -> Result<Vec<ProcessingLogEntry>>;
}

/// A set of named durable mailboxes, one per [`Stage`].
///
/// `try_move` is the sole ownership-transfer primitive: the item disappears
/// from `from` and appears in `to` as one indivisible step, and whichever
/// caller's move succeeds owns the item. A racing caller gets `false` and
/// must treat that as a no-op.
#[async_trait]
pub trait WorkItemQueue: Send + Sync {
    async fn put(&self, stage: Stage, item: WorkItem) -> Result<()>;
    async fn get(&self, stage: Stage, id: WorkItemId) -> Result<Option<WorkItem>>;
    async fn list(&self, stage: Stage) -> Result<Vec<WorkItem>>;
    async fn counts(&self) -> Result<HashMap<Stage, usize>>;
    async fn try_move(&self, id: WorkItemId, from: Stage, to: Stage) -> Result<bool>;
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

#[async_trait]
pub trait ReceiptGenerator: Send + Sync {
    /// Returns a reference to the produced receipt artifact.
    async fn generate(&self, payment: &PaymentRequest) -> Result<String>;
}

#[async_trait]
pub trait PublishBackend: Send + Sync {
    async fn publish(&self, content: &str, visibility: &str) -> Result<String>;
}

/// External discovery of new work items; the core never reaches out to the
/// originating medium directly.
#[async_trait]
pub trait WatcherSource: Send + Sync {
    async fn poll(&self) -> Result<Vec<WorkItem>>;
}
