use crate::domain::ledger::{Ledger, LedgerEntry, ProcessingLogEntry};
use crate::domain::payment::PaymentRequest;
use crate::domain::ports::{
    LedgerStore, PaymentStore, ProcessingLogStore, WorkItemQueue,
};
use crate::domain::work_item::{Stage, WorkItem, WorkItemId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory payment store.
///
/// Keyed by the monotonically increasing payment id, so iteration order is
/// insertion order.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<BTreeMap<u64, PaymentRequest>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn store(&self, payment: PaymentRequest) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Option<PaymentRequest>> {
        let payments = self.payments.read().await;
        Ok(payments.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<PaymentRequest>> {
        let payments = self.payments.read().await;
        Ok(payments.values().cloned().collect())
    }

    async fn count(&self) -> Result<u64> {
        let payments = self.payments.read().await;
        Ok(payments.len() as u64)
    }
}

/// In-memory ledger. The write lock is the single-writer discipline: the
/// read-modify-write of the running total happens under exclusive access.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry> {
        let mut ledger = self.ledger.write().await;
        Ok(ledger.append(entry).clone())
    }

    async fn load(&self) -> Result<Ledger> {
        let ledger = self.ledger.read().await;
        Ok(ledger.clone())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryProcessingLog {
    entries: Arc<RwLock<Vec<ProcessingLogEntry>>>,
}

impl InMemoryProcessingLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcessingLogStore for InMemoryProcessingLog {
    async fn append(&self, entry: ProcessingLogEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ProcessingLogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }
}

/// In-memory stage mailboxes behind a single lock.
///
/// Holding the one write lock across the remove-and-insert makes `try_move`
/// atomic by construction: no reader of either stage can observe the item in
/// both places or in neither.
#[derive(Clone)]
pub struct InMemoryQueue {
    stages: Arc<RwLock<HashMap<Stage, HashMap<WorkItemId, WorkItem>>>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        let mut stages = HashMap::new();
        for stage in Stage::ALL {
            stages.insert(stage, HashMap::new());
        }
        Self {
            stages: Arc::new(RwLock::new(stages)),
        }
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkItemQueue for InMemoryQueue {
    async fn put(&self, stage: Stage, item: WorkItem) -> Result<()> {
        let mut stages = self.stages.write().await;
        stages.entry(stage).or_default().insert(item.id, item);
        Ok(())
    }

    async fn get(&self, stage: Stage, id: WorkItemId) -> Result<Option<WorkItem>> {
        let stages = self.stages.read().await;
        Ok(stages.get(&stage).and_then(|m| m.get(&id)).cloned())
    }

    async fn list(&self, stage: Stage) -> Result<Vec<WorkItem>> {
        let stages = self.stages.read().await;
        Ok(stages
            .get(&stage)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn counts(&self) -> Result<HashMap<Stage, usize>> {
        let stages = self.stages.read().await;
        Ok(stages.iter().map(|(s, m)| (*s, m.len())).collect())
    }

    async fn try_move(&self, id: WorkItemId, from: Stage, to: Stage) -> Result<bool> {
        let mut stages = self.stages.write().await;
        let Some(mut item) = stages.get_mut(&from).and_then(|m| m.remove(&id)) else {
            return Ok(false);
        };
        item.touch();
        stages.entry(to).or_default().insert(id, item);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Amount;
    use crate::domain::work_item::{ItemHeader, Priority, WorkItemKind};
    use rust_decimal_macros::dec;

    fn item() -> WorkItem {
        WorkItem::new(
            WorkItemKind::Generic,
            ItemHeader {
                source: "test".to_string(),
                priority: Priority::Normal,
                subject: "subject".to_string(),
            },
            "body",
        )
    }

    #[tokio::test]
    async fn test_payment_store_round_trip() {
        let store = InMemoryPaymentStore::new();
        let payment = PaymentRequest::new(
            1,
            Amount::new(dec!(250.00)).unwrap(),
            "Vendor",
            "desc",
            "Alice",
        )
        .unwrap();

        store.store(payment.clone()).await.unwrap();
        assert_eq!(store.get(1).await.unwrap().unwrap(), payment);
        assert!(store.get(2).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_queue_move_between_stages() {
        let queue = InMemoryQueue::new();
        let work = item();
        let id = work.id;

        queue.put(Stage::Incoming, work).await.unwrap();
        assert!(queue.try_move(id, Stage::Incoming, Stage::Done).await.unwrap());
        assert!(queue.get(Stage::Incoming, id).await.unwrap().is_none());
        assert!(queue.get(Stage::Done, id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_move_of_absent_item_is_noop() {
        let queue = InMemoryQueue::new();
        let id = WorkItemId::new();
        assert!(!queue.try_move(id, Stage::Incoming, Stage::Done).await.unwrap());
    }
}
