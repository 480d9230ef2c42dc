use crate::domain::ledger::{Ledger, LedgerEntry, ProcessingLogEntry};
use crate::domain::payment::PaymentRequest;
use crate::domain::ports::{LedgerStore, PaymentStore, ProcessingLogStore, WorkItemQueue};
use crate::domain::work_item::{Stage, WorkItem, WorkItemId};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Writes the document to a sibling temp file, then renames it into place.
/// A crash mid-write leaves the previous version intact.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Payment history persisted as an ordered JSON array.
///
/// The internal mutex serializes every read-modify-write so concurrent
/// stores cannot interleave between load and save.
pub struct FilePaymentStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePaymentStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("payment_log.json"),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl PaymentStore for FilePaymentStore {
    async fn store(&self, payment: PaymentRequest) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut payments: Vec<PaymentRequest> = read_json_or_default(&self.path)?;
        match payments.iter_mut().find(|p| p.id == payment.id) {
            Some(existing) => *existing = payment,
            None => payments.push(payment),
        }
        write_json_atomic(&self.path, &payments)
    }

    async fn get(&self, id: u64) -> Result<Option<PaymentRequest>> {
        let _guard = self.lock.lock().await;
        let payments: Vec<PaymentRequest> = read_json_or_default(&self.path)?;
        Ok(payments.into_iter().find(|p| p.id == id))
    }

    async fn get_all(&self) -> Result<Vec<PaymentRequest>> {
        let _guard = self.lock.lock().await;
        read_json_or_default(&self.path)
    }

    async fn count(&self) -> Result<u64> {
        let _guard = self.lock.lock().await;
        let payments: Vec<PaymentRequest> = read_json_or_default(&self.path)?;
        Ok(payments.len() as u64)
    }
}

/// Ledger file shaped as `{ "transactions": [...], "total_expense": n }`.
pub struct FileLedgerStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLedgerStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("accounting_ledger.json"),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl LedgerStore for FileLedgerStore {
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry> {
        let _guard = self.lock.lock().await;
        let mut ledger: Ledger = read_json_or_default(&self.path)?;
        let committed = ledger.append(entry).clone();
        write_json_atomic(&self.path, &ledger)?;
        Ok(committed)
    }

    async fn load(&self) -> Result<Ledger> {
        let _guard = self.lock.lock().await;
        read_json_or_default(&self.path)
    }
}

pub struct FileProcessingLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileProcessingLog {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("processing_log.json"),
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ProcessingLogStore for FileProcessingLog {
    async fn append(&self, entry: ProcessingLogEntry) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries: Vec<ProcessingLogEntry> = read_json_or_default(&self.path)?;
        entries.push(entry);
        write_json_atomic(&self.path, &entries)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<ProcessingLogEntry>> {
        let _guard = self.lock.lock().await;
        let entries: Vec<ProcessingLogEntry> = read_json_or_default(&self.path)?;
        Ok(entries.into_iter().rev().take(limit).collect())
    }
}

/// Durable stage mailboxes: one directory per stage, one JSON document per
/// item, and `fs::rename` as the atomic claim.
///
/// Rename within a filesystem either succeeds for exactly one caller or
/// fails with NotFound for the losers, which is precisely the `try_move`
/// contract.
pub struct FileQueue {
    root: PathBuf,
}

impl FileQueue {
    pub fn open(root: &Path) -> Result<Self> {
        for stage in Stage::ALL {
            fs::create_dir_all(root.join(stage.as_str()))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn item_path(&self, stage: Stage, id: WorkItemId) -> PathBuf {
        self.root.join(stage.as_str()).join(format!("{id}.json"))
    }
}

#[async_trait]
impl WorkItemQueue for FileQueue {
    async fn put(&self, stage: Stage, item: WorkItem) -> Result<()> {
        write_json_atomic(&self.item_path(stage, item.id), &item)
    }

    async fn get(&self, stage: Stage, id: WorkItemId) -> Result<Option<WorkItem>> {
        let path = self.item_path(stage, id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn list(&self, stage: Stage) -> Result<Vec<WorkItem>> {
        let mut items = Vec::new();
        for dir_entry in fs::read_dir(self.root.join(stage.as_str()))? {
            let path = dir_entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let bytes = fs::read(&path)?;
                items.push(serde_json::from_slice(&bytes)?);
            }
        }
        Ok(items)
    }

    async fn counts(&self) -> Result<HashMap<Stage, usize>> {
        let mut counts = HashMap::new();
        for stage in Stage::ALL {
            counts.insert(stage, self.list(stage).await?.len());
        }
        Ok(counts)
    }

    async fn try_move(&self, id: WorkItemId, from: Stage, to: Stage) -> Result<bool> {
        let source = self.item_path(from, id);
        let target = self.item_path(to, id);
        match fs::rename(&source, &target) {
            Ok(()) => {
                // We own the item now; refresh its transition timestamp.
                if let Some(mut item) = self.get(to, id).await? {
                    item.touch();
                    self.put(to, item).await?;
                }
                Ok(true)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
