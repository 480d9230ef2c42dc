use crate::domain::payment::PaymentRequest;
use crate::domain::ports::{NotificationSink, PublishBackend, ReceiptGenerator};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Notification backend that records deliveries in the log stream.
/// Stands in for the vendor email/chat integrations, which live outside
/// this crate.
#[derive(Default, Clone)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, recipient: &str, subject: &str, _body: &str) -> Result<()> {
        tracing::info!(recipient, subject, "notification sent");
        Ok(())
    }
}

/// Publish backend that only logs; real social/posting integrations plug in
/// behind the same port.
#[derive(Default, Clone)]
pub struct LogPublishBackend;

#[async_trait]
impl PublishBackend for LogPublishBackend {
    async fn publish(&self, _content: &str, visibility: &str) -> Result<String> {
        let post_ref = format!("post-{}", Uuid::new_v4());
        tracing::info!(post_ref, visibility, "content published");
        Ok(post_ref)
    }
}

#[derive(Serialize)]
struct ReceiptDocument<'a> {
    receipt_id: &'a str,
    payment_id: u64,
    amount: rust_decimal::Decimal,
    vendor: &'a str,
    description: &'a str,
    requester: &'a str,
    approver: Option<&'a str>,
    payment_date: Option<chrono::DateTime<Utc>>,
    status: &'a str,
}

/// Writes receipt artifacts as JSON documents under a receipts directory and
/// returns the `REC-{payment_id}-{epoch}` reference.
pub struct FileReceiptGenerator {
    dir: PathBuf,
}

impl FileReceiptGenerator {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }
}

#[async_trait]
impl ReceiptGenerator for FileReceiptGenerator {
    async fn generate(&self, payment: &PaymentRequest) -> Result<String> {
        let epoch = Utc::now().timestamp();
        let receipt_id = format!("REC-{}-{}", payment.id, epoch);
        let document = ReceiptDocument {
            receipt_id: &receipt_id,
            payment_id: payment.id,
            amount: payment.amount.value(),
            vendor: &payment.vendor,
            description: &payment.description,
            requester: &payment.requester,
            approver: payment.approver.as_deref(),
            payment_date: payment.processed_timestamp,
            status: "paid",
        };

        let path = self.dir.join(format!("receipt_{}_{}.json", payment.id, epoch));
        fs::write(&path, serde_json::to_vec_pretty(&document)?)?;
        tracing::info!(receipt_id, path = %path.display(), "receipt generated");
        Ok(receipt_id)
    }
}
