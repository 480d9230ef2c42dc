use async_trait::async_trait;
use opsflow::domain::payment::PaymentRequest;
use opsflow::domain::ports::{NotificationSink, PublishBackend, ReceiptGenerator};
use opsflow::error::{Result, WorkflowError};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Notification sink that records deliveries and can be told to fail for
/// specific recipients.
#[derive(Default, Clone)]
pub struct RecordingSink {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub fail_recipients: Vec<String>,
}

impl RecordingSink {
    pub fn failing_for(recipient: &str) -> Self {
        Self {
            fail_recipients: vec![recipient.to_string()],
            ..Self::default()
        }
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, recipient: &str, subject: &str, _body: &str) -> Result<()> {
        if self.fail_recipients.iter().any(|r| r == recipient) {
            return Err(WorkflowError::Collaborator(format!(
                "delivery to {recipient} refused"
            )));
        }
        self.sent
            .lock()
            .await
            .push((recipient.to_string(), subject.to_string()));
        Ok(())
    }
}

/// Receipt generator returning a deterministic reference, optionally failing.
#[derive(Default, Clone)]
pub struct StubReceiptGenerator {
    pub fail: bool,
}

#[async_trait]
impl ReceiptGenerator for StubReceiptGenerator {
    async fn generate(&self, payment: &PaymentRequest) -> Result<String> {
        if self.fail {
            return Err(WorkflowError::Collaborator("printer on fire".to_string()));
        }
        Ok(format!("REC-{}-0", payment.id))
    }
}

#[derive(Default, Clone)]
pub struct RecordingPublisher {
    pub posts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PublishBackend for RecordingPublisher {
    async fn publish(&self, content: &str, _visibility: &str) -> Result<String> {
        let mut posts = self.posts.lock().await;
        posts.push(content.to_string());
        Ok(format!("post-{}", posts.len()))
    }
}
