use crate::domain::ledger::{FanoutAction, LedgerEntry, ProcessingLogEntry};
use crate::domain::payment::{PaymentRequest, PaymentStatus};
use crate::domain::ports::{
    LedgerStoreRef, NotificationSinkRef, PaymentStoreRef, ProcessingLogRef, ReceiptGeneratorRef,
};
use crate::error::{Result, WorkflowError};
use serde::{Deserialize, Serialize};

pub const LEDGER_CATEGORY: &str = "software_subscription";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FanoutOutcome {
    Completed,
    PartialSuccess,
}

/// Result shape returned to the caller: the per-task completed/failed split
/// rather than a binary success flag.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FanoutReport {
    pub payment_id: u64,
    pub tasks_completed: Vec<FanoutAction>,
    pub tasks_failed: Vec<FanoutAction>,
    pub receipt_ref: Option<String>,
    pub outcome: FanoutOutcome,
}

/// Executes the fixed set of post-approval side effects for a paid payment,
/// tolerating per-task failure.
///
/// Only structural preconditions (unknown id, wrong status) are hard errors;
/// a collaborator failure marks its task failed and the batch continues.
/// Every attempt lands in the processing log, write-once.
pub struct PostApprovalFanout {
    payments: PaymentStoreRef,
    ledger: LedgerStoreRef,
    log: ProcessingLogRef,
    notifications: NotificationSinkRef,
    receipts: ReceiptGeneratorRef,
}

impl PostApprovalFanout {
    pub fn new(
        payments: PaymentStoreRef,
        ledger: LedgerStoreRef,
        log: ProcessingLogRef,
        notifications: NotificationSinkRef,
        receipts: ReceiptGeneratorRef,
    ) -> Self {
        Self {
            payments,
            ledger,
            log,
            notifications,
            receipts,
        }
    }

    pub async fn run(&self, payment_id: u64) -> Result<FanoutReport> {
        let payment = self
            .payments
            .get(payment_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("payment #{payment_id}")))?;

        if payment.status != PaymentStatus::Paid {
            return Err(WorkflowError::StateConflict(
                "payment not in paid status".to_string(),
            ));
        }

        let mut report = FanoutReport {
            payment_id,
            tasks_completed: Vec::new(),
            tasks_failed: Vec::new(),
            receipt_ref: None,
            outcome: FanoutOutcome::Completed,
        };

        self.record(
            &mut report,
            FanoutAction::VendorNotification,
            self.notify_vendor(&payment).await,
        )
        .await?;

        match self.receipts.generate(&payment).await {
            Ok(receipt_ref) => {
                report.receipt_ref = Some(receipt_ref);
                self.record(&mut report, FanoutAction::ReceiptGeneration, Ok(()))
                    .await?;
            }
            Err(err) => {
                self.record(&mut report, FanoutAction::ReceiptGeneration, Err(err))
                    .await?;
            }
        }

        self.record(
            &mut report,
            FanoutAction::AccountingUpdate,
            self.update_ledger(&payment).await,
        )
        .await?;

        self.record(
            &mut report,
            FanoutAction::InternalNotification,
            self.send_internal_notification(&payment).await,
        )
        .await?;

        if !report.tasks_failed.is_empty() {
            report.outcome = FanoutOutcome::PartialSuccess;
        }

        let status = match report.outcome {
            FanoutOutcome::Completed => "completed",
            FanoutOutcome::PartialSuccess => "partial_success",
        };
        self.log
            .append(ProcessingLogEntry::new(
                payment_id,
                FanoutAction::PostApprovalProcessing,
                status,
            ))
            .await?;

        tracing::info!(
            payment_id,
            completed = report.tasks_completed.len(),
            failed = report.tasks_failed.len(),
            status,
            "post-approval processing finished"
        );
        Ok(report)
    }

    /// Books the task outcome into both the report and the processing log.
    /// Collaborator failures are contained here; store failures propagate.
    async fn record(
        &self,
        report: &mut FanoutReport,
        action: FanoutAction,
        result: Result<()>,
    ) -> Result<()> {
        let status = match &result {
            Ok(()) => {
                report.tasks_completed.push(action);
                "completed"
            }
            Err(err) => {
                tracing::warn!(
                    payment_id = report.payment_id,
                    action = action.as_str(),
                    error = %err,
                    "fanout task failed"
                );
                report.tasks_failed.push(action);
                "failed"
            }
        };
        self.log
            .append(ProcessingLogEntry::new(report.payment_id, action, status))
            .await
    }

    async fn notify_vendor(&self, payment: &PaymentRequest) -> Result<()> {
        self.notifications
            .notify(
                &payment.vendor,
                &format!("Payment #{} processed", payment.id),
                &format!(
                    "Payment of ${} for \"{}\" has been processed.",
                    payment.amount.value(),
                    payment.description
                ),
            )
            .await
    }

    async fn update_ledger(&self, payment: &PaymentRequest) -> Result<()> {
        let entry = LedgerEntry::new(
            payment.id,
            payment.amount.value(),
            &payment.vendor,
            LEDGER_CATEGORY,
        );
        // The store enforces uniqueness on payment_id, so a re-run of the
        // fanout cannot double-post.
        self.ledger.append(entry).await?;
        Ok(())
    }

    async fn send_internal_notification(&self, payment: &PaymentRequest) -> Result<()> {
        let subject = format!(
            "Payment #{} completed: ${} to {}",
            payment.id,
            payment.amount.value(),
            payment.vendor
        );
        let body = format!("Requested by {}.", payment.requester);
        self.notifications
            .notify(&payment.requester, &subject, &body)
            .await?;
        if let Some(approver) = &payment.approver {
            self.notifications.notify(approver, &subject, &body).await?;
        }
        Ok(())
    }
}
