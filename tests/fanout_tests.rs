mod common;

use common::{RecordingSink, StubReceiptGenerator};
use opsflow::application::fanout::{FanoutOutcome, PostApprovalFanout};
use opsflow::application::payments::PaymentWorkflow;
use opsflow::domain::ledger::FanoutAction;
use opsflow::domain::ports::{LedgerStore, PaymentStoreRef, ProcessingLogStore};
use opsflow::error::WorkflowError;
use opsflow::infrastructure::in_memory::{
    InMemoryLedgerStore, InMemoryPaymentStore, InMemoryProcessingLog,
};
use rust_decimal_macros::dec;
use std::sync::Arc;

struct Fixture {
    fanout: PostApprovalFanout,
    ledger: Arc<InMemoryLedgerStore>,
    log: Arc<InMemoryProcessingLog>,
    paid_id: u64,
}

async fn paid_payment(sink: RecordingSink, receipts: StubReceiptGenerator) -> Fixture {
    let payments: PaymentStoreRef = Arc::new(InMemoryPaymentStore::new());
    let ledger = Arc::new(InMemoryLedgerStore::new());
    let log = Arc::new(InMemoryProcessingLog::new());

    let workflow = PaymentWorkflow::new(Arc::clone(&payments));
    let payment = workflow
        .submit(dec!(250.00), "Vendor X", "Annual license", "Alice")
        .await
        .unwrap();
    workflow.approve(payment.id, "Bob").await.unwrap();

    let fanout = PostApprovalFanout::new(
        payments,
        ledger.clone(),
        log.clone(),
        Arc::new(sink),
        Arc::new(receipts),
    );
    Fixture {
        fanout,
        ledger,
        log,
        paid_id: payment.id,
    }
}

#[tokio::test]
async fn test_all_tasks_complete() {
    let fx = paid_payment(RecordingSink::default(), StubReceiptGenerator::default()).await;
    let report = fx.fanout.run(fx.paid_id).await.unwrap();

    assert_eq!(report.outcome, FanoutOutcome::Completed);
    assert_eq!(report.tasks_completed.len(), 4);
    assert!(report.tasks_failed.is_empty());
    assert_eq!(report.receipt_ref.as_deref(), Some("REC-1-0"));
}

#[tokio::test]
async fn test_vendor_notification_failure_is_partial_success() {
    // The sink refuses delivery to the vendor but still reaches the
    // requester and approver.
    let fx = paid_payment(
        RecordingSink::failing_for("Vendor X"),
        StubReceiptGenerator::default(),
    )
    .await;
    let report = fx.fanout.run(fx.paid_id).await.unwrap();

    assert_eq!(report.outcome, FanoutOutcome::PartialSuccess);
    assert_eq!(report.tasks_completed.len(), 3);
    assert_eq!(report.tasks_failed, vec![FanoutAction::VendorNotification]);
}

#[tokio::test]
async fn test_receipt_failure_does_not_stop_remaining_tasks() {
    let fx = paid_payment(
        RecordingSink::default(),
        StubReceiptGenerator { fail: true },
    )
    .await;
    let report = fx.fanout.run(fx.paid_id).await.unwrap();

    assert_eq!(report.outcome, FanoutOutcome::PartialSuccess);
    assert_eq!(report.tasks_failed, vec![FanoutAction::ReceiptGeneration]);
    assert!(report.receipt_ref.is_none());
    // Ledger append still happened.
    assert_eq!(fx.ledger.load().await.unwrap().transactions.len(), 1);
}

#[tokio::test]
async fn test_rerun_does_not_double_post_ledger() {
    let fx = paid_payment(RecordingSink::default(), StubReceiptGenerator::default()).await;
    fx.fanout.run(fx.paid_id).await.unwrap();
    fx.fanout.run(fx.paid_id).await.unwrap();

    let ledger = fx.ledger.load().await.unwrap();
    assert_eq!(ledger.transactions.len(), 1);
    assert_eq!(ledger.total_expense, dec!(250.00));
}

#[tokio::test]
async fn test_every_attempt_is_audited() {
    let fx = paid_payment(
        RecordingSink::failing_for("Vendor X"),
        StubReceiptGenerator::default(),
    )
    .await;
    fx.fanout.run(fx.paid_id).await.unwrap();

    // Four task entries plus the overall processing record.
    let entries = fx.log.recent(10).await.unwrap();
    assert_eq!(entries.len(), 5);
    let overall = entries
        .iter()
        .find(|e| e.action == FanoutAction::PostApprovalProcessing)
        .unwrap();
    assert_eq!(overall.status, "partial_success");
    let vendor = entries
        .iter()
        .find(|e| e.action == FanoutAction::VendorNotification)
        .unwrap();
    assert_eq!(vendor.status, "failed");
}

#[tokio::test]
async fn test_fanout_preconditions() {
    let payments: PaymentStoreRef = Arc::new(InMemoryPaymentStore::new());
    let workflow = PaymentWorkflow::new(Arc::clone(&payments));
    let pending = workflow
        .submit(dec!(10.00), "Vendor", "desc", "Alice")
        .await
        .unwrap();

    let fanout = PostApprovalFanout::new(
        payments,
        Arc::new(InMemoryLedgerStore::new()),
        Arc::new(InMemoryProcessingLog::new()),
        Arc::new(RecordingSink::default()),
        Arc::new(StubReceiptGenerator::default()),
    );

    assert!(matches!(
        fanout.run(999).await,
        Err(WorkflowError::NotFound(_))
    ));
    assert!(matches!(
        fanout.run(pending.id).await,
        Err(WorkflowError::StateConflict(_))
    ));
}
