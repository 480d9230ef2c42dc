use crate::domain::payment::{Amount, PaymentRequest, PaymentStatus};
use crate::domain::ports::PaymentStoreRef;
use crate::error::{Result, WorkflowError};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

/// Coordinator for the payment request lifecycle:
/// submit → approve/reject → paid.
///
/// All mutating calls are serialized through one internal mutex so that id
/// assignment and status transitions are check-then-set atomic even with
/// concurrent callers. Approval and payment execution are one business
/// transaction: callers never observe an approved-but-unpaid request.
pub struct PaymentWorkflow {
    store: PaymentStoreRef,
    write_lock: Mutex<()>,
}

impl PaymentWorkflow {
    pub fn new(store: PaymentStoreRef) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn submit(
        &self,
        amount: Decimal,
        vendor: &str,
        description: &str,
        requester: &str,
    ) -> Result<PaymentRequest> {
        let amount = Amount::new(amount)?;

        let _guard = self.write_lock.lock().await;
        let id = self.store.count().await? + 1;
        let payment = PaymentRequest::new(id, amount, vendor, description, requester)?;
        self.store.store(payment.clone()).await?;

        tracing::info!(
            payment_id = payment.id,
            vendor = %payment.vendor,
            amount = %payment.amount.value(),
            "payment request submitted"
        );
        Ok(payment)
    }

    /// Approves a pending request and synchronously executes the payment.
    /// The record is persisted once, already in its Paid state, so a
    /// persistence failure leaves the request untouched at Pending.
    pub async fn approve(&self, id: u64, approver: &str) -> Result<PaymentRequest> {
        let _guard = self.write_lock.lock().await;
        let mut payment = self.fetch(id).await?;
        payment.approve(approver)?;
        payment.mark_paid()?;
        self.store.store(payment.clone()).await?;

        tracing::info!(
            payment_id = id,
            approver,
            amount = %payment.amount.value(),
            "payment approved and processed"
        );
        Ok(payment)
    }

    pub async fn reject(&self, id: u64, approver: &str, reason: &str) -> Result<PaymentRequest> {
        let _guard = self.write_lock.lock().await;
        let mut payment = self.fetch(id).await?;
        payment.reject(approver, reason)?;
        self.store.store(payment.clone()).await?;

        tracing::info!(payment_id = id, approver, reason, "payment rejected");
        Ok(payment)
    }

    pub async fn history(&self) -> Result<Vec<PaymentRequest>> {
        self.store.get_all().await
    }

    pub async fn pending(&self) -> Result<Vec<PaymentRequest>> {
        let all = self.store.get_all().await?;
        Ok(all
            .into_iter()
            .filter(|p| p.status == PaymentStatus::Pending)
            .collect())
    }

    pub async fn get(&self, id: u64) -> Result<PaymentRequest> {
        self.fetch(id).await
    }

    async fn fetch(&self, id: u64) -> Result<PaymentRequest> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound(format!("payment #{id}")))
    }
}
