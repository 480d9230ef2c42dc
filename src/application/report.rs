use crate::domain::payment::{PaymentRequest, PaymentStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Condensed view of one payment for report listings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PaymentSummary {
    pub id: u64,
    pub amount: Decimal,
    pub vendor: String,
    pub status: PaymentStatus,
    pub requester: String,
    pub submitted_at: DateTime<Utc>,
}

impl From<&PaymentRequest> for PaymentSummary {
    fn from(payment: &PaymentRequest) -> Self {
        Self {
            id: payment.id,
            amount: payment.amount.value(),
            vendor: payment.vendor.clone(),
            status: payment.status,
            requester: payment.requester.clone(),
            submitted_at: payment.submitted_at,
        }
    }
}

/// Aggregate view over the payment history, built read-only on demand.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkflowReport {
    pub generated_at: DateTime<Utc>,
    pub total_payments: usize,
    pub by_status: HashMap<String, usize>,
    pub total_amount_processed: Decimal,
    pub recent_payments: Vec<PaymentSummary>,
    pub completion_rate: f64,
}

impl WorkflowReport {
    pub fn build(payments: &[PaymentRequest]) -> Self {
        let mut by_status: HashMap<String, usize> = HashMap::new();
        let mut total_amount_processed = Decimal::ZERO;

        for payment in payments {
            let key = match payment.status {
                PaymentStatus::Pending => "pending",
                PaymentStatus::Approved => "approved",
                PaymentStatus::Rejected => "rejected",
                PaymentStatus::Paid => "paid",
            };
            *by_status.entry(key.to_string()).or_default() += 1;

            if matches!(
                payment.status,
                PaymentStatus::Approved | PaymentStatus::Paid
            ) {
                total_amount_processed += payment.amount.value();
            }
        }

        let mut recent: Vec<&PaymentRequest> = payments.iter().collect();
        recent.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        let recent_payments = recent.iter().take(5).map(|p| PaymentSummary::from(*p)).collect();

        let completion_rate = if payments.is_empty() {
            0.0
        } else {
            let paid = by_status.get("paid").copied().unwrap_or(0);
            (paid as f64 / payments.len() as f64) * 100.0
        };

        Self {
            generated_at: Utc::now(),
            total_payments: payments.len(),
            by_status,
            total_amount_processed,
            recent_payments,
            completion_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Amount;
    use rust_decimal_macros::dec;

    fn payment(id: u64, amount: Decimal) -> PaymentRequest {
        PaymentRequest::new(
            id,
            Amount::new(amount).unwrap(),
            "Vendor",
            "desc",
            "Alice",
        )
        .unwrap()
    }

    #[test]
    fn test_empty_history() {
        let report = WorkflowReport::build(&[]);
        assert_eq!(report.total_payments, 0);
        assert_eq!(report.completion_rate, 0.0);
        assert_eq!(report.total_amount_processed, Decimal::ZERO);
    }

    #[test]
    fn test_report_counts_and_amounts() {
        let mut paid = payment(1, dec!(250.00));
        paid.approve("Bob").unwrap();
        paid.mark_paid().unwrap();
        let pending = payment(2, dec!(100.00));
        let mut rejected = payment(3, dec!(50.00));
        rejected.reject("Bob", "no").unwrap();

        let report = WorkflowReport::build(&[paid, pending, rejected]);
        assert_eq!(report.total_payments, 3);
        assert_eq!(report.by_status["paid"], 1);
        assert_eq!(report.by_status["pending"], 1);
        assert_eq!(report.by_status["rejected"], 1);
        assert_eq!(report.total_amount_processed, dec!(250.00));
        assert!((report.completion_rate - 33.33).abs() < 0.5);
    }

    #[test]
    fn test_recent_is_capped_at_five() {
        let payments: Vec<PaymentRequest> =
            (1..=8).map(|id| payment(id, dec!(10.00))).collect();
        let report = WorkflowReport::build(&payments);
        assert_eq!(report.recent_payments.len(), 5);
    }
}
