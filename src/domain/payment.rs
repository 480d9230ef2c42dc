use crate::error::WorkflowError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a positive monetary amount for payment requests.
///
/// Wrapper around `rust_decimal::Decimal` that enforces positivity at
/// construction, so downstream code never re-validates.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, WorkflowError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(WorkflowError::Validation(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WorkflowError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl PaymentStatus {
    /// Rejected and Paid admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Rejected | PaymentStatus::Paid)
    }
}

/// A single payment request flowing through submit → approve/reject → paid.
///
/// Records are never deleted; every transition leaves its trace in the
/// corresponding timestamp/field so the full history remains auditable.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentRequest {
    pub id: u64,
    pub amount: Amount,
    pub vendor: String,
    pub description: String,
    pub requester: String,
    pub status: PaymentStatus,
    pub submitted_at: DateTime<Utc>,
    pub approver: Option<String>,
    pub approval_timestamp: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub processed_timestamp: Option<DateTime<Utc>>,
}

impl PaymentRequest {
    /// Validates the free-text fields and builds a pending request.
    pub fn new(
        id: u64,
        amount: Amount,
        vendor: &str,
        description: &str,
        requester: &str,
    ) -> Result<Self, WorkflowError> {
        for (field, value) in [
            ("vendor", vendor),
            ("description", description),
            ("requester", requester),
        ] {
            if value.trim().is_empty() {
                return Err(WorkflowError::Validation(format!(
                    "{field} must not be empty"
                )));
            }
        }

        Ok(Self {
            id,
            amount,
            vendor: vendor.to_string(),
            description: description.to_string(),
            requester: requester.to_string(),
            status: PaymentStatus::Pending,
            submitted_at: Utc::now(),
            approver: None,
            approval_timestamp: None,
            rejection_reason: None,
            processed_timestamp: None,
        })
    }

    fn ensure_pending(&self) -> Result<(), WorkflowError> {
        if self.status != PaymentStatus::Pending {
            return Err(WorkflowError::StateConflict(format!(
                "payment #{} is {:?}, expected pending",
                self.id, self.status
            )));
        }
        Ok(())
    }

    /// Verifies the pending precondition and commits the approval in one step.
    pub fn approve(&mut self, approver: &str) -> Result<(), WorkflowError> {
        self.ensure_pending()?;
        self.status = PaymentStatus::Approved;
        self.approver = Some(approver.to_string());
        self.approval_timestamp = Some(Utc::now());
        Ok(())
    }

    /// Verifies the pending precondition and commits the rejection. Terminal.
    pub fn reject(&mut self, approver: &str, reason: &str) -> Result<(), WorkflowError> {
        self.ensure_pending()?;
        self.status = PaymentStatus::Rejected;
        self.approver = Some(approver.to_string());
        self.rejection_reason = Some(reason.to_string());
        self.approval_timestamp = Some(Utc::now());
        Ok(())
    }

    /// Marks an approved request as paid. Only reachable from Approved.
    pub fn mark_paid(&mut self) -> Result<(), WorkflowError> {
        if self.status != PaymentStatus::Approved {
            return Err(WorkflowError::StateConflict(format!(
                "payment #{} is {:?}, expected approved",
                self.id, self.status
            )));
        }
        self.status = PaymentStatus::Paid;
        self.processed_timestamp = Some(Utc::now());
        Ok(())
    }
}
