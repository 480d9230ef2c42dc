use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One posted accounting entry. Exactly one exists per paid payment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LedgerEntry {
    pub entry_id: String,
    pub payment_id: u64,
    pub amount: Decimal,
    pub vendor: String,
    pub category: String,
    pub date: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(payment_id: u64, amount: Decimal, vendor: &str, category: &str) -> Self {
        let now = Utc::now();
        Self {
            entry_id: format!("ACC-{}-{}", payment_id, now.timestamp()),
            payment_id,
            amount,
            vendor: vendor.to_string(),
            category: category.to_string(),
            date: now,
        }
    }
}

/// Append-only financial record with a maintained running total.
///
/// Invariant: `total_expense` always equals the sum of entry amounts. The
/// uniqueness check on `payment_id` makes retried appends safe.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Ledger {
    pub transactions: Vec<LedgerEntry>,
    pub total_expense: Decimal,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and bumps the running total. If an entry for the
    /// same `payment_id` already exists the call is a no-op and the existing
    /// entry is returned, so a retry after a partial failure cannot
    /// double-post.
    pub fn append(&mut self, entry: LedgerEntry) -> &LedgerEntry {
        if let Some(pos) = self
            .transactions
            .iter()
            .position(|e| e.payment_id == entry.payment_id)
        {
            return &self.transactions[pos];
        }
        self.total_expense += entry.amount;
        self.transactions.push(entry);
        self.transactions.last().expect("just pushed")
    }

    pub fn entry_for_payment(&self, payment_id: u64) -> Option<&LedgerEntry> {
        self.transactions
            .iter()
            .find(|e| e.payment_id == payment_id)
    }
}

/// Action families recorded in the post-approval processing log.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum FanoutAction {
    VendorNotification,
    ReceiptGeneration,
    AccountingUpdate,
    InternalNotification,
    PostApprovalProcessing,
}

impl FanoutAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FanoutAction::VendorNotification => "vendor_notification",
            FanoutAction::ReceiptGeneration => "receipt_generation",
            FanoutAction::AccountingUpdate => "accounting_update",
            FanoutAction::InternalNotification => "internal_notification",
            FanoutAction::PostApprovalProcessing => "post_approval_processing",
        }
    }
}

/// Write-once audit record for a single fanout task attempt.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ProcessingLogEntry {
    pub id: Uuid,
    pub payment_id: u64,
    pub action: FanoutAction,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

impl ProcessingLogEntry {
    pub fn new(payment_id: u64, action: FanoutAction, status: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            payment_id,
            action,
            timestamp: Utc::now(),
            status: status.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_append_updates_total() {
        let mut ledger = Ledger::new();
        ledger.append(LedgerEntry::new(1, dec!(250.00), "Vendor X", "software_subscription"));
        ledger.append(LedgerEntry::new(2, dec!(99.50), "Vendor Y", "software_subscription"));

        assert_eq!(ledger.transactions.len(), 2);
        assert_eq!(ledger.total_expense, dec!(349.50));
    }

    #[test]
    fn test_append_is_idempotent_per_payment() {
        let mut ledger = Ledger::new();
        ledger.append(LedgerEntry::new(1, dec!(250.00), "Vendor X", "software_subscription"));
        ledger.append(LedgerEntry::new(1, dec!(250.00), "Vendor X", "software_subscription"));

        assert_eq!(ledger.transactions.len(), 1);
        assert_eq!(ledger.total_expense, dec!(250.00));
    }

    #[test]
    fn test_total_matches_sum_of_entries() {
        let mut ledger = Ledger::new();
        for id in 1..=10u64 {
            ledger.append(LedgerEntry::new(id, dec!(10.25), "V", "software_subscription"));
        }
        let sum: Decimal = ledger.transactions.iter().map(|e| e.amount).sum();
        assert_eq!(ledger.total_expense, sum);
    }

    #[test]
    fn test_entry_id_format() {
        let entry = LedgerEntry::new(7, dec!(1.00), "V", "software_subscription");
        assert!(entry.entry_id.starts_with("ACC-7-"));
    }

    #[test]
    fn test_fanout_action_serializes_snake_case() {
        let json = serde_json::to_string(&FanoutAction::VendorNotification).unwrap();
        assert_eq!(json, "\"vendor_notification\"");
    }
}
