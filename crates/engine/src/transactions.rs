//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense entry. The direction is
//! carried by the sign of `amount`; `kind()` is derived from it and is written
//! to storage as the redundant `type` field.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, Money};

/// Ledger-unique transaction identifier.
///
/// New ids are time-ordered UUIDs (v7). Ids written by older clients (for
/// example millisecond timestamps) are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Kind implied by a signed amount. Zero counts as income.
    #[must_use]
    pub fn of(amount: Money) -> Self {
        if amount.is_negative() {
            Self::Expense
        } else {
            Self::Income
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TransactionRecord", into = "TransactionRecord")]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub category: String,
    pub is_recurring: bool,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        description: impl Into<String>,
        amount: Money,
        date: NaiveDate,
        category: impl Into<String>,
        is_recurring: bool,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            amount,
            date,
            category: category.into(),
            is_recurring,
        }
    }

    #[must_use]
    pub fn kind(&self) -> TransactionKind {
        TransactionKind::of(self.amount)
    }

    #[must_use]
    pub fn is_expense(&self) -> bool {
        self.amount.is_negative()
    }

    #[must_use]
    pub fn is_income(&self) -> bool {
        self.amount.is_positive()
    }
}

/// Stored shape of a transaction.
///
/// `type` is always recomputed from `amount` on read; `isRecurring` defaults
/// to `false` for records written before the flag existed.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRecord {
    id: TransactionId,
    description: String,
    amount: Money,
    date: NaiveDate,
    category: String,
    #[serde(default)]
    is_recurring: bool,
    #[serde(rename = "type", default, skip_deserializing)]
    kind: Option<TransactionKind>,
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        Self {
            id: record.id,
            description: record.description,
            amount: record.amount,
            date: record.date,
            category: record.category,
            is_recurring: record.is_recurring,
        }
    }
}

impl From<Transaction> for TransactionRecord {
    fn from(tx: Transaction) -> Self {
        let kind = Some(tx.kind());
        Self {
            id: tx.id,
            description: tx.description,
            amount: tx.amount,
            date: tx.date,
            category: tx.category,
            is_recurring: tx.is_recurring,
            kind,
        }
    }
}

/// Raw form input for a new or edited transaction.
///
/// The ledger never validates what it stores; this is where the presentation
/// layer turns user input into a well-formed [`Transaction`].
#[derive(Clone, Debug)]
pub struct TransactionDraft {
    pub description: String,
    /// Positive magnitude as typed by the user, e.g. `"4.50"`.
    pub amount: String,
    pub category: String,
    pub kind: TransactionKind,
    pub is_recurring: bool,
}

impl TransactionDraft {
    /// Validates the draft and creates a transaction with a fresh id dated
    /// `today`.
    pub fn build(self, today: NaiveDate) -> Result<Transaction, LedgerError> {
        self.into_transaction(TransactionId::generate(), today)
    }

    /// Validates the draft as a replacement for `existing`, keeping its id
    /// and date.
    pub fn rebuild(self, existing: &Transaction) -> Result<Transaction, LedgerError> {
        self.into_transaction(existing.id.clone(), existing.date)
    }

    fn into_transaction(
        self,
        id: TransactionId,
        date: NaiveDate,
    ) -> Result<Transaction, LedgerError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(LedgerError::InvalidDescription);
        }

        if self.amount.trim().is_empty() {
            return Err(LedgerError::InvalidAmount("amount is required".to_string()));
        }
        let magnitude: Money = self.amount.parse()?;
        if !magnitude.is_positive() {
            return Err(LedgerError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(LedgerError::InvalidCategory);
        }

        let amount = match self.kind {
            TransactionKind::Income => magnitude,
            TransactionKind::Expense => Money::new(-magnitude.cents()),
        };

        Ok(Transaction::new(
            id,
            description,
            amount,
            date,
            category,
            self.is_recurring,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn draft(description: &str, amount: &str, category: &str) -> TransactionDraft {
        TransactionDraft {
            description: description.to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
            kind: TransactionKind::Expense,
            is_recurring: false,
        }
    }

    #[test]
    fn draft_trims_and_signs_expenses() {
        let tx = draft("  Coffee ", "4.50", " Food ").build(today()).unwrap();
        assert_eq!(tx.description, "Coffee");
        assert_eq!(tx.category, "Food");
        assert_eq!(tx.amount, Money::new(-450));
        assert_eq!(tx.kind(), TransactionKind::Expense);
        assert_eq!(tx.date, today());
    }

    #[test]
    fn draft_rejects_missing_fields() {
        assert_eq!(
            draft("   ", "1", "Food").build(today()),
            Err(LedgerError::InvalidDescription)
        );
        assert_eq!(
            draft("Coffee", "1", "  ").build(today()),
            Err(LedgerError::InvalidCategory)
        );
        assert!(matches!(
            draft("Coffee", "", "Food").build(today()),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            draft("Coffee", "abc", "Food").build(today()),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn draft_rejects_non_positive_amounts() {
        assert!(draft("Coffee", "0", "Food").build(today()).is_err());
        assert!(draft("Coffee", "-3", "Food").build(today()).is_err());
    }

    #[test]
    fn rebuild_keeps_id_and_date() {
        let original = draft("Coffee", "4.50", "Food").build(today()).unwrap();
        let mut edit = draft("Tea", "3", "Food");
        edit.kind = TransactionKind::Income;
        let edited = edit.rebuild(&original).unwrap();
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.date, original.date);
        assert_eq!(edited.amount, Money::new(300));
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = TransactionId::generate();
        let b = TransactionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn serializes_with_derived_type() {
        let tx = Transaction::new(
            TransactionId::from("1700000000000"),
            "Coffee",
            Money::new(-450),
            today(),
            "Food",
            true,
        );
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "1700000000000",
                "description": "Coffee",
                "amount": -4.5,
                "date": "2024-03-01",
                "category": "Food",
                "isRecurring": true,
                "type": "expense",
            })
        );
    }

    #[test]
    fn reads_records_without_optional_fields() {
        let tx: Transaction = serde_json::from_str(
            r#"{"id":"1","description":"Salary","amount":2000,"date":"2024-03-01","category":"Income","type":"expense"}"#,
        )
        .unwrap();
        assert!(!tx.is_recurring);
        assert_eq!(tx.amount, Money::new(200_000));
        assert_eq!(tx.kind(), TransactionKind::Income);
    }
}
