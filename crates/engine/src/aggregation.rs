//! Derived views over a transaction list.
//!
//! Everything here is recomputed from the list on every call; there is no
//! cache to invalidate.

use std::collections::HashMap;

use serde::Serialize;

use crate::{Money, Transaction};

/// Which entries take part in a per-category breakdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    ExpensesOnly,
    IncomeOnly,
}

impl CategoryFilter {
    fn matches(self, tx: &Transaction) -> bool {
        match self {
            Self::All => true,
            Self::ExpensesOnly => tx.is_expense(),
            Self::IncomeOnly => tx.is_income(),
        }
    }
}

/// Balance, income and expense totals.
///
/// `expense` follows the signed convention (it is `<= 0`), so
/// `balance == income + expense` holds whenever no total left the `i64`
/// range. Totals that would overflow saturate at [`Money::MAX`] or
/// [`Money::MIN`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub balance: Money,
    pub income: Money,
    pub expense: Money,
}

impl Summary {
    pub fn of(list: &[Transaction]) -> Self {
        list.iter().fold(Summary::default(), |mut acc, tx| {
            acc.balance = accumulate(acc.balance, tx.amount);
            if tx.is_income() {
                acc.income = accumulate(acc.income, tx.amount);
            } else if tx.is_expense() {
                acc.expense = accumulate(acc.expense, tx.amount);
            }
            acc
        })
    }

    /// Expenses as a non-negative amount, for display.
    #[must_use]
    pub fn expense_magnitude(&self) -> Money {
        self.expense.abs()
    }
}

/// Adds `amount` to `total`, saturating instead of overflowing.
fn accumulate(total: Money, amount: Money) -> Money {
    total.checked_add(amount).unwrap_or_else(|| {
        tracing::warn!(%total, %amount, "total out of range, saturating");
        if amount.is_negative() {
            Money::MIN
        } else {
            Money::MAX
        }
    })
}

fn sum<'a>(list: impl Iterator<Item = &'a Transaction>) -> Money {
    list.fold(Money::ZERO, |total, tx| accumulate(total, tx.amount))
}

pub fn total_balance(list: &[Transaction]) -> Money {
    sum(list.iter())
}

pub fn total_income(list: &[Transaction]) -> Money {
    sum(list.iter().filter(|tx| tx.is_income()))
}

/// Sum of negative amounts. The result is negative (or zero).
pub fn total_expense(list: &[Transaction]) -> Money {
    sum(list.iter().filter(|tx| tx.is_expense()))
}

/// Per-category sums in first-seen order.
///
/// Categories are compared exactly (`Food` and `food` are two buckets). A
/// category stays in the result even when its matching entries net to zero.
pub fn by_category(list: &[Transaction], filter: CategoryFilter) -> Vec<(String, Money)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut buckets: Vec<(String, Money)> = Vec::new();

    for tx in list.iter().filter(|tx| filter.matches(tx)) {
        match index.get(tx.category.as_str()).copied() {
            Some(pos) => buckets[pos].1 = accumulate(buckets[pos].1, tx.amount),
            None => {
                index.insert(tx.category.as_str(), buckets.len());
                buckets.push((tx.category.clone(), tx.amount));
            }
        }
    }

    buckets
}

/// Up to `limit` transactions, newest (last inserted) first.
pub fn recent(list: &[Transaction], limit: usize) -> Vec<&Transaction> {
    list.iter().rev().take(limit).collect()
}
