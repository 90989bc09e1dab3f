//! Budgetly ledger engine.
//!
//! The engine keeps the authoritative list of transactions in memory, applies
//! every change through [`ledger::reduce`], derives totals on demand, and
//! mirrors the state to a key-value [`Gateway`] through a background
//! [`Persister`].
//!
//! ```rust,no_run
//! use engine::{Budget, MemoryGateway, TransactionDraft, TransactionKind};
//!
//! # async fn demo() -> Result<(), engine::LedgerError> {
//! let mut budget = Budget::builder().open(MemoryGateway::new()).await?;
//! budget.record(
//!     TransactionDraft {
//!         description: "Coffee".to_string(),
//!         amount: "4.50".to_string(),
//!         category: "Food".to_string(),
//!         kind: TransactionKind::Expense,
//!         is_recurring: false,
//!     },
//!     chrono::Local::now().date_naive(),
//! )?;
//! println!("{}", budget.ledger.selected_currency().format(budget.ledger.summary().balance));
//! budget.close().await?;
//! # Ok(())
//! # }
//! ```

pub use aggregation::{CategoryFilter, Summary};
pub use budget::{Budget, BudgetBuilder};
pub use categories::{CategoryRegistry, DEFAULT_CATEGORIES};
pub use currency::{Currency, CurrencyInfo, CurrencyOption, Grouping, SymbolPosition};
pub use error::{GatewayError, LedgerError};
pub use gateway::{Gateway, JsonFileGateway, MemoryGateway, SqliteGateway, keys};
pub use ledger::{Effect, Intent, Ledger, LedgerState, Outcome, Reduction};
pub use money::Money;
pub use persister::{PersistOptions, Persister};
pub use preferences::{Language, Preferences, ThemeMode};
pub use transactions::{Transaction, TransactionDraft, TransactionId, TransactionKind};

pub mod aggregation;
mod budget;
mod categories;
pub mod currency;
mod error;
pub mod gateway;
pub mod ledger;
mod money;
mod persister;
mod preferences;
mod transactions;
