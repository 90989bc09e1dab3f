//! The transaction ledger state machine.
//!
//! State changes go through [`reduce`], a pure function from the current
//! [`LedgerState`] and an [`Intent`] to the next state. [`Ledger`] owns the
//! state, enforces that nothing is mutated before the initial load, and hands
//! every change that needs to be persisted to the [`Persister`].

use std::sync::Arc;

use crate::{
    CategoryFilter, Currency, LedgerError, Money, Persister, Summary, Transaction, TransactionId,
    aggregation,
    gateway::{Gateway, keys, load_json, load_text},
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LedgerState {
    pub transactions: Vec<Transaction>,
    pub selected_currency: Currency,
    pub is_loaded: bool,
}

/// A request to change the ledger.
#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    /// Replace the whole list. Issued once, by the initial load.
    SetTransactions(Vec<Transaction>),
    AddTransaction(Transaction),
    /// Replace the transaction with the same id.
    UpdateTransaction(Transaction),
    DeleteTransaction(TransactionId),
    SetCurrency(Currency),
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetTransactions(_) => "set_transactions",
            Self::AddTransaction(_) => "add_transaction",
            Self::UpdateTransaction(_) => "update_transaction",
            Self::DeleteTransaction(_) => "delete_transaction",
            Self::SetCurrency(_) => "set_currency",
        }
    }
}

/// What a reduction did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The intent was valid but changed nothing.
    Unchanged,
    /// No transaction with the given id exists.
    NotFound,
}

/// Which stored value must be rewritten after a reduction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    PersistTransactions,
    PersistCurrency,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Reduction {
    pub state: LedgerState,
    pub outcome: Outcome,
    pub effect: Option<Effect>,
}

impl Reduction {
    fn applied(state: LedgerState, effect: Option<Effect>) -> Self {
        Self {
            state,
            outcome: Outcome::Applied,
            effect,
        }
    }

    fn untouched(state: LedgerState, outcome: Outcome) -> Self {
        Self {
            state,
            outcome,
            effect: None,
        }
    }
}

/// Applies `intent` to `state`.
///
/// No validation happens here: records are stored as given, duplicate ids
/// included.
pub fn reduce(mut state: LedgerState, intent: Intent) -> Reduction {
    match intent {
        Intent::SetTransactions(list) => {
            state.transactions = list;
            state.is_loaded = true;
            // The list came from storage; writing it back is pointless.
            Reduction::applied(state, None)
        }
        Intent::AddTransaction(tx) => {
            state.transactions.push(tx);
            Reduction::applied(state, Some(Effect::PersistTransactions))
        }
        Intent::UpdateTransaction(tx) => {
            match state.transactions.iter().position(|existing| existing.id == tx.id) {
                Some(pos) => {
                    state.transactions[pos] = tx;
                    Reduction::applied(state, Some(Effect::PersistTransactions))
                }
                None => Reduction::untouched(state, Outcome::NotFound),
            }
        }
        Intent::DeleteTransaction(id) => {
            let before = state.transactions.len();
            state.transactions.retain(|tx| tx.id != id);
            if state.transactions.len() == before {
                Reduction::untouched(state, Outcome::NotFound)
            } else {
                Reduction::applied(state, Some(Effect::PersistTransactions))
            }
        }
        Intent::SetCurrency(currency) => {
            if state.selected_currency == currency {
                Reduction::untouched(state, Outcome::Unchanged)
            } else {
                state.selected_currency = currency;
                Reduction::applied(state, Some(Effect::PersistCurrency))
            }
        }
    }
}

/// Owner of the ledger state.
///
/// Construct it with [`Ledger::new`], then run [`Ledger::load`] once before
/// dispatching anything else: until the load has completed every mutating
/// intent is rejected with [`LedgerError::NotLoaded`], so an empty default
/// state can never overwrite what is in storage.
#[derive(Debug)]
pub struct Ledger {
    state: LedgerState,
    persister: Arc<Persister>,
}

impl Ledger {
    pub fn new(persister: Arc<Persister>) -> Self {
        Self {
            state: LedgerState::default(),
            persister,
        }
    }

    /// Reads the stored transactions and currency (in parallel) and marks the
    /// ledger as loaded.
    ///
    /// Missing keys yield an empty list and the default currency. Storage
    /// failures and unreadable values are logged and treated the same way.
    pub async fn load<G: Gateway>(&mut self, gateway: &G) -> Result<(), LedgerError> {
        if self.state.is_loaded {
            return Err(LedgerError::AlreadyLoaded);
        }

        let (transactions, currency) = tokio::join!(
            load_json::<G, Vec<Transaction>>(gateway, keys::TRANSACTIONS),
            load_text(gateway, keys::SELECTED_CURRENCY),
        );

        let transactions = transactions.unwrap_or_else(|err| {
            tracing::warn!("loading transactions failed, starting empty: {err}");
            None
        });
        let currency = match currency {
            Ok(Some(code)) => Currency::from_code(&code).unwrap_or_else(|| {
                tracing::warn!(code = %code, "stored currency is not supported, using default");
                Currency::default()
            }),
            Ok(None) => Currency::default(),
            Err(err) => {
                tracing::warn!("loading currency failed, using default: {err}");
                Currency::default()
            }
        };

        self.state.selected_currency = currency;
        self.apply(Intent::SetTransactions(transactions.unwrap_or_default()));
        tracing::info!(
            transactions = self.state.transactions.len(),
            currency = currency.code(),
            "ledger loaded"
        );
        Ok(())
    }

    /// Applies an intent and schedules the resulting save.
    pub fn dispatch(&mut self, intent: Intent) -> Result<Outcome, LedgerError> {
        match (&intent, self.state.is_loaded) {
            (Intent::SetTransactions(_), true) => return Err(LedgerError::AlreadyLoaded),
            (Intent::SetTransactions(_), false) => {}
            (_, false) => return Err(LedgerError::NotLoaded),
            (_, true) => {}
        }
        Ok(self.apply(intent))
    }

    pub fn add(&mut self, tx: Transaction) -> Result<Outcome, LedgerError> {
        self.dispatch(Intent::AddTransaction(tx))
    }

    pub fn update(&mut self, tx: Transaction) -> Result<Outcome, LedgerError> {
        self.dispatch(Intent::UpdateTransaction(tx))
    }

    pub fn delete(&mut self, id: &TransactionId) -> Result<Outcome, LedgerError> {
        self.dispatch(Intent::DeleteTransaction(id.clone()))
    }

    /// Selects a display currency by code. Unknown codes leave the
    /// selection unchanged.
    pub fn select_currency(&mut self, code: &str) -> Result<Outcome, LedgerError> {
        if !self.state.is_loaded {
            return Err(LedgerError::NotLoaded);
        }
        match Currency::from_code(code) {
            Some(currency) => self.dispatch(Intent::SetCurrency(currency)),
            None => {
                tracing::warn!(code = %code, "ignoring unsupported currency");
                Ok(Outcome::Unchanged)
            }
        }
    }

    fn apply(&mut self, intent: Intent) -> Outcome {
        let name = intent.name();
        if let Intent::AddTransaction(tx) = &intent {
            if self.get(&tx.id).is_some() {
                tracing::warn!(id = %tx.id, "adding transaction with duplicate id");
            }
        }

        let state = std::mem::take(&mut self.state);
        let Reduction {
            state,
            outcome,
            effect,
        } = reduce(state, intent);
        self.state = state;
        tracing::debug!(intent = name, ?outcome, "reduced");

        match effect {
            Some(Effect::PersistTransactions) => self
                .persister
                .schedule_json(keys::TRANSACTIONS, &self.state.transactions),
            Some(Effect::PersistCurrency) => self
                .persister
                .schedule_json(keys::SELECTED_CURRENCY, &self.state.selected_currency),
            None => {}
        }
        outcome
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_loaded
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    pub fn selected_currency(&self) -> Currency {
        self.state.selected_currency
    }

    pub fn get(&self, id: &TransactionId) -> Option<&Transaction> {
        self.state.transactions.iter().find(|tx| &tx.id == id)
    }

    pub fn summary(&self) -> Summary {
        Summary::of(&self.state.transactions)
    }

    pub fn total_balance(&self) -> Money {
        aggregation::total_balance(&self.state.transactions)
    }

    pub fn by_category(&self, filter: CategoryFilter) -> Vec<(String, Money)> {
        aggregation::by_category(&self.state.transactions, filter)
    }

    pub fn recent(&self, limit: usize) -> Vec<&Transaction> {
        aggregation::recent(&self.state.transactions, limit)
    }

    /// Waits for pending saves of this ledger (and anything sharing its
    /// persister) to finish.
    pub async fn flush(&self) -> Result<(), LedgerError> {
        self.persister.flush().await
    }
}
