use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    CategoryRegistry, Language, Ledger, LedgerError, Outcome, PersistOptions, Persister,
    Preferences, Transaction, TransactionDraft, TransactionId, gateway::Gateway,
};

/// Everything a presentation layer works with, opened against one gateway.
///
/// There is no global instance: construct a `Budget` with [`Budget::open`]
/// and pass it (or its parts) by reference.
#[derive(Debug)]
pub struct Budget {
    pub ledger: Ledger,
    pub categories: CategoryRegistry,
    pub preferences: Preferences,
    persister: Arc<Persister>,
}

impl Budget {
    /// Return a builder for `Budget`.
    pub fn builder() -> BudgetBuilder {
        BudgetBuilder::default()
    }

    /// Loads ledger, categories and preferences in parallel.
    pub async fn open<G: Gateway>(gateway: G, options: PersistOptions) -> Result<Self, LedgerError> {
        let gateway = Arc::new(gateway);
        let persister = Arc::new(Persister::spawn(gateway.clone(), options));

        let mut ledger = Ledger::new(persister.clone());
        let (loaded, categories, preferences) = tokio::join!(
            ledger.load(gateway.as_ref()),
            CategoryRegistry::load(gateway.as_ref(), persister.clone()),
            Preferences::load(gateway.as_ref(), persister.clone()),
        );
        loaded?;

        Ok(Self {
            ledger,
            categories,
            preferences,
            persister,
        })
    }

    /// Validates `draft`, registers its category and appends it to the
    /// ledger.
    pub fn record(
        &mut self,
        draft: TransactionDraft,
        today: NaiveDate,
    ) -> Result<Transaction, LedgerError> {
        let tx = draft.build(today)?;
        self.categories.add(&tx.category)?;
        self.ledger.add(tx.clone())?;
        Ok(tx)
    }

    /// Replaces the transaction `id` with the validated `draft`, keeping the
    /// original id and date.
    pub fn amend(
        &mut self,
        id: &TransactionId,
        draft: TransactionDraft,
    ) -> Result<Outcome, LedgerError> {
        let Some(existing) = self.ledger.get(id) else {
            return Ok(Outcome::NotFound);
        };
        let tx = draft.rebuild(existing)?;
        self.categories.add(&tx.category)?;
        self.ledger.update(tx)
    }

    /// Marks onboarding as done, recording the current language, currency
    /// and theme.
    pub fn complete_onboarding(&mut self) -> Outcome {
        let currency = self.ledger.selected_currency();
        self.preferences.complete_onboarding(currency)
    }

    pub fn set_language(&mut self, language: Language) -> Outcome {
        let currency = self.ledger.selected_currency();
        self.preferences.set_language(language, currency)
    }

    /// Waits for every scheduled save.
    pub async fn flush(&self) -> Result<(), LedgerError> {
        self.persister.flush().await
    }

    /// Flushes pending saves and releases the writers.
    pub async fn close(self) -> Result<(), LedgerError> {
        self.persister.flush().await
    }
}

/// Builder for [`Budget`].
#[derive(Debug, Default)]
pub struct BudgetBuilder {
    options: PersistOptions,
}

impl BudgetBuilder {
    /// Quiet period before a change is written; see [`PersistOptions`].
    pub fn debounce(mut self, debounce: std::time::Duration) -> Self {
        self.options.debounce = debounce;
        self
    }

    pub async fn open<G: Gateway>(self, gateway: G) -> Result<Budget, LedgerError> {
        Budget::open(gateway, self.options).await
    }
}
