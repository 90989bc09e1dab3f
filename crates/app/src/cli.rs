//! Command line surface.
//!
//! Every command runs against an opened [`Budget`] and returns the lines to
//! print, so the rendering can be tested without a terminal.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{
    Budget, CategoryFilter, Currency, Language, Outcome, ThemeMode, Transaction,
    TransactionDraft, TransactionId, TransactionKind, currency,
};

use crate::{
    error::{AppError, Result},
    settings::{Overrides, StorageKind},
};

#[derive(Debug, Parser)]
#[command(name = "budgetly", version, about = "Personal income and expense ledger")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub level: Option<String>,
    /// Override the storage backend (memory, json, sqlite).
    #[arg(long, global = true, value_parser = parse_storage)]
    pub storage: Option<StorageKind>,
    /// Override the directory used by the json backend.
    #[arg(long, global = true)]
    pub data_dir: Option<String>,
    /// Use the SQLite backend with this database file.
    #[arg(long, global = true)]
    pub database: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            level: self.level.clone(),
            storage: self.storage,
            data_dir: self.data_dir.clone(),
            database: self.database.clone(),
        }
    }
}

fn parse_storage(value: &str) -> std::result::Result<StorageKind, String> {
    StorageKind::parse(value).ok_or_else(|| format!("unknown storage backend `{value}`"))
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a new transaction dated today.
    Add(EntryArgs),
    /// Replace description, amount, category and kind of a transaction.
    Edit {
        id: String,
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Remove a transaction.
    Delete { id: String },
    /// Show the most recent transactions, newest first.
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show balance, income and expenses.
    Summary,
    /// Show totals per category.
    Breakdown {
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
    },
    /// List categories, or register a new one.
    Categories {
        #[arg(long)]
        add: Option<String>,
    },
    /// Show the selected currency, or select another one by code.
    Currency { code: Option<String> },
    /// List the supported currencies.
    Currencies,
    /// Show the theme, or set it (light, dark, toggle).
    Theme { mode: Option<String> },
    /// Show the interface language, or select another one (tr, en).
    Language { code: Option<String> },
    /// Show whether onboarding is done, or mark it done.
    Onboarding {
        #[arg(long)]
        complete: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct EntryArgs {
    pub description: String,
    /// Positive amount in major units, e.g. `4.50`.
    #[arg(allow_hyphen_values = true)]
    pub amount: String,
    #[arg(long, short)]
    pub category: String,
    /// Record as income instead of an expense.
    #[arg(long)]
    pub income: bool,
    #[arg(long)]
    pub recurring: bool,
}

impl EntryArgs {
    fn into_draft(self) -> TransactionDraft {
        TransactionDraft {
            description: self.description,
            amount: self.amount,
            category: self.category,
            kind: if self.income {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            },
            is_recurring: self.recurring,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Filter {
    All,
    Expenses,
    Income,
}

impl From<Filter> for CategoryFilter {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::All => CategoryFilter::All,
            Filter::Expenses => CategoryFilter::ExpensesOnly,
            Filter::Income => CategoryFilter::IncomeOnly,
        }
    }
}

pub fn execute(budget: &mut Budget, command: Command, today: NaiveDate) -> Result<Vec<String>> {
    let currency = budget.ledger.selected_currency();
    let lines = match command {
        Command::Add(entry) => {
            let tx = budget.record(entry.into_draft(), today)?;
            vec![format!("added {}", format_row(&tx, currency))]
        }
        Command::Edit { id, entry } => {
            let id = TransactionId::from(id);
            match budget.amend(&id, entry.into_draft())? {
                Outcome::NotFound => return Err(not_found(&id)),
                _ => vec![format!("updated {id}")],
            }
        }
        Command::Delete { id } => {
            let id = TransactionId::from(id);
            match budget.ledger.delete(&id)? {
                Outcome::NotFound => return Err(not_found(&id)),
                _ => vec![format!("deleted {id}")],
            }
        }
        Command::List { limit } => {
            let recent = budget.ledger.recent(limit);
            if recent.is_empty() {
                vec!["no transactions yet".to_string()]
            } else {
                recent.into_iter().map(|tx| format_row(tx, currency)).collect()
            }
        }
        Command::Summary => {
            let summary = budget.ledger.summary();
            vec![
                format!("balance  {}", currency.format(summary.balance)),
                format!("income   {}", currency.format(summary.income)),
                format!("expenses {}", currency.format(summary.expense_magnitude())),
            ]
        }
        Command::Breakdown { filter } => budget
            .ledger
            .by_category(filter.into())
            .into_iter()
            .map(|(category, total)| format!("{category}: {}", currency.format(total)))
            .collect(),
        Command::Categories { add } => {
            if let Some(name) = add {
                budget.categories.add(&name)?;
            }
            budget.categories.list().to_vec()
        }
        Command::Currency { code } => {
            if let Some(code) = code {
                let selected = Currency::try_from(code.as_str())?;
                budget.ledger.select_currency(selected.code())?;
            }
            let selected = budget.ledger.selected_currency();
            vec![format!("{} ({})", selected.code(), selected.symbol())]
        }
        Command::Currencies => currency::available_currencies()
            .into_iter()
            .map(|option| option.label)
            .collect(),
        Command::Theme { mode } => {
            match mode.as_deref() {
                None => {}
                Some("toggle") => {
                    budget.preferences.toggle_theme();
                }
                Some(raw) => {
                    let Some(mode) = ThemeMode::parse(raw) else {
                        return Err(AppError::Usage(format!("unknown theme `{raw}`")));
                    };
                    budget.preferences.set_theme(mode);
                }
            }
            vec![budget.preferences.theme_mode().as_str().to_string()]
        }
        Command::Language { code } => {
            if let Some(code) = code {
                let Some(language) = Language::parse(&code) else {
                    let known: Vec<&str> = Language::ALL.iter().map(|l| l.as_str()).collect();
                    return Err(AppError::Usage(format!(
                        "unknown language `{code}` (expected {})",
                        known.join(", ")
                    )));
                };
                budget.set_language(language);
            }
            let language = budget.preferences.language();
            vec![format!("{} ({})", language.as_str(), language.label())]
        }
        Command::Onboarding { complete } => {
            if complete {
                budget.complete_onboarding();
            }
            let done = budget.preferences.onboarding_completed();
            vec![if done { "completed" } else { "pending" }.to_string()]
        }
    };
    Ok(lines)
}

fn not_found(id: &TransactionId) -> AppError {
    AppError::Usage(format!("no transaction with id {id}"))
}

fn format_row(tx: &Transaction, currency: Currency) -> String {
    let recurring = if tx.is_recurring { " (recurring)" } else { "" };
    format!(
        "{} {} {} [{}] {}{recurring}",
        tx.id,
        tx.date,
        currency::signed_display(tx.amount, currency),
        tx.category,
        tx.description,
    )
}

#[cfg(test)]
mod tests {
    use engine::{LedgerError, MemoryGateway};

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn entry(description: &str, amount: &str, category: &str, income: bool) -> EntryArgs {
        EntryArgs {
            description: description.to_string(),
            amount: amount.to_string(),
            category: category.to_string(),
            income,
            recurring: false,
        }
    }

    async fn budget() -> Budget {
        Budget::builder().open(MemoryGateway::new()).await.unwrap()
    }

    #[tokio::test]
    async fn summary_renders_in_selected_currency() {
        let mut budget = budget().await;
        execute(
            &mut budget,
            Command::Add(entry("Salary", "1000", "Salary", true)),
            today(),
        )
        .unwrap();
        execute(
            &mut budget,
            Command::Add(entry("Coffee", "4.50", "Food", false)),
            today(),
        )
        .unwrap();

        let lines = execute(&mut budget, Command::Summary, today()).unwrap();
        assert_eq!(
            lines,
            vec!["balance  $995.50", "income   $1000.00", "expenses $4.50"]
        );

        execute(
            &mut budget,
            Command::Currency {
                code: Some("eur".to_string()),
            },
            today(),
        )
        .unwrap();
        let lines = execute(
            &mut budget,
            Command::Breakdown {
                filter: Filter::Expenses,
            },
            today(),
        )
        .unwrap();
        assert_eq!(lines, vec!["Food: 4,50 €"]);
    }

    #[tokio::test]
    async fn list_shows_signed_amounts_newest_first() {
        let mut budget = budget().await;
        execute(
            &mut budget,
            Command::Add(entry("Coffee", "4.50", "Food", false)),
            today(),
        )
        .unwrap();
        execute(
            &mut budget,
            Command::Add(entry("Refund", "10", "Other", true)),
            today(),
        )
        .unwrap();

        let lines = execute(&mut budget, Command::List { limit: 10 }, today()).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("+$10.00 [Other] Refund"));
        assert!(lines[1].contains("-$4.50 [Food] Coffee"));
    }

    #[tokio::test]
    async fn unknown_ids_and_currency_codes_are_rejected() {
        let mut budget = budget().await;
        let err = execute(
            &mut budget,
            Command::Delete {
                id: "missing".to_string(),
            },
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Usage(_)));

        let err = execute(
            &mut budget,
            Command::Currency {
                code: Some("XYZ".to_string()),
            },
            today(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::Ledger(LedgerError::UnsupportedCurrency(code)) if code == "XYZ"
        ));
    }

    #[tokio::test]
    async fn invalid_drafts_surface_ledger_errors() {
        let mut budget = budget().await;
        let err = execute(
            &mut budget,
            Command::Add(entry("Coffee", "-3", "Food", false)),
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Ledger(_)));
        assert!(budget.ledger.transactions().is_empty());
    }

    #[tokio::test]
    async fn theme_can_be_toggled() {
        let mut budget = budget().await;
        let lines = execute(
            &mut budget,
            Command::Theme {
                mode: Some("toggle".to_string()),
            },
            today(),
        )
        .unwrap();
        assert_eq!(lines, vec!["dark"]);
    }

    #[tokio::test]
    async fn language_defaults_to_turkish_and_can_change() {
        let mut budget = budget().await;
        let lines = execute(&mut budget, Command::Language { code: None }, today()).unwrap();
        assert_eq!(lines, vec!["tr (Türkçe)"]);

        let lines = execute(
            &mut budget,
            Command::Language {
                code: Some("EN".to_string()),
            },
            today(),
        )
        .unwrap();
        assert_eq!(lines, vec!["en (English)"]);

        let err = execute(
            &mut budget,
            Command::Language {
                code: Some("de".to_string()),
            },
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Usage(msg) if msg.contains("expected tr, en")));
    }

    #[tokio::test]
    async fn onboarding_can_be_completed_once() {
        let mut budget = budget().await;
        let status = |budget: &mut Budget, complete| {
            execute(budget, Command::Onboarding { complete }, today()).unwrap()
        };
        assert_eq!(status(&mut budget, false), vec!["pending"]);
        assert_eq!(status(&mut budget, true), vec!["completed"]);
        assert_eq!(status(&mut budget, false), vec!["completed"]);
    }
}
