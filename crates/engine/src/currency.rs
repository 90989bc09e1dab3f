//! Supported display currencies and the formatting service.
//!
//! The registry is static: every currency carries its symbol, where the symbol
//! goes, and the separators used when rendering an amount. Formatting always
//! prints the **magnitude** with two fraction digits; the caller decides how to
//! show direction (see [`signed_display`]).

use serde::{Deserialize, Serialize};

use crate::{LedgerError, Money};

/// ISO currency code selectable as the ledger's display currency.
///
/// Amounts are not converted between currencies: the selected currency only
/// changes how totals are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cny,
    Inr,
    Aud,
    Cad,
    Chf,
    Try,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolPosition {
    Before,
    After,
}

/// How the integer part is split into groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grouping {
    /// `1,234,567`
    Thousands,
    /// `12,34,567` (first group of three, then groups of two).
    Indian,
}

/// Registry entry for one currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub symbol: &'static str,
    pub position: SymbolPosition,
    pub decimal_separator: char,
    pub group_separator: char,
    pub grouping: Grouping,
}

/// Entry for the selection lists shown by the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CurrencyOption {
    pub code: &'static str,
    pub symbol: &'static str,
    pub label: String,
}

/// Integer parts shorter than this are printed without group separators.
const MIN_GROUPED_DIGITS: usize = 5;

impl Currency {
    pub const ALL: [Currency; 10] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Cny,
        Currency::Inr,
        Currency::Aud,
        Currency::Cad,
        Currency::Chf,
        Currency::Try,
    ];

    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        self.info().code
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        self.info().symbol
    }

    #[must_use]
    pub const fn info(self) -> CurrencyInfo {
        use Grouping::{Indian, Thousands};
        use SymbolPosition::{After, Before};

        let (code, symbol, position, decimal, group, grouping) = match self {
            Currency::Usd => ("USD", "$", Before, '.', ',', Thousands),
            Currency::Eur => ("EUR", "€", After, ',', '.', Thousands),
            Currency::Gbp => ("GBP", "£", Before, '.', ',', Thousands),
            Currency::Jpy => ("JPY", "¥", Before, '.', ',', Thousands),
            Currency::Cny => ("CNY", "¥", Before, '.', ',', Thousands),
            Currency::Inr => ("INR", "₹", Before, '.', ',', Indian),
            Currency::Aud => ("AUD", "$", Before, '.', ',', Thousands),
            Currency::Cad => ("CAD", "$", Before, '.', ',', Thousands),
            Currency::Chf => ("CHF", "CHF", Before, '.', '\u{2019}', Thousands),
            Currency::Try => ("TRY", "₺", After, '.', ',', Thousands),
        };

        CurrencyInfo {
            code,
            symbol,
            position,
            decimal_separator: decimal,
            group_separator: group,
            grouping,
        }
    }

    /// Looks up a code, ignoring surrounding whitespace and case.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Currency> {
        let code = code.trim();
        Currency::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(code))
    }

    /// Renders the magnitude of `amount` with this currency's conventions.
    #[must_use]
    pub fn format(self, amount: Money) -> String {
        let info = self.info();
        let cents = amount.cents().unsigned_abs();
        let units = group_digits(&(cents / 100).to_string(), info);
        let number = format!("{units}{}{:02}", info.decimal_separator, cents % 100);

        match info.position {
            SymbolPosition::Before => format!("{}{number}", info.symbol),
            SymbolPosition::After => format!("{number} {}", info.symbol),
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Currency::from_code(value)
            .ok_or_else(|| LedgerError::UnsupportedCurrency(value.trim().to_string()))
    }
}

fn group_digits(digits: &str, info: CurrencyInfo) -> String {
    if digits.len() < MIN_GROUPED_DIGITS {
        return digits.to_string();
    }

    // Group sizes read from the right: Indian grouping is 3 then 2, 2, ...
    let (first, rest) = match info.grouping {
        Grouping::Thousands => (3, 3),
        Grouping::Indian => (3, 2),
    };

    let mut groups = Vec::new();
    let mut end = digits.len();
    let mut size = first;
    while end > size {
        groups.push(&digits[end - size..end]);
        end -= size;
        size = rest;
    }
    groups.push(&digits[..end]);
    groups.reverse();

    let separator = info.group_separator.to_string();
    groups.join(&separator)
}

/// Formats `amount` for `code`, falling back to USD for unknown codes.
#[must_use]
pub fn format(amount: Money, code: &str) -> String {
    Currency::from_code(code).unwrap_or_default().format(amount)
}

/// Symbol for `code`, falling back to the USD symbol for unknown codes.
#[must_use]
pub fn symbol_of(code: &str) -> &'static str {
    Currency::from_code(code).unwrap_or_default().symbol()
}

/// Every supported currency in registry order.
#[must_use]
pub fn available_currencies() -> Vec<CurrencyOption> {
    Currency::ALL
        .into_iter()
        .map(|currency| CurrencyOption {
            code: currency.code(),
            symbol: currency.symbol(),
            label: format!("{} ({})", currency.code(), currency.symbol()),
        })
        .collect()
}

/// Formats with a leading `+` for income and `-` for expenses.
#[must_use]
pub fn signed_display(amount: Money, currency: Currency) -> String {
    let prefix = if amount.is_positive() {
        "+"
    } else if amount.is_negative() {
        "-"
    } else {
        ""
    };
    format!("{prefix}{}", currency.format(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_position_follows_registry() {
        assert_eq!(format(Money::new(123_450), "USD"), "$1234.50");
        assert_eq!(format(Money::new(123_450), "TRY"), "1234.50 ₺");
        assert_eq!(format(Money::new(123_450), "EUR"), "1234,50 €");
        assert_eq!(format(Money::new(5), "CHF"), "CHF0.05");
    }

    #[test]
    fn magnitude_is_rendered_without_sign() {
        assert_eq!(format(Money::new(-450), "USD"), "$4.50");
    }

    #[test]
    fn groups_from_five_digits() {
        assert_eq!(format(Money::new(1_234_500), "USD"), "$12,345.00");
        assert_eq!(format(Money::new(123_456_789), "EUR"), "1.234.567,89 €");
        assert_eq!(format(Money::new(123_456_700), "INR"), "₹12,34,567.00");
        assert_eq!(format(Money::new(1_234_567_800), "CHF"), "CHF12\u{2019}345\u{2019}678.00");
    }

    #[test]
    fn unknown_code_falls_back_to_usd() {
        assert_eq!(format(Money::new(100), "XYZ"), "$1.00");
        assert_eq!(symbol_of("XYZ"), "$");
        assert_eq!(symbol_of("gbp"), "£");
    }

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!(Currency::try_from(" try "), Ok(Currency::Try));
        assert_eq!(
            Currency::try_from("BTC"),
            Err(LedgerError::UnsupportedCurrency("BTC".to_string()))
        );
    }

    #[test]
    fn available_currencies_have_labels() {
        let options = available_currencies();
        assert_eq!(options.len(), 10);
        assert_eq!(options[0].label, "USD ($)");
        assert_eq!(options[9].code, "TRY");
    }

    #[test]
    fn signed_display_prefixes_direction() {
        assert_eq!(signed_display(Money::new(200_000), Currency::Usd), "+$2000.00");
        assert_eq!(signed_display(Money::new(-450), Currency::Try), "-4.50 ₺");
        assert_eq!(signed_display(Money::ZERO, Currency::Usd), "$0.00");
    }

    #[test]
    fn serializes_as_code() {
        assert_eq!(serde_json::to_string(&Currency::Try).unwrap(), "\"TRY\"");
        let back: Currency = serde_json::from_str("\"GBP\"").unwrap();
        assert_eq!(back, Currency::Gbp);
    }
}
