//! ISO 4217 currency table and `es-MX` style money formatting.
//!
//! Formatting follows what the site has always shown: the peso renders with a
//! bare `$`, foreign currencies render with their code as prefix, thousands
//! are grouped with `,` and the decimal separator is `.`.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::{LedgerError, Result};

/// Formatting rules for one currency.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub prefix: &'static str,
    /// Number of minor-unit digits.
    pub minor_digits: u32,
}

const CURRENCIES: &[CurrencyInfo] = &[
    CurrencyInfo { code: "MXN", prefix: "$", minor_digits: 2 },
    CurrencyInfo { code: "USD", prefix: "USD ", minor_digits: 2 },
    CurrencyInfo { code: "EUR", prefix: "EUR ", minor_digits: 2 },
    CurrencyInfo { code: "GBP", prefix: "GBP ", minor_digits: 2 },
    CurrencyInfo { code: "CAD", prefix: "CAD ", minor_digits: 2 },
    CurrencyInfo { code: "ARS", prefix: "ARS ", minor_digits: 2 },
    CurrencyInfo { code: "COP", prefix: "COP ", minor_digits: 2 },
    CurrencyInfo { code: "CLP", prefix: "CLP ", minor_digits: 0 },
    CurrencyInfo { code: "JPY", prefix: "JPY ", minor_digits: 0 },
];

/// Look up a currency by code. Codes are matched case-insensitively.
pub fn lookup(code: &str) -> Option<&'static CurrencyInfo> {
    CURRENCIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

/// Format `amount` as money in `code`.
///
/// Fails with [`LedgerError::UnsupportedCurrency`] for codes outside the table;
/// callers fall back to [`format_raw`].
pub fn format(amount: Decimal, code: &str) -> Result<String> {
    let info = lookup(code).ok_or_else(|| LedgerError::UnsupportedCurrency(code.to_string()))?;

    let mut rounded = amount
        .round_dp_with_strategy(info.minor_digits, RoundingStrategy::MidpointAwayFromZero)
        .abs();
    rounded.rescale(info.minor_digits);

    let digits = rounded.to_string();
    let (integer, fraction) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits.as_str(), None),
    };

    let mut out = String::with_capacity(digits.len() + info.prefix.len() + 8);
    if amount.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(info.prefix);
    out.push_str(&group_thousands(integer));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    Ok(out)
}

/// Plain numeric display used when a currency cannot be formatted.
pub fn format_raw(amount: Decimal, code: &str) -> String {
    format!("{} {}", amount.normalize(), code)
}

fn group_thousands(integer: &str) -> String {
    let len = integer.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
