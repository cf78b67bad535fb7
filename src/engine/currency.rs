// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{CurrencyProfile, DEFAULT_CURRENCY, PROFILES, SymbolPosition};
use crate::engine::rates::{RateCache, RateSnapshot};
use crate::models::Money;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use tracing::debug;

/// Formats, parses and converts amounts for one account's default currency.
///
/// Cloning is cheap: the rate cache is shared.
#[derive(Clone)]
pub struct CurrencyEngine {
    rates: Arc<RateCache>,
    default_currency: &'static str,
}

impl CurrencyEngine {
    /// `default_currency` falls back to the built-in default when it is not
    /// a supported code.
    pub fn new(rates: Arc<RateCache>, default_currency: &str) -> Self {
        let wanted = default_currency.trim().to_uppercase();
        let default_currency = match PROFILES.get_key_value(wanted.as_str()) {
            Some((code, _)) => *code,
            None => {
                debug!(code = default_currency, "unsupported default currency");
                DEFAULT_CURRENCY
            }
        };
        Self {
            rates,
            default_currency,
        }
    }

    /// Same rate cache, another account's default currency.
    pub fn with_default(&self, default_currency: &str) -> Self {
        Self::new(self.rates.clone(), default_currency)
    }

    pub fn default_currency(&self) -> &'static str {
        self.default_currency
    }

    /// One consistent rate table to convert a whole view with.
    pub fn snapshot(&self) -> Arc<RateSnapshot> {
        self.rates.get_rates()
    }

    /// Exact lookup, no fallback.
    pub fn profile(code: &str) -> Option<&'static CurrencyProfile> {
        PROFILES.get(code.trim().to_uppercase().as_str())
    }

    pub fn is_supported(code: &str) -> bool {
        Self::profile(code).is_some()
    }

    pub fn supported() -> Vec<&'static CurrencyProfile> {
        PROFILES.values().collect()
    }

    /// Profile for `code`, or the default currency's profile when `code` is
    /// not supported.
    pub fn resolve(&self, code: &str) -> &'static CurrencyProfile {
        Self::profile(code).unwrap_or_else(|| &PROFILES[self.default_currency])
    }

    /// Renders `amount` with the currency's decimals, separators and symbol.
    /// Rounding happens here and nowhere else.
    pub fn format(&self, amount: Decimal, code: &str) -> String {
        let p = self.resolve(code);
        let rounded =
            amount.round_dp_with_strategy(p.decimals, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let digits = format!("{:.*}", p.decimals as usize, rounded.abs());

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (digits.as_str(), None),
        };
        let mut body = group_thousands(int_part, p.thousands_separator);
        if let Some(f) = frac_part {
            body.push_str(p.decimal_separator);
            body.push_str(f);
        }

        let sign = if negative { "-" } else { "" };
        match p.position {
            SymbolPosition::Prefix => format!("{}{}{}", sign, p.symbol, body),
            SymbolPosition::Suffix => format!("{}{} {}", sign, body, p.symbol),
        }
    }

    pub fn format_money(&self, m: &Money) -> String {
        self.format(m.amount, &m.currency)
    }

    /// Inverse of [`format`](Self::format).
    ///
    /// Lossy: anything that does not parse after normalization yields zero.
    /// Callers that need strict validation must check the input first.
    pub fn parse(&self, text: &str, code: &str) -> Decimal {
        let p = self.resolve(code);
        let mut s = text.replace(p.symbol, "");
        s.retain(|c| !c.is_whitespace());
        if !p.thousands_separator.is_empty() {
            s = s.replace(p.thousands_separator, "");
        }
        if p.decimal_separator != "." {
            s = s.replace(p.decimal_separator, ".");
        }
        match s.parse::<Decimal>() {
            Ok(d) => d,
            Err(_) => {
                debug!(input = text, currency = p.code, "unparseable amount, using zero");
                Decimal::ZERO
            }
        }
    }

    /// Converts through the cached base unit. Amounts in currencies missing
    /// from the rate table come back unchanged.
    pub fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        if from.trim().eq_ignore_ascii_case(to.trim()) {
            return amount;
        }
        convert_in(&self.snapshot(), amount, from, to)
    }
}

/// Converts with an explicit snapshot.
pub fn convert_in(snapshot: &RateSnapshot, amount: Decimal, from: &str, to: &str) -> Decimal {
    let from = from.trim().to_uppercase();
    let to = to.trim().to_uppercase();
    if from == to {
        return amount;
    }
    match (snapshot.rate(&from), snapshot.rate(&to)) {
        (Some(f), Some(t)) if !f.is_zero() => amount
            .checked_div(f)
            .and_then(|base| base.checked_mul(t))
            .unwrap_or(amount),
        _ => {
            debug!(%from, %to, "no rate for pair, amount left unconverted");
            amount
        }
    }
}

fn group_thousands(digits: &str, sep: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * sep.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(sep);
        }
        out.push(ch);
    }
    out
}
