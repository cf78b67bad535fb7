// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{get_setting, set_setting};
use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_CURRENCY: &str = "PHP";
pub const DEFAULT_RATE_BASE: &str = "USD";
pub const DEFAULT_RATE_API_URL: &str = "https://api.exchangerate-api.com/v4/latest/";
pub const DEFAULT_REFRESH_SECS: u64 = 3600;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Prefix,
    Suffix,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyProfile {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub position: SymbolPosition,
    pub decimals: u32,
    pub thousands_separator: &'static str,
    pub decimal_separator: &'static str,
}

const fn profile(
    code: &'static str,
    name: &'static str,
    symbol: &'static str,
    position: SymbolPosition,
    decimals: u32,
    thousands_separator: &'static str,
    decimal_separator: &'static str,
) -> CurrencyProfile {
    CurrencyProfile {
        code,
        name,
        symbol,
        position,
        decimals,
        thousands_separator,
        decimal_separator,
    }
}

/// Locale rules for every supported currency, keyed by ISO code.
pub static PROFILES: Lazy<BTreeMap<&'static str, CurrencyProfile>> = Lazy::new(|| {
    use SymbolPosition::{Prefix, Suffix};
    [
        profile("USD", "US Dollar", "$", Prefix, 2, ",", "."),
        profile("EUR", "Euro", "€", Prefix, 2, ".", ","),
        profile("GBP", "British Pound", "£", Prefix, 2, ",", "."),
        profile("JPY", "Japanese Yen", "¥", Prefix, 0, ",", "."),
        profile("CAD", "Canadian Dollar", "C$", Prefix, 2, ",", "."),
        profile("AUD", "Australian Dollar", "A$", Prefix, 2, ",", "."),
        profile("CHF", "Swiss Franc", "CHF", Suffix, 2, "'", "."),
        profile("CNY", "Chinese Yuan", "¥", Prefix, 2, ",", "."),
        profile("INR", "Indian Rupee", "₹", Prefix, 2, ",", "."),
        profile("PHP", "Philippine Peso", "₱", Prefix, 2, ",", "."),
    ]
    .into_iter()
    .map(|p| (p.code, p))
    .collect()
});

/// Rates used when the upstream source has never answered.
/// Expressed as units per 1 USD.
pub static FALLBACK_RATES: Lazy<BTreeMap<String, Decimal>> = Lazy::new(|| {
    [
        ("USD", Decimal::ONE),
        ("EUR", Decimal::new(85, 2)),
        ("GBP", Decimal::new(73, 2)),
        ("JPY", Decimal::new(110, 0)),
        ("CAD", Decimal::new(125, 2)),
        ("AUD", Decimal::new(135, 2)),
        ("CHF", Decimal::new(92, 2)),
        ("CNY", Decimal::new(645, 2)),
        ("INR", Decimal::new(74, 0)),
        ("PHP", Decimal::new(50, 0)),
    ]
    .into_iter()
    .map(|(c, r)| (c.to_string(), r))
    .collect()
});

/// Settings keys understood by `config set`.
pub const KEYS: [&str; 6] = [
    "default_currency",
    "rate_base",
    "rate_api_url",
    "rate_refresh_secs",
    "rate_timeout_secs",
    "rate_source_enabled",
];

#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    pub default_currency: String,
    pub rate_base: String,
    pub rate_api_url: String,
    pub rate_refresh_secs: u64,
    pub rate_timeout_secs: u64,
    pub rate_source_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_currency: DEFAULT_CURRENCY.to_string(),
            rate_base: DEFAULT_RATE_BASE.to_string(),
            rate_api_url: DEFAULT_RATE_API_URL.to_string(),
            rate_refresh_secs: DEFAULT_REFRESH_SECS,
            rate_timeout_secs: DEFAULT_TIMEOUT_SECS,
            rate_source_enabled: true,
        }
    }
}

impl EngineConfig {
    /// Reads overrides from the `settings` table on top of the defaults.
    pub fn load(conn: &Connection) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = get_setting(conn, "default_currency")? {
            cfg.default_currency = v.to_uppercase();
        }
        if let Some(v) = get_setting(conn, "rate_base")? {
            cfg.rate_base = v.to_uppercase();
        }
        if let Some(v) = get_setting(conn, "rate_api_url")? {
            cfg.rate_api_url = v;
        }
        if let Some(v) = get_setting(conn, "rate_refresh_secs")? {
            cfg.rate_refresh_secs = v
                .parse()
                .with_context(|| format!("Invalid rate_refresh_secs '{}'", v))?;
        }
        if let Some(v) = get_setting(conn, "rate_timeout_secs")? {
            cfg.rate_timeout_secs = v
                .parse()
                .with_context(|| format!("Invalid rate_timeout_secs '{}'", v))?;
        }
        if let Some(v) = get_setting(conn, "rate_source_enabled")? {
            cfg.rate_source_enabled = parse_bool(&v)?;
        }
        Ok(cfg)
    }

    pub fn refresh_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.rate_refresh_secs as i64)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.rate_timeout_secs)
    }
}

/// Validates and stores one setting.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    match key {
        "default_currency" | "rate_base" => {
            if !PROFILES.contains_key(value.to_uppercase().as_str()) {
                return Err(anyhow!("Unsupported currency '{}'", value));
            }
            set_setting(conn, key, &value.to_uppercase())
        }
        "rate_refresh_secs" | "rate_timeout_secs" => {
            value
                .parse::<u64>()
                .with_context(|| format!("Invalid {} '{}'", key, value))?;
            set_setting(conn, key, value)
        }
        "rate_source_enabled" => {
            let b = parse_bool(value)?;
            set_setting(conn, key, if b { "true" } else { "false" })
        }
        "rate_api_url" => set_setting(conn, key, value),
        _ => Err(anyhow!(
            "Unknown setting '{}', expected one of: {}",
            key,
            KEYS.join(", ")
        )),
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("Invalid boolean '{}'", s)),
    }
}
