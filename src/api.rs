// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Entry points for thin front ends. Every call returns an [`Outcome`]:
//! either data, or `success: false` with a message. Nothing here panics on
//! bad input.

use crate::config::CurrencyProfile;
use crate::engine::aggregation::{
    self, BillsOverview, BudgetView, BudgetsOverview, GoalView, GoalsOverview,
};
use crate::engine::currency::CurrencyEngine;
use crate::engine::obligations::{self, BillView, MarkPaid};
use crate::engine::recurrence;
use crate::error::EngineError;
use crate::models::NewBill;
use crate::store::Store;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn ok_with(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn into_result(self) -> anyhow::Result<T> {
        match (self.success, self.data) {
            (true, Some(d)) => Ok(d),
            _ => Err(anyhow::anyhow!(
                self.message.unwrap_or_else(|| "operation failed".into())
            )),
        }
    }
}

impl<T> From<Result<T, EngineError>> for Outcome<T> {
    fn from(r: Result<T, EngineError>) -> Self {
        match r {
            Ok(d) => Outcome::ok(d),
            Err(e) => Outcome::failed(e.to_string()),
        }
    }
}

/// Strict amount parsing for caller input.
pub fn parse_amount(s: &str) -> Result<Decimal, EngineError> {
    let t = s.trim();
    if t.is_empty() {
        return Err(EngineError::InvalidAmount(s.to_string()));
    }
    t.parse::<Decimal>()
        .map_err(|_| EngineError::InvalidAmount(s.to_string()))
}

pub fn parse_date(s: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidDate(s.to_string()))
}

/// Accepts any well-formed 3-letter code, supported or not; unsupported
/// codes are resolved later by the engine.
pub fn parse_currency(s: &str) -> Result<String, EngineError> {
    let t = s.trim();
    if t.len() == 3 && t.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(t.to_ascii_uppercase())
    } else {
        Err(EngineError::InvalidCurrency(s.to_string()))
    }
}

pub fn format_money(engine: &CurrencyEngine, amount: &str, currency: &str) -> Outcome<String> {
    (|| -> Result<String, EngineError> {
        let amount = parse_amount(amount)?;
        let currency = parse_currency(currency)?;
        Ok(engine.format(amount, &currency))
    })()
    .into()
}

/// Lossy: unreadable text parses to zero.
pub fn parse_money(engine: &CurrencyEngine, text: &str, currency: &str) -> Outcome<Decimal> {
    parse_currency(currency)
        .map(|c| engine.parse(text, &c))
        .into()
}

#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub amount: Decimal,
    pub from: String,
    pub to: String,
    pub converted: Decimal,
    pub formatted: String,
}

pub fn convert_money(
    engine: &CurrencyEngine,
    amount: &str,
    from: &str,
    to: &str,
) -> Outcome<Conversion> {
    (|| -> Result<Conversion, EngineError> {
        let amount = parse_amount(amount)?;
        let from = parse_currency(from)?;
        let to = parse_currency(to)?;
        let converted = engine.convert(amount, &from, &to);
        Ok(Conversion {
            amount,
            formatted: engine.format(converted, &to),
            from,
            to,
            converted,
        })
    })()
    .into()
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyInfo {
    #[serde(flatten)]
    pub profile: &'static CurrencyProfile,
    pub is_default: bool,
}

pub fn supported_currencies(engine: &CurrencyEngine) -> Outcome<Vec<CurrencyInfo>> {
    Outcome::ok(
        CurrencyEngine::supported()
            .into_iter()
            .map(|p| CurrencyInfo {
                profile: p,
                is_default: p.code == engine.default_currency(),
            })
            .collect(),
    )
}

pub fn list_bills<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
) -> Outcome<Vec<BillView>> {
    obligations::list_bills(store, engine, owner, today).into()
}

pub fn bill_status<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    bill_id: i64,
    today: NaiveDate,
) -> Outcome<BillView> {
    obligations::bill_status(store, engine, owner, bill_id, today).into()
}

pub fn upcoming_bills<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
    days: u32,
) -> Outcome<Vec<BillView>> {
    obligations::upcoming_bills(store, engine, owner, today, days).into()
}

pub fn bills_overview<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
) -> Outcome<BillsOverview> {
    obligations::list_bills(store, engine, owner, today)
        .map(|views| aggregation::bills_overview(&views, engine.default_currency()))
        .into()
}

pub fn mark_paid<S: Store + ?Sized>(store: &S, owner: i64, bill_id: i64) -> Outcome<MarkPaid> {
    match obligations::mark_paid(store, owner, bill_id) {
        Ok(r) if r.already_paid => Outcome::ok_with(r, "Bill was already paid"),
        Ok(r) => Outcome::ok_with(r, "Bill marked as paid successfully"),
        Err(e) => Outcome::failed(e.to_string()),
    }
}

/// Preview of the bill that paying `bill_id` would schedule. `None` when the
/// bill does not recur or its interval is not recognized.
pub fn next_occurrence<S: Store + ?Sized>(
    store: &S,
    owner: i64,
    bill_id: i64,
) -> Outcome<Option<NewBill>> {
    match store.bill(owner, bill_id) {
        Ok(Some(bill)) => Outcome::ok(recurrence::next_occurrence(&bill)),
        Ok(None) => Outcome::failed(
            EngineError::NotFound {
                kind: "Bill",
                id: bill_id,
            }
            .to_string(),
        ),
        Err(e) => Outcome::failed(e.to_string()),
    }
}

pub fn budget_progress<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
) -> Outcome<Vec<BudgetView>> {
    aggregation::budgets_with_progress(store, engine, owner, today).into()
}

pub fn budgets_overview<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
) -> Outcome<BudgetsOverview> {
    aggregation::budgets_with_progress(store, engine, owner, today)
        .map(|views| aggregation::budgets_overview(&views, engine.default_currency()))
        .into()
}

pub fn goal_progress<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
) -> Outcome<Vec<GoalView>> {
    aggregation::goals_with_progress(store, engine, owner, today).into()
}

pub fn goals_overview<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
) -> Outcome<GoalsOverview> {
    aggregation::goals_with_progress(store, engine, owner, today)
        .map(|views| aggregation::goals_overview(&views, engine.default_currency()))
        .into()
}
