// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Bill lifecycle: `pending → overdue` happens on read once the due date has
//! passed, `pending | overdue → paid` only on request. A paid row never
//! reopens; a recurring bill spawns a fresh pending row instead.

use crate::engine::currency::{CurrencyEngine, convert_in};
use crate::engine::rates::RateSnapshot;
use crate::engine::recurrence::next_occurrence;
use crate::error::{EngineError, Result};
use crate::models::{Bill, BillStatus, Money, Recurrence};
use crate::store::Store;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct BillView {
    #[serde(flatten)]
    pub bill: Bill,
    pub is_overdue: bool,
    pub days_until_due: i64,
    /// Amount in the owner's currency, unrounded.
    pub display_amount: Money,
    pub formatted_amount: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkPaid {
    pub bill_id: i64,
    pub already_paid: bool,
    pub next_bill_id: Option<i64>,
    pub next_due_date: Option<NaiveDate>,
    /// Set when the follow-up bill could not be stored. The payment itself
    /// still stands.
    pub next_occurrence_error: Option<String>,
}

/// Status as of `today`. Only `pending` moves on its own.
pub fn derived_status(bill: &Bill, today: NaiveDate) -> BillStatus {
    match bill.status {
        BillStatus::Pending if bill.due_date < today => BillStatus::Overdue,
        s => s,
    }
}

fn view(
    engine: &CurrencyEngine,
    snap: &RateSnapshot,
    mut bill: Bill,
    today: NaiveDate,
) -> BillView {
    bill.status = derived_status(&bill, today);
    let is_overdue = bill.due_date < today && bill.status != BillStatus::Paid;
    let days_until_due = (bill.due_date - today).num_days().abs();
    let display_ccy = engine.default_currency();
    let display_amount = Money::new(
        convert_in(snap, bill.amount.amount, &bill.amount.currency, display_ccy),
        display_ccy,
    );
    let formatted_amount = engine.format_money(&bill.amount);
    BillView {
        bill,
        is_overdue,
        days_until_due,
        display_amount,
        formatted_amount,
    }
}

/// Writes the overdue correction back when the stored row is still pending.
/// A failed write only costs us the persistence; the view is already right.
fn correct<S: Store + ?Sized>(store: &S, bill: &Bill, today: NaiveDate) {
    if bill.status == BillStatus::Pending && derived_status(bill, today) == BillStatus::Overdue {
        match store.mark_overdue(bill.user_id, bill.id) {
            Ok(true) => debug!(bill = bill.id, "bill marked overdue"),
            Ok(false) => {}
            Err(e) => warn!(bill = bill.id, error = %e, "could not persist overdue status"),
        }
    }
}

/// All bills of `owner`, soonest due first, with overdue corrections applied
/// and persisted.
pub fn list_bills<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
) -> Result<Vec<BillView>> {
    let snap = engine.snapshot();
    let bills = store.bills_for_owner(owner)?;
    Ok(bills
        .into_iter()
        .map(|b| {
            correct(store, &b, today);
            view(engine, &snap, b, today)
        })
        .collect())
}

pub fn bill_status<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    bill_id: i64,
    today: NaiveDate,
) -> Result<BillView> {
    let bill = store.bill(owner, bill_id)?.ok_or(EngineError::NotFound {
        kind: "Bill",
        id: bill_id,
    })?;
    correct(store, &bill, today);
    Ok(view(engine, &engine.snapshot(), bill, today))
}

/// Unpaid bills due between today and `days` from now, inclusive.
pub fn upcoming_bills<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
    days: u32,
) -> Result<Vec<BillView>> {
    let horizon = today
        .checked_add_signed(chrono::Duration::days(i64::from(days)))
        .unwrap_or(NaiveDate::MAX);
    Ok(list_bills(store, engine, owner, today)?
        .into_iter()
        .filter(|v| {
            v.bill.status != BillStatus::Paid
                && v.bill.due_date >= today
                && v.bill.due_date <= horizon
        })
        .collect())
}

/// Pays a bill and, for recurring bills, schedules the next one.
///
/// Only the request that actually flips the row to `paid` schedules the
/// follow-up; a payment that loses the race reports `already_paid`.
///
/// The two writes are not atomic. If the next occurrence cannot be computed
/// or stored the bill stays paid and the failure is reported in the result.
pub fn mark_paid<S: Store + ?Sized>(store: &S, owner: i64, bill_id: i64) -> Result<MarkPaid> {
    let bill = store.bill(owner, bill_id)?.ok_or(EngineError::NotFound {
        kind: "Bill",
        id: bill_id,
    })?;
    let mut out = MarkPaid {
        bill_id,
        already_paid: false,
        next_bill_id: None,
        next_due_date: None,
        next_occurrence_error: None,
    };
    if bill.status == BillStatus::Paid {
        debug!(bill = bill_id, "bill already paid");
        out.already_paid = true;
        return Ok(out);
    }

    if !store.mark_paid(owner, bill_id)? {
        debug!(bill = bill_id, "bill paid by a concurrent request");
        out.already_paid = true;
        return Ok(out);
    }
    info!(bill = bill_id, owner, "bill marked paid");

    if !bill.recurring.is_recurring() {
        return Ok(out);
    }
    let Some(next) = next_occurrence(&bill) else {
        if matches!(bill.recurring, Recurrence::Unrecognized(_)) {
            return Ok(out);
        }
        warn!(bill = bill_id, due = %bill.due_date, "next due date is out of calendar range");
        out.next_occurrence_error = Some(format!(
            "no {} due date after {}",
            bill.recurring, bill.due_date
        ));
        return Ok(out);
    };
    match store.insert_bill(&next) {
        Ok(id) => {
            info!(bill = bill_id, next = id, due = %next.due_date, "scheduled next occurrence");
            out.next_bill_id = Some(id);
            out.next_due_date = Some(next.due_date);
        }
        Err(e) => {
            warn!(bill = bill_id, error = %e, "failed to create next occurrence");
            out.next_occurrence_error = Some(e.to_string());
        }
    }
    Ok(out)
}
