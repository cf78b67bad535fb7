// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Bill, BillStatus, NewBill, Recurrence};
use chrono::{Datelike, Months, NaiveDate};
use tracing::warn;

fn step(interval: &Recurrence) -> Option<Months> {
    match interval {
        Recurrence::Monthly => Some(Months::new(1)),
        Recurrence::Quarterly => Some(Months::new(3)),
        Recurrence::Yearly => Some(Months::new(12)),
        Recurrence::None | Recurrence::Unrecognized(_) => None,
    }
}

fn last_day_of_month(d: NaiveDate) -> Option<u32> {
    Some(
        d.with_day(1)?
            .checked_add_months(Months::new(1))?
            .pred_opt()?
            .day(),
    )
}

/// Due date one interval after `due`.
///
/// The day of month is kept when the target month has it and clamped to the
/// month's last day otherwise. A due date that was clamped earlier sits on a
/// month end; `anchor_day` lets it return to the original day
/// (Jan 31 → Feb 29 → Mar 31).
pub fn next_due_date(due: NaiveDate, interval: &Recurrence, anchor_day: u32) -> Option<NaiveDate> {
    let months = step(interval)?;
    let shifted = due.checked_add_months(months)?;

    let on_month_end = last_day_of_month(due)? == due.day();
    let wanted = if on_month_end && anchor_day > due.day() {
        anchor_day
    } else {
        due.day()
    };
    let day = wanted.min(last_day_of_month(shifted)?);
    shifted.with_day(day)
}

/// The pending bill that follows `bill` in its series, or `None` when the
/// bill does not recur or its interval is not one we know.
pub fn next_occurrence(bill: &Bill) -> Option<NewBill> {
    if let Recurrence::Unrecognized(raw) = &bill.recurring {
        warn!(bill = bill.id, interval = %raw, "unrecognized recurrence interval, no next occurrence");
        return None;
    }
    let due_date = next_due_date(bill.due_date, &bill.recurring, bill.anchor_day)?;
    Some(NewBill {
        user_id: bill.user_id,
        title: bill.title.clone(),
        amount: bill.amount.clone(),
        due_date,
        status: BillStatus::Pending,
        recurring: bill.recurring.clone(),
        anchor_day: bill.anchor_day,
        category_id: bill.category_id,
        description: bill.description.clone(),
    })
}
