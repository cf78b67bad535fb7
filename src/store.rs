// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Owner-scoped row access used by the engine.
//!
//! Every trait write touches a single row. The persisted rate snapshot is the
//! one multi-row write and goes through a transaction.

use crate::engine::rates::RateSnapshot;
use crate::error::{EngineError, Result};
use crate::models::{
    Bill, BillStatus, Budget, Goal, Money, NewBill, Recurrence, Transaction, TxKind, User,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

pub trait Store {
    fn user(&self, id: i64) -> Result<User>;
    fn insert_user(&self, name: &str, currency: &str) -> Result<i64>;

    fn bills_for_owner(&self, owner: i64) -> Result<Vec<Bill>>;
    fn bill(&self, owner: i64, id: i64) -> Result<Option<Bill>>;
    fn insert_bill(&self, bill: &NewBill) -> Result<i64>;
    /// Flips `pending` to `overdue`. Safe to run any number of times.
    fn mark_overdue(&self, owner: i64, id: i64) -> Result<bool>;
    /// Flips an unpaid bill to `paid`. Returns false when it already was.
    fn mark_paid(&self, owner: i64, id: i64) -> Result<bool>;
    fn delete_bill(&self, owner: i64, id: i64) -> Result<bool>;

    fn budgets_for_owner(&self, owner: i64) -> Result<Vec<Budget>>;
    fn delete_budget(&self, owner: i64, id: i64) -> Result<bool>;
    fn insert_budget(
        &self,
        owner: i64,
        category_id: Option<i64>,
        amount: &Money,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64>;

    /// Expense rows of `owner` dated within `[start, end]`; `category` None
    /// means every category.
    fn expenses_between(
        &self,
        owner: i64,
        category: Option<i64>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>>;
    fn insert_transaction(
        &self,
        owner: i64,
        kind: TxKind,
        amount: &Money,
        category_id: Option<i64>,
        description: Option<&str>,
        date: NaiveDate,
    ) -> Result<i64>;

    fn goals_for_owner(&self, owner: i64) -> Result<Vec<Goal>>;
    fn insert_goal(
        &self,
        owner: i64,
        title: &str,
        target: &Money,
        progress: Decimal,
        deadline: Option<NaiveDate>,
    ) -> Result<i64>;
    fn set_goal_progress(&self, owner: i64, id: i64, progress: Decimal) -> Result<bool>;
    fn delete_goal(&self, owner: i64, id: i64) -> Result<bool>;
}

fn dec(field: &'static str, s: &str) -> Result<Decimal> {
    s.trim().parse::<Decimal>().map_err(|_| EngineError::Corrupt {
        field,
        value: s.to_string(),
    })
}

fn date(field: &'static str, s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| EngineError::Corrupt {
        field,
        value: s.to_string(),
    })
}

const BILL_COLUMNS: &str = "id, user_id, title, amount, currency, due_date, status, recurring, anchor_day, category_id, description";

type RawBill = (
    i64,
    i64,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<u32>,
    Option<i64>,
    Option<String>,
);

fn bill_from_raw(raw: RawBill) -> Result<Bill> {
    let (
        id,
        user_id,
        title,
        amount,
        currency,
        due,
        status,
        recurring,
        anchor,
        category_id,
        description,
    ) = raw;
    let due_date = date("bills.due_date", &due)?;
    let status = BillStatus::parse(&status).unwrap_or_else(|| {
        warn!(bill = id, %status, "unknown bill status, treating as pending");
        BillStatus::Pending
    });
    Ok(Bill {
        id,
        user_id,
        title,
        amount: Money::new(dec("bills.amount", &amount)?, currency),
        due_date,
        status,
        recurring: Recurrence::parse(&recurring),
        anchor_day: anchor.unwrap_or_else(|| due_date.day()),
        category_id,
        description,
    })
}

fn raw_bill(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawBill> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
        r.get(8)?,
        r.get(9)?,
        r.get(10)?,
    ))
}

impl Store for Connection {
    fn user(&self, id: i64) -> Result<User> {
        self.query_row(
            "SELECT id, name, currency FROM users WHERE id=?1",
            params![id],
            |r| {
                Ok(User {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    currency: r.get(2)?,
                })
            },
        )
        .optional()?
        .ok_or(EngineError::NotFound { kind: "User", id })
    }

    fn insert_user(&self, name: &str, currency: &str) -> Result<i64> {
        self.execute(
            "INSERT INTO users(name, currency) VALUES (?1, ?2)",
            params![name, currency],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn bills_for_owner(&self, owner: i64) -> Result<Vec<Bill>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE user_id=?1 ORDER BY due_date ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![owner], raw_bill)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(bill_from_raw(row?)?);
        }
        Ok(out)
    }

    fn bill(&self, owner: i64, id: i64) -> Result<Option<Bill>> {
        let raw = self
            .query_row(
                &format!("SELECT {BILL_COLUMNS} FROM bills WHERE id=?1 AND user_id=?2"),
                params![id, owner],
                raw_bill,
            )
            .optional()?;
        raw.map(bill_from_raw).transpose()
    }

    fn insert_bill(&self, bill: &NewBill) -> Result<i64> {
        self.execute(
            "INSERT INTO bills(user_id, title, amount, currency, due_date, status, recurring, anchor_day, category_id, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                bill.user_id,
                bill.title,
                bill.amount.amount.to_string(),
                bill.amount.currency,
                bill.due_date.to_string(),
                bill.status.as_str(),
                bill.recurring.as_str(),
                bill.anchor_day,
                bill.category_id,
                bill.description
            ],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn mark_overdue(&self, owner: i64, id: i64) -> Result<bool> {
        let n = self.execute(
            "UPDATE bills SET status='overdue' WHERE id=?1 AND user_id=?2 AND status='pending'",
            params![id, owner],
        )?;
        Ok(n > 0)
    }

    fn mark_paid(&self, owner: i64, id: i64) -> Result<bool> {
        let n = self.execute(
            "UPDATE bills SET status='paid' WHERE id=?1 AND user_id=?2 AND status != 'paid'",
            params![id, owner],
        )?;
        Ok(n > 0)
    }

    fn delete_bill(&self, owner: i64, id: i64) -> Result<bool> {
        let n = self.execute(
            "DELETE FROM bills WHERE id=?1 AND user_id=?2",
            params![id, owner],
        )?;
        Ok(n > 0)
    }

    fn budgets_for_owner(&self, owner: i64) -> Result<Vec<Budget>> {
        let mut stmt = self.prepare(
            "SELECT id, user_id, category_id, amount, currency, start_date, end_date
             FROM budgets WHERE user_id=?1 ORDER BY start_date DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![owner], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, Option<i64>>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, String>(6)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, category_id, amount, currency, start, end) = row?;
            out.push(Budget {
                id,
                user_id,
                category_id,
                amount: Money::new(dec("budgets.amount", &amount)?, currency),
                start_date: date("budgets.start_date", &start)?,
                end_date: date("budgets.end_date", &end)?,
            });
        }
        Ok(out)
    }

    fn delete_budget(&self, owner: i64, id: i64) -> Result<bool> {
        let n = self.execute(
            "DELETE FROM budgets WHERE id=?1 AND user_id=?2",
            params![id, owner],
        )?;
        Ok(n > 0)
    }

    fn insert_budget(
        &self,
        owner: i64,
        category_id: Option<i64>,
        amount: &Money,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64> {
        self.execute(
            "INSERT INTO budgets(user_id, category_id, amount, currency, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                owner,
                category_id,
                amount.amount.to_string(),
                amount.currency,
                start.to_string(),
                end.to_string()
            ],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn expenses_between(
        &self,
        owner: i64,
        category: Option<i64>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let mut stmt = self.prepare_cached(
            "SELECT id, user_id, amount, currency, category_id, description, date
             FROM transactions
             WHERE user_id=?1 AND type='expense' AND date BETWEEN ?2 AND ?3
               AND (?4 IS NULL OR category_id=?4)
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map(
            params![owner, start.to_string(), end.to_string(), category],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, Option<i64>>(4)?,
                    r.get::<_, Option<String>>(5)?,
                    r.get::<_, String>(6)?,
                ))
            },
        )?;
        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, amount, currency, category_id, description, d) = row?;
            out.push(Transaction {
                id,
                user_id,
                kind: TxKind::Expense,
                amount: Money::new(dec("transactions.amount", &amount)?, currency),
                category_id,
                description,
                date: date("transactions.date", &d)?,
            });
        }
        Ok(out)
    }

    fn insert_transaction(
        &self,
        owner: i64,
        kind: TxKind,
        amount: &Money,
        category_id: Option<i64>,
        description: Option<&str>,
        date: NaiveDate,
    ) -> Result<i64> {
        self.execute(
            "INSERT INTO transactions(user_id, type, amount, currency, category_id, description, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                owner,
                kind.as_str(),
                amount.amount.to_string(),
                amount.currency,
                category_id,
                description,
                date.to_string()
            ],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn goals_for_owner(&self, owner: i64) -> Result<Vec<Goal>> {
        let mut stmt = self.prepare(
            "SELECT id, user_id, title, target_amount, currency, progress, deadline
             FROM goals WHERE user_id=?1
             ORDER BY deadline IS NULL, deadline ASC, created_at DESC, id ASC",
        )?;
        let rows = stmt.query_map(params![owner], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, String>(5)?,
                r.get::<_, Option<String>>(6)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, user_id, title, target, currency, progress, deadline) = row?;
            out.push(Goal {
                id,
                user_id,
                title,
                target_amount: Money::new(dec("goals.target_amount", &target)?, currency.clone()),
                progress: Money::new(dec("goals.progress", &progress)?, currency),
                deadline: deadline
                    .filter(|d| !d.trim().is_empty())
                    .map(|d| date("goals.deadline", &d))
                    .transpose()?,
            });
        }
        Ok(out)
    }

    fn insert_goal(
        &self,
        owner: i64,
        title: &str,
        target: &Money,
        progress: Decimal,
        deadline: Option<NaiveDate>,
    ) -> Result<i64> {
        self.execute(
            "INSERT INTO goals(user_id, title, target_amount, currency, progress, deadline)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                owner,
                title,
                target.amount.to_string(),
                target.currency,
                progress.to_string(),
                deadline.map(|d| d.to_string())
            ],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn set_goal_progress(&self, owner: i64, id: i64, progress: Decimal) -> Result<bool> {
        let n = self.execute(
            "UPDATE goals SET progress=?1 WHERE id=?2 AND user_id=?3",
            params![progress.to_string(), id, owner],
        )?;
        Ok(n > 0)
    }

    fn delete_goal(&self, owner: i64, id: i64) -> Result<bool> {
        let n = self.execute(
            "DELETE FROM goals WHERE id=?1 AND user_id=?2",
            params![id, owner],
        )?;
        Ok(n > 0)
    }
}

/// Last persisted exchange-rate snapshot, if any.
pub fn load_snapshot(conn: &Connection) -> Result<Option<RateSnapshot>> {
    let mut stmt = conn.prepare("SELECT base, quote, rate, fetched_at FROM fx_snapshot")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut base = None;
    let mut fetched_at = None;
    let mut rates = BTreeMap::new();
    for row in rows {
        let (b, quote, rate, at) = row?;
        let at = DateTime::parse_from_rfc3339(&at)
            .map_err(|_| EngineError::Corrupt {
                field: "fx_snapshot.fetched_at",
                value: at.clone(),
            })?
            .with_timezone(&Utc);
        rates.insert(quote, dec("fx_snapshot.rate", &rate)?);
        base = Some(b);
        fetched_at = Some(at);
    }
    match (base, fetched_at) {
        (Some(base), Some(at)) => Ok(Some(RateSnapshot::new(base, rates, at))),
        _ => Ok(None),
    }
}

/// Replaces the persisted snapshot with `snap`.
pub fn save_snapshot(conn: &Connection, snap: &RateSnapshot) -> Result<()> {
    let at = snap.fetched_at.to_rfc3339();
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM fx_snapshot", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO fx_snapshot(quote, base, rate, fetched_at) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (quote, rate) in &snap.rates {
            stmt.execute(params![quote, snap.base, rate.to_string(), at])?;
        }
    }
    tx.commit()?;
    Ok(())
}
