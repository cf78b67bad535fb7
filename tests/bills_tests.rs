// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::api;
use billfold::db::init_schema;
use billfold::engine::currency::CurrencyEngine;
use billfold::engine::rates::{DisabledSource, RateCache, RateSnapshot};
use billfold::error::Result as StoreResult;
use billfold::models::{Bill, BillStatus, Budget, Goal, Money, NewBill, Recurrence, Transaction, TxKind, User};
use billfold::store::Store;
use chrono::{Datelike, NaiveDate, Utc};
use std::cell::Cell;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> (Connection, i64) {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    let owner = conn.insert_user("Ana", "USD").unwrap();
    (conn, owner)
}

fn engine() -> CurrencyEngine {
    let mut rates = BTreeMap::new();
    rates.insert("EUR".to_string(), Decimal::new(5, 1));
    rates.insert("PHP".to_string(), Decimal::from(50));
    let cache = RateCache::new(
        DisabledSource,
        "USD",
        chrono::Duration::days(36500),
        BTreeMap::new(),
    )
    .with_snapshot(RateSnapshot::new("USD", rates, Utc::now()));
    CurrencyEngine::new(Arc::new(cache), "USD")
}

fn add_bill(
    conn: &Connection,
    owner: i64,
    title: &str,
    amount: i64,
    ccy: &str,
    due: NaiveDate,
    recurring: Recurrence,
) -> i64 {
    conn.insert_bill(&NewBill {
        user_id: owner,
        title: title.into(),
        amount: Money::new(Decimal::from(amount), ccy),
        due_date: due,
        status: BillStatus::Pending,
        recurring,
        anchor_day: due.day(),
        category_id: None,
        description: None,
    })
    .unwrap()
}

fn stored_status(conn: &Connection, id: i64) -> String {
    conn.query_row("SELECT status FROM bills WHERE id=?1", params![id], |r| {
        r.get(0)
    })
    .unwrap()
}

fn bill_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM bills", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn past_due_pending_bill_is_corrected_and_persisted() {
    let (conn, owner) = setup();
    let id = add_bill(&conn, owner, "Power", 80, "USD", ymd(2024, 1, 10), Recurrence::None);
    let today = ymd(2024, 1, 20);

    let views = api::list_bills(&conn, &engine(), owner, today)
        .into_result()
        .unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].bill.status, BillStatus::Overdue);
    assert!(views[0].is_overdue);
    assert_eq!(views[0].days_until_due, 10);
    assert_eq!(stored_status(&conn, id), "overdue");

    // a second read changes nothing
    let again = api::bill_status(&conn, &engine(), owner, id, today)
        .into_result()
        .unwrap();
    assert_eq!(again.bill.status, BillStatus::Overdue);
    assert_eq!(stored_status(&conn, id), "overdue");
}

#[test]
fn bill_due_today_is_not_overdue() {
    let (conn, owner) = setup();
    let id = add_bill(&conn, owner, "Net", 30, "USD", ymd(2024, 1, 20), Recurrence::None);
    let v = api::bill_status(&conn, &engine(), owner, id, ymd(2024, 1, 20))
        .into_result()
        .unwrap();
    assert_eq!(v.bill.status, BillStatus::Pending);
    assert!(!v.is_overdue);
    assert_eq!(v.days_until_due, 0);
    assert_eq!(stored_status(&conn, id), "pending");
}

#[test]
fn paid_bill_never_turns_overdue() {
    let (conn, owner) = setup();
    let id = add_bill(&conn, owner, "Water", 20, "USD", ymd(2024, 1, 1), Recurrence::None);
    conn.mark_paid(owner, id).unwrap();
    let v = api::bill_status(&conn, &engine(), owner, id, ymd(2024, 3, 1))
        .into_result()
        .unwrap();
    assert_eq!(v.bill.status, BillStatus::Paid);
    assert!(!v.is_overdue);
    assert_eq!(stored_status(&conn, id), "paid");
}

#[test]
fn paying_yearly_bill_schedules_exactly_one_next() {
    let (conn, owner) = setup();
    let id = add_bill(&conn, owner, "Insurance", 600, "USD", ymd(2024, 6, 1), Recurrence::Yearly);

    let out = api::mark_paid(&conn, owner, id);
    assert!(out.success);
    assert_eq!(out.message.as_deref(), Some("Bill marked as paid successfully"));
    let paid = out.data.unwrap();
    assert!(!paid.already_paid);
    assert_eq!(paid.next_due_date, Some(ymd(2025, 6, 1)));
    assert_eq!(bill_count(&conn), 2);

    let next = conn.bill(owner, paid.next_bill_id.unwrap()).unwrap().unwrap();
    assert_eq!(next.status, BillStatus::Pending);
    assert_eq!(next.title, "Insurance");
    assert_eq!(next.recurring, Recurrence::Yearly);

    // paying again is a no-op
    let again = api::mark_paid(&conn, owner, id);
    assert!(again.success);
    assert_eq!(again.message.as_deref(), Some("Bill was already paid"));
    assert!(again.data.unwrap().already_paid);
    assert_eq!(bill_count(&conn), 2);
}

#[test]
fn paying_overdue_monthly_bill_keeps_anchor() {
    let (conn, owner) = setup();
    let id = add_bill(&conn, owner, "Rent", 1000, "USD", ymd(2024, 1, 31), Recurrence::Monthly);
    api::list_bills(&conn, &engine(), owner, ymd(2024, 2, 5));
    assert_eq!(stored_status(&conn, id), "overdue");

    let feb = api::mark_paid(&conn, owner, id).data.unwrap();
    assert_eq!(feb.next_due_date, Some(ymd(2024, 2, 29)));
    let mar = api::mark_paid(&conn, owner, feb.next_bill_id.unwrap())
        .data
        .unwrap();
    assert_eq!(mar.next_due_date, Some(ymd(2024, 3, 31)));
}

#[test]
fn one_off_bill_spawns_nothing() {
    let (conn, owner) = setup();
    let id = add_bill(&conn, owner, "Repair", 150, "USD", ymd(2024, 6, 1), Recurrence::None);
    let paid = api::mark_paid(&conn, owner, id).data.unwrap();
    assert_eq!(paid.next_bill_id, None);
    assert_eq!(paid.next_occurrence_error, None);
    assert_eq!(bill_count(&conn), 1);
}

#[test]
fn failed_next_insert_leaves_bill_paid() {
    let (conn, owner) = setup();
    let id = add_bill(&conn, owner, "Gym", 40, "USD", ymd(2024, 6, 1), Recurrence::Monthly);
    conn.execute_batch(
        "CREATE TRIGGER block_bills BEFORE INSERT ON bills
         BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
    )
    .unwrap();

    let out = api::mark_paid(&conn, owner, id);
    assert!(out.success);
    let paid = out.data.unwrap();
    assert_eq!(paid.next_bill_id, None);
    assert!(paid.next_occurrence_error.unwrap().contains("blocked"));
    assert_eq!(stored_status(&conn, id), "paid");
    assert_eq!(bill_count(&conn), 1);
}

#[test]
fn unknown_interval_is_paid_without_follow_up() {
    let (conn, owner) = setup();
    conn.execute(
        "INSERT INTO bills(user_id, title, amount, currency, due_date, recurring)
         VALUES (?1, 'Odd', '10', 'USD', '2024-06-01', 'weekly')",
        params![owner],
    )
    .unwrap();
    let id = conn.last_insert_rowid();

    let paid = api::mark_paid(&conn, owner, id).data.unwrap();
    assert_eq!(paid.next_bill_id, None);
    assert_eq!(paid.next_occurrence_error, None);
    assert_eq!(stored_status(&conn, id), "paid");
    assert_eq!(
        api::next_occurrence(&conn, owner, id).into_result().unwrap(),
        None
    );
}

#[test]
fn unknown_stored_status_reads_as_pending() {
    let (conn, owner) = setup();
    conn.execute(
        "INSERT INTO bills(user_id, title, amount, currency, due_date, status)
         VALUES (?1, 'Legacy', '10', 'USD', '2030-01-01', 'scheduled')",
        params![owner],
    )
    .unwrap();
    let views = api::list_bills(&conn, &engine(), owner, ymd(2024, 1, 1))
        .into_result()
        .unwrap();
    assert_eq!(views[0].bill.status, BillStatus::Pending);
    assert_eq!(views[0].bill.anchor_day, 1);
}

#[test]
fn bills_are_scoped_to_their_owner() {
    let (conn, owner) = setup();
    let other = conn.insert_user("Ben", "EUR").unwrap();
    let id = add_bill(&conn, owner, "Phone", 25, "USD", ymd(2024, 6, 1), Recurrence::None);

    let out = api::mark_paid(&conn, other, id);
    assert!(!out.success);
    assert_eq!(out.message.as_deref(), Some(format!("Bill {} not found", id).as_str()));
    assert_eq!(stored_status(&conn, id), "pending");

    let missing = api::bill_status(&conn, &engine(), other, id, ymd(2024, 1, 1));
    assert!(!missing.success);
    assert!(api::list_bills(&conn, &engine(), other, ymd(2024, 1, 1))
        .into_result()
        .unwrap()
        .is_empty());
}

#[test]
fn upcoming_window_is_inclusive_and_unpaid_only() {
    let (conn, owner) = setup();
    let today = ymd(2024, 6, 1);
    add_bill(&conn, owner, "Past", 1, "USD", ymd(2024, 5, 31), Recurrence::None);
    add_bill(&conn, owner, "Today", 2, "USD", today, Recurrence::None);
    add_bill(&conn, owner, "Edge", 3, "USD", ymd(2024, 6, 8), Recurrence::None);
    add_bill(&conn, owner, "Beyond", 4, "USD", ymd(2024, 6, 9), Recurrence::None);
    let paid = add_bill(&conn, owner, "Settled", 5, "USD", ymd(2024, 6, 3), Recurrence::None);
    conn.mark_paid(owner, paid).unwrap();

    let titles: Vec<String> = api::upcoming_bills(&conn, &engine(), owner, today, 7)
        .into_result()
        .unwrap()
        .into_iter()
        .map(|v| v.bill.title)
        .collect();
    assert_eq!(titles, vec!["Today".to_string(), "Edge".to_string()]);
}

#[test]
fn overview_totals_are_in_owner_currency() {
    let (conn, owner) = setup();
    let today = ymd(2024, 6, 1);
    add_bill(&conn, owner, "Late", 10, "EUR", ymd(2024, 5, 1), Recurrence::None);
    add_bill(&conn, owner, "Soon", 500, "PHP", ymd(2024, 6, 10), Recurrence::None);
    let paid = add_bill(&conn, owner, "Done", 7, "USD", ymd(2024, 5, 20), Recurrence::None);
    conn.mark_paid(owner, paid).unwrap();

    let o = api::bills_overview(&conn, &engine(), owner, today)
        .into_result()
        .unwrap();
    assert_eq!(o.currency, "USD");
    assert_eq!(o.total_bills, 3);
    assert_eq!(o.paid_bills, 1);
    assert_eq!(o.pending_bills, 1);
    assert_eq!(o.overdue_bills, 1);
    // 10 EUR = 20 USD, 500 PHP = 10 USD
    assert_eq!(o.total_outstanding, Decimal::from(30));
    assert_eq!(o.total_paid, Decimal::from(7));
}

#[test]
fn views_format_in_bill_currency() {
    let (conn, owner) = setup();
    let id = add_bill(&conn, owner, "Tuition", 1234, "EUR", ymd(2024, 9, 1), Recurrence::None);
    let v = api::bill_status(&conn, &engine(), owner, id, ymd(2024, 6, 1))
        .into_result()
        .unwrap();
    assert_eq!(v.formatted_amount, "€1.234,00");
    assert_eq!(v.display_amount, Money::new(Decimal::from(2468), "USD"));
}

#[test]
fn upcoming_window_past_the_calendar_end_is_clamped() {
    let (conn, owner) = setup();
    add_bill(&conn, owner, "Rent", 900, "USD", ymd(2024, 2, 1), Recurrence::None);
    let out = api::upcoming_bills(&conn, &engine(), owner, ymd(2024, 1, 1), u32::MAX);
    assert!(out.success);
    assert_eq!(out.data.unwrap().len(), 1);
}

/// Reads the bill, then lets another payment of the same bill finish before
/// handing back the now stale row.
struct RacingPayer<'a> {
    conn: &'a Connection,
    raced: Cell<bool>,
}

impl Store for RacingPayer<'_> {
    fn user(&self, id: i64) -> StoreResult<User> {
        self.conn.user(id)
    }
    fn insert_user(&self, name: &str, currency: &str) -> StoreResult<i64> {
        self.conn.insert_user(name, currency)
    }
    fn bills_for_owner(&self, owner: i64) -> StoreResult<Vec<Bill>> {
        self.conn.bills_for_owner(owner)
    }
    fn bill(&self, owner: i64, id: i64) -> StoreResult<Option<Bill>> {
        let read = self.conn.bill(owner, id)?;
        if !self.raced.replace(true) {
            let other = api::mark_paid(self.conn, owner, id).data.unwrap();
            assert!(!other.already_paid);
        }
        Ok(read)
    }
    fn insert_bill(&self, bill: &NewBill) -> StoreResult<i64> {
        self.conn.insert_bill(bill)
    }
    fn mark_overdue(&self, owner: i64, id: i64) -> StoreResult<bool> {
        self.conn.mark_overdue(owner, id)
    }
    fn mark_paid(&self, owner: i64, id: i64) -> StoreResult<bool> {
        self.conn.mark_paid(owner, id)
    }
    fn delete_bill(&self, owner: i64, id: i64) -> StoreResult<bool> {
        self.conn.delete_bill(owner, id)
    }
    fn budgets_for_owner(&self, owner: i64) -> StoreResult<Vec<Budget>> {
        self.conn.budgets_for_owner(owner)
    }
    fn delete_budget(&self, owner: i64, id: i64) -> StoreResult<bool> {
        self.conn.delete_budget(owner, id)
    }
    fn insert_budget(
        &self,
        owner: i64,
        category_id: Option<i64>,
        amount: &Money,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<i64> {
        self.conn.insert_budget(owner, category_id, amount, start, end)
    }
    fn expenses_between(
        &self,
        owner: i64,
        category: Option<i64>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Transaction>> {
        self.conn.expenses_between(owner, category, start, end)
    }
    fn insert_transaction(
        &self,
        owner: i64,
        kind: TxKind,
        amount: &Money,
        category_id: Option<i64>,
        description: Option<&str>,
        date: NaiveDate,
    ) -> StoreResult<i64> {
        self.conn
            .insert_transaction(owner, kind, amount, category_id, description, date)
    }
    fn goals_for_owner(&self, owner: i64) -> StoreResult<Vec<Goal>> {
        self.conn.goals_for_owner(owner)
    }
    fn insert_goal(
        &self,
        owner: i64,
        title: &str,
        target: &Money,
        progress: Decimal,
        deadline: Option<NaiveDate>,
    ) -> StoreResult<i64> {
        self.conn.insert_goal(owner, title, target, progress, deadline)
    }
    fn set_goal_progress(&self, owner: i64, id: i64, progress: Decimal) -> StoreResult<bool> {
        self.conn.set_goal_progress(owner, id, progress)
    }
    fn delete_goal(&self, owner: i64, id: i64) -> StoreResult<bool> {
        self.conn.delete_goal(owner, id)
    }
}

#[test]
fn overlapping_payments_schedule_one_next_bill() {
    let (conn, owner) = setup();
    let id = add_bill(&conn, owner, "Internet", 60, "USD", ymd(2024, 6, 1), Recurrence::Monthly);
    let racing = RacingPayer {
        conn: &conn,
        raced: Cell::new(false),
    };

    let out = api::mark_paid(&racing, owner, id);
    assert!(out.success);
    assert_eq!(out.message.as_deref(), Some("Bill was already paid"));
    let late = out.data.unwrap();
    assert!(late.already_paid);
    assert_eq!(late.next_bill_id, None);
    assert_eq!(bill_count(&conn), 2);
}

#[test]
fn next_date_past_the_calendar_end_is_reported() {
    let (conn, owner) = setup();
    let last_year = ymd(NaiveDate::MAX.year(), 6, 1);
    let id = add_bill(&conn, owner, "Far", 1, "USD", last_year, Recurrence::Yearly);

    let paid = api::mark_paid(&conn, owner, id).data.unwrap();
    assert!(!paid.already_paid);
    assert_eq!(paid.next_bill_id, None);
    assert!(paid.next_occurrence_error.is_some());
    assert_eq!(stored_status(&conn, id), "paid");
    assert_eq!(bill_count(&conn), 1);
}
