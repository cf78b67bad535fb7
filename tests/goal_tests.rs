// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::api;
use billfold::db::init_schema;
use billfold::engine::aggregation::{GoalStatus, goal_progress};
use billfold::engine::currency::CurrencyEngine;
use billfold::engine::rates::{DisabledSource, RateCache, RateSnapshot};
use billfold::models::{Goal, Money};
use billfold::store::Store;
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn snapshot() -> RateSnapshot {
    let mut rates = BTreeMap::new();
    rates.insert("EUR".to_string(), d("0.5"));
    RateSnapshot::new("USD", rates, Utc::now())
}

fn engine() -> CurrencyEngine {
    let cache = RateCache::new(
        DisabledSource,
        "USD",
        chrono::Duration::days(36500),
        BTreeMap::new(),
    )
    .with_snapshot(snapshot());
    CurrencyEngine::new(Arc::new(cache), "USD")
}

fn goal(target: &str, saved: &str, deadline: Option<NaiveDate>) -> Goal {
    Goal {
        id: 1,
        user_id: 1,
        title: "Trip".into(),
        target_amount: Money::new(d(target), "USD"),
        progress: Money::new(d(saved), "USD"),
        deadline,
    }
}

fn status(g: Goal, today: NaiveDate) -> GoalStatus {
    goal_progress(g, today, &snapshot(), "USD").status
}

#[test]
fn reaching_target_completes_goal() {
    let v = goal_progress(goal("1000", "1000", None), ymd(2024, 1, 1), &snapshot(), "USD");
    assert_eq!(v.percentage, d("100"));
    assert_eq!(v.remaining, Decimal::ZERO);
    assert_eq!(v.status, GoalStatus::Completed);
    assert_eq!(v.days_remaining, None);
}

#[test]
fn completion_wins_over_missed_deadline() {
    let today = ymd(2024, 6, 1);
    assert_eq!(
        status(goal("100", "150", Some(ymd(2024, 1, 1))), today),
        GoalStatus::Completed
    );
    assert_eq!(
        status(goal("100", "99", Some(ymd(2024, 1, 1))), today),
        GoalStatus::Overdue
    );
}

#[test]
fn near_completion_starts_at_three_quarters() {
    let today = ymd(2024, 6, 1);
    let later = Some(ymd(2025, 1, 1));
    assert_eq!(status(goal("100", "75", later), today), GoalStatus::NearCompletion);
    assert_eq!(
        status(goal("100", "74.99", later), today),
        GoalStatus::InProgress
    );
    assert_eq!(status(goal("100", "0", None), today), GoalStatus::InProgress);
}

#[test]
fn days_remaining_is_absolute() {
    let today = ymd(2024, 6, 11);
    let ahead = goal_progress(goal("100", "10", Some(ymd(2024, 6, 21))), today, &snapshot(), "USD");
    assert_eq!(ahead.days_remaining, Some(10));
    assert!(!ahead.is_overdue);

    let behind = goal_progress(goal("100", "10", Some(ymd(2024, 6, 1))), today, &snapshot(), "USD");
    assert_eq!(behind.days_remaining, Some(10));
    assert!(behind.is_overdue);

    let due_today = goal_progress(goal("100", "10", Some(today)), today, &snapshot(), "USD");
    assert!(!due_today.is_overdue);
}

#[test]
fn zero_target_has_zero_percentage() {
    let v = goal_progress(goal("0", "50", None), ymd(2024, 1, 1), &snapshot(), "USD");
    assert_eq!(v.percentage, Decimal::ZERO);
    assert_eq!(v.status, GoalStatus::InProgress);
}

#[test]
fn overview_counts_and_converts() {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    let owner = conn.insert_user("Ana", "USD").unwrap();
    let today = ymd(2024, 6, 1);

    conn.insert_goal(owner, "Car", &Money::new(d("100"), "EUR"), d("100"), None)
        .unwrap();
    conn.insert_goal(owner, "House", &Money::new(d("300"), "USD"), d("30"), Some(ymd(2024, 1, 1)))
        .unwrap();
    let bike = conn
        .insert_goal(owner, "Bike", &Money::new(d("100"), "USD"), d("0"), None)
        .unwrap();
    assert!(conn.set_goal_progress(owner, bike, d("80")).unwrap());

    let views = api::goal_progress(&conn, &engine(), owner, today)
        .into_result()
        .unwrap();
    assert_eq!(views.len(), 3);
    // deadline first
    assert_eq!(views[0].goal.title, "House");

    let o = api::goals_overview(&conn, &engine(), owner, today)
        .into_result()
        .unwrap();
    assert_eq!(o.total_goals, 3);
    assert_eq!(o.completed_goals, 1);
    assert_eq!(o.overdue_goals, 1);
    assert_eq!(o.near_completion_goals, 1);
    assert_eq!(o.in_progress_goals, 0);
    // 100 EUR = 200 USD
    assert_eq!(o.total_target, d("600"));
    assert_eq!(o.total_progress, d("310"));
}

#[test]
fn progress_update_is_owner_scoped() {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    let owner = conn.insert_user("Ana", "USD").unwrap();
    let other = conn.insert_user("Ben", "USD").unwrap();
    let id = conn
        .insert_goal(owner, "Car", &Money::new(d("100"), "USD"), d("0"), None)
        .unwrap();
    assert!(!conn.set_goal_progress(other, id, d("50")).unwrap());
    let g = &conn.goals_for_owner(owner).unwrap()[0];
    assert_eq!(g.progress.amount, Decimal::ZERO);
}
