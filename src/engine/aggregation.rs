// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget and goal progress, plus the per-owner overview totals.
//!
//! Overviews are built from the row views themselves so that every total is
//! exactly the sum of the rows shown next to it.

use crate::engine::currency::{CurrencyEngine, convert_in};
use crate::engine::obligations::BillView;
use crate::engine::rates::RateSnapshot;
use crate::error::Result;
use crate::models::{BillStatus, Budget, Goal, Money, Transaction};
use crate::store::Store;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Saturates at the `Decimal` bounds instead of overflowing.
fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|r| r.checked_mul(HUNDRED))
        .unwrap_or(if part.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
}

fn total(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Good,
    Warning,
    Exceeded,
}

/// 80 and 100 are inclusive lower bounds.
pub fn budget_status(progress: Decimal) -> BudgetStatus {
    if progress >= HUNDRED {
        BudgetStatus::Exceeded
    } else if progress >= Decimal::from(80) {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Good
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BudgetView {
    #[serde(flatten)]
    pub budget: Budget,
    /// In the budget's own currency.
    pub spent: Decimal,
    pub remaining: Decimal,
    pub progress: Decimal,
    pub status: BudgetStatus,
    pub is_active: bool,
    pub display_amount: Money,
    pub display_spent: Money,
}

/// Progress of one budget against the expenses that fall in it. Expenses in
/// other currencies are converted into the budget's currency first.
pub fn budget_progress(
    budget: Budget,
    expenses: &[Transaction],
    snap: &RateSnapshot,
    display_ccy: &str,
    today: NaiveDate,
) -> BudgetView {
    let ccy = budget.amount.currency.as_str();
    let spent = total(
        expenses
            .iter()
            .filter(|t| budget.category_id.is_none() || t.category_id == budget.category_id)
            .filter(|t| t.date >= budget.start_date && t.date <= budget.end_date)
            .map(|t| convert_in(snap, t.amount.amount, &t.amount.currency, ccy)),
    );
    let amount = budget.amount.amount;
    let progress = percent(spent, amount);
    let display_amount = Money::new(convert_in(snap, amount, ccy, display_ccy), display_ccy);
    let display_spent = Money::new(convert_in(snap, spent, ccy, display_ccy), display_ccy);
    let is_active = today >= budget.start_date && today <= budget.end_date;
    BudgetView {
        budget,
        spent,
        remaining: amount.saturating_sub(spent),
        progress,
        status: budget_status(progress),
        is_active,
        display_amount,
        display_spent,
    }
}

pub fn budgets_with_progress<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
) -> Result<Vec<BudgetView>> {
    let snap = engine.snapshot();
    let display_ccy = engine.default_currency();
    let mut out = Vec::new();
    for budget in store.budgets_for_owner(owner)? {
        let expenses =
            store.expenses_between(owner, budget.category_id, budget.start_date, budget.end_date)?;
        out.push(budget_progress(budget, &expenses, &snap, display_ccy, today));
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetsOverview {
    pub currency: String,
    pub total_budgets: usize,
    pub active_budgets: usize,
    pub total_budget: Decimal,
    pub total_spent: Decimal,
    pub remaining: Decimal,
    pub progress: Decimal,
    pub good: usize,
    pub warning: usize,
    pub exceeded: usize,
}

pub fn budgets_overview(views: &[BudgetView], display_ccy: &str) -> BudgetsOverview {
    let total_budget = total(views.iter().map(|v| v.display_amount.amount));
    let total_spent = total(views.iter().map(|v| v.display_spent.amount));
    let count = |s: BudgetStatus| views.iter().filter(|v| v.status == s).count();
    BudgetsOverview {
        currency: display_ccy.to_string(),
        total_budgets: views.len(),
        active_budgets: views.iter().filter(|v| v.is_active).count(),
        total_budget,
        total_spent,
        remaining: total_budget.saturating_sub(total_spent),
        progress: percent(total_spent, total_budget),
        good: count(BudgetStatus::Good),
        warning: count(BudgetStatus::Warning),
        exceeded: count(BudgetStatus::Exceeded),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Completed,
    Overdue,
    NearCompletion,
    InProgress,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    pub percentage: Decimal,
    pub remaining: Decimal,
    /// Whole days to the deadline, or since it when overdue.
    pub days_remaining: Option<i64>,
    pub is_overdue: bool,
    pub status: GoalStatus,
    pub display_target: Money,
    pub display_progress: Money,
}

pub fn goal_progress(
    goal: Goal,
    today: NaiveDate,
    snap: &RateSnapshot,
    display_ccy: &str,
) -> GoalView {
    let target = goal.target_amount.amount;
    let saved = goal.progress.amount;
    let percentage = percent(saved, target);
    let is_overdue = goal.deadline.is_some_and(|d| d < today);
    let days_remaining = goal.deadline.map(|d| (d - today).num_days().abs());

    let status = if percentage >= HUNDRED {
        GoalStatus::Completed
    } else if is_overdue {
        GoalStatus::Overdue
    } else if percentage >= Decimal::from(75) {
        GoalStatus::NearCompletion
    } else {
        GoalStatus::InProgress
    };

    let display_target = Money::new(
        convert_in(snap, target, &goal.target_amount.currency, display_ccy),
        display_ccy,
    );
    let display_progress = Money::new(
        convert_in(snap, saved, &goal.progress.currency, display_ccy),
        display_ccy,
    );
    GoalView {
        goal,
        percentage,
        remaining: target.saturating_sub(saved),
        days_remaining,
        is_overdue,
        status,
        display_target,
        display_progress,
    }
}

pub fn goals_with_progress<S: Store + ?Sized>(
    store: &S,
    engine: &CurrencyEngine,
    owner: i64,
    today: NaiveDate,
) -> Result<Vec<GoalView>> {
    let snap = engine.snapshot();
    let display_ccy = engine.default_currency();
    Ok(store
        .goals_for_owner(owner)?
        .into_iter()
        .map(|g| goal_progress(g, today, &snap, display_ccy))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalsOverview {
    pub currency: String,
    pub total_goals: usize,
    pub completed_goals: usize,
    pub overdue_goals: usize,
    pub near_completion_goals: usize,
    pub in_progress_goals: usize,
    pub total_target: Decimal,
    pub total_progress: Decimal,
    pub overall_progress: Decimal,
}

pub fn goals_overview(views: &[GoalView], display_ccy: &str) -> GoalsOverview {
    let count = |s: GoalStatus| views.iter().filter(|v| v.status == s).count();
    let total_target = total(views.iter().map(|v| v.display_target.amount));
    let total_progress = total(views.iter().map(|v| v.display_progress.amount));
    GoalsOverview {
        currency: display_ccy.to_string(),
        total_goals: views.len(),
        completed_goals: count(GoalStatus::Completed),
        overdue_goals: count(GoalStatus::Overdue),
        near_completion_goals: count(GoalStatus::NearCompletion),
        in_progress_goals: count(GoalStatus::InProgress),
        total_target,
        total_progress,
        overall_progress: percent(total_progress, total_target),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillsOverview {
    pub currency: String,
    pub total_bills: usize,
    pub paid_bills: usize,
    pub pending_bills: usize,
    pub overdue_bills: usize,
    pub total_outstanding: Decimal,
    pub total_paid: Decimal,
}

/// Expects views that already carry the corrected status.
pub fn bills_overview(views: &[BillView], display_ccy: &str) -> BillsOverview {
    let count = |s: BillStatus| views.iter().filter(|v| v.bill.status == s).count();
    let sum = |paid: bool| {
        total(
            views
                .iter()
                .filter(|v| (v.bill.status == BillStatus::Paid) == paid)
                .map(|v| v.display_amount.amount),
        )
    };
    BillsOverview {
        currency: display_ccy.to_string(),
        total_bills: views.len(),
        paid_bills: count(BillStatus::Paid),
        pending_bills: count(BillStatus::Pending),
        overdue_bills: count(BillStatus::Overdue),
        total_outstanding: sum(false),
        total_paid: sum(true),
    }
}
