// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Ctx, amount_arg, currency_or, date_arg, id_arg};
use crate::api;
use crate::models::Money;
use crate::store::Store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Result, bail};
use tracing::info;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let (user, engine) = ctx.owner()?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let amount = amount_arg(sub, "amount")?;
            let ccy = currency_or(sub, &user.currency)?;
            let start = date_arg(sub, "start")?;
            let end = date_arg(sub, "end")?;
            if end < start {
                bail!("Budget ends ({}) before it starts ({})", end, start);
            }
            let category = sub.get_one::<i64>("category").copied();
            let money = Money::new(amount, ccy);
            let id = ctx
                .conn
                .insert_budget(user.id, category, &money, start, end)?;
            info!(budget = id, owner = user.id, "budget added");
            println!(
                "Added budget of {} for {}..{} (id {})",
                engine.format_money(&money),
                start,
                end,
                id
            );
        }
        Some(("list", _)) => {
            let views = api::budget_progress(ctx.conn, &engine, user.id, ctx.today).into_result()?;
            if maybe_print_json(ctx.json, &views)? {
                return Ok(());
            }
            let data = views
                .iter()
                .map(|v| {
                    let ccy = &v.budget.amount.currency;
                    vec![
                        v.budget.id.to_string(),
                        v.budget
                            .category_id
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "all".into()),
                        format!("{}..{}", v.budget.start_date, v.budget.end_date),
                        engine.format(v.budget.amount.amount, ccy),
                        engine.format(v.spent, ccy),
                        engine.format(v.remaining, ccy),
                        format!("{}%", v.progress.round_dp(1)),
                        format!("{:?}", v.status).to_lowercase(),
                        if v.is_active { "yes" } else { "no" }.into(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(
                    &[
                        "Id", "Category", "Period", "Budget", "Spent", "Remaining", "Progress",
                        "Status", "Active"
                    ],
                    data
                )
            );
        }
        Some(("overview", _)) => {
            let o = api::budgets_overview(ctx.conn, &engine, user.id, ctx.today).into_result()?;
            if maybe_print_json(ctx.json, &o)? {
                return Ok(());
            }
            let rows = vec![
                vec!["Budgets".into(), o.total_budgets.to_string()],
                vec!["Active".into(), o.active_budgets.to_string()],
                vec!["Budgeted".into(), engine.format(o.total_budget, &o.currency)],
                vec!["Spent".into(), engine.format(o.total_spent, &o.currency)],
                vec!["Remaining".into(), engine.format(o.remaining, &o.currency)],
                vec!["Progress".into(), format!("{}%", o.progress.round_dp(1))],
                vec![
                    "Good / warning / exceeded".into(),
                    format!("{} / {} / {}", o.good, o.warning, o.exceeded),
                ],
            ];
            println!("{}", pretty_table(&["Budgets", ""], rows));
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            if !ctx.conn.delete_budget(user.id, id)? {
                bail!("Budget {} not found", id);
            }
            info!(budget = id, owner = user.id, "budget removed");
            println!("Removed budget {}", id);
        }
        _ => {}
    }
    Ok(())
}
