// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Ctx, amount_arg, currency_or, id_arg};
use crate::api;
use crate::models::Money;
use crate::store::Store;
use crate::utils::{arg, maybe_print_json, opt_arg, pretty_table};
use anyhow::{Result, bail};
use rust_decimal::Decimal;
use tracing::info;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let (user, engine) = ctx.owner()?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let title = arg(sub, "title")?;
            if title.is_empty() {
                bail!("Goal title must not be empty");
            }
            let target = amount_arg(sub, "target")?;
            let ccy = currency_or(sub, &user.currency)?;
            let progress = match opt_arg(sub, "progress") {
                Some(_) => amount_arg(sub, "progress")?,
                None => Decimal::ZERO,
            };
            let deadline = opt_arg(sub, "deadline")
                .map(|d| api::parse_date(&d))
                .transpose()?;
            let money = Money::new(target, ccy);
            let id = ctx
                .conn
                .insert_goal(user.id, &title, &money, progress, deadline)?;
            info!(goal = id, owner = user.id, "goal added");
            println!(
                "Added goal '{}' targeting {} (id {})",
                title,
                engine.format_money(&money),
                id
            );
        }
        Some(("list", _)) => {
            let views = api::goal_progress(ctx.conn, &engine, user.id, ctx.today).into_result()?;
            if maybe_print_json(ctx.json, &views)? {
                return Ok(());
            }
            let data = views
                .iter()
                .map(|v| {
                    vec![
                        v.goal.id.to_string(),
                        v.goal.title.clone(),
                        engine.format_money(&v.goal.progress),
                        engine.format_money(&v.goal.target_amount),
                        format!("{}%", v.percentage.round_dp(1)),
                        v.goal
                            .deadline
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "-".into()),
                        match (v.days_remaining, v.is_overdue) {
                            (Some(n), true) => format!("{} days late", n),
                            (Some(n), false) => format!("{} days left", n),
                            (None, _) => "-".into(),
                        },
                        format!("{:?}", v.status),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(
                    &["Id", "Title", "Saved", "Target", "Progress", "Deadline", "Time", "Status"],
                    data
                )
            );
        }
        Some(("progress", sub)) => {
            let id = id_arg(sub)?;
            let amount = amount_arg(sub, "amount")?;
            if !ctx.conn.set_goal_progress(user.id, id, amount)? {
                bail!("Goal {} not found", id);
            }
            println!("Goal {} progress set to {}", id, amount);
        }
        Some(("overview", _)) => {
            let o = api::goals_overview(ctx.conn, &engine, user.id, ctx.today).into_result()?;
            if maybe_print_json(ctx.json, &o)? {
                return Ok(());
            }
            let rows = vec![
                vec!["Goals".into(), o.total_goals.to_string()],
                vec!["Completed".into(), o.completed_goals.to_string()],
                vec!["Overdue".into(), o.overdue_goals.to_string()],
                vec!["Near completion".into(), o.near_completion_goals.to_string()],
                vec!["In progress".into(), o.in_progress_goals.to_string()],
                vec!["Target".into(), engine.format(o.total_target, &o.currency)],
                vec!["Saved".into(), engine.format(o.total_progress, &o.currency)],
                vec!["Overall".into(), format!("{}%", o.overall_progress.round_dp(1))],
            ];
            println!("{}", pretty_table(&["Goals", ""], rows));
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            if !ctx.conn.delete_goal(user.id, id)? {
                bail!("Goal {} not found", id);
            }
            info!(goal = id, owner = user.id, "goal removed");
            println!("Removed goal {}", id);
        }
        _ => {}
    }
    Ok(())
}
