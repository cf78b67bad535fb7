// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Ctx, amount_arg, currency_or, date_arg, id_arg, relative_days};
use crate::api;
use crate::engine::currency::CurrencyEngine;
use crate::engine::obligations::BillView;
use crate::models::{BillStatus, Money, NewBill, Recurrence};
use crate::store::Store;
use crate::utils::{arg, maybe_print_json, opt_arg, pretty_table};
use anyhow::{Result, bail};
use chrono::{Datelike, NaiveDate};
use tracing::info;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let (user, engine) = ctx.owner()?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let title = arg(sub, "title")?;
            if title.is_empty() {
                bail!("Bill title must not be empty");
            }
            let amount = amount_arg(sub, "amount")?;
            let ccy = currency_or(sub, &user.currency)?;
            let due = date_arg(sub, "due")?;
            let recurring = Recurrence::parse(&arg(sub, "recurring")?);
            if let Recurrence::Unrecognized(raw) = &recurring {
                bail!(
                    "Unknown recurrence '{}', expected none, monthly, quarterly or yearly",
                    raw
                );
            }
            let bill = NewBill {
                user_id: user.id,
                title,
                amount: Money::new(amount, ccy),
                due_date: due,
                status: BillStatus::Pending,
                recurring,
                anchor_day: due.day(),
                category_id: sub.get_one::<i64>("category").copied(),
                description: opt_arg(sub, "description"),
            };
            let id = ctx.conn.insert_bill(&bill)?;
            info!(bill = id, owner = user.id, "bill added");
            println!(
                "Added bill '{}' for {} due {} (id {})",
                bill.title,
                engine.format_money(&bill.amount),
                bill.due_date,
                id
            );
        }
        Some(("list", _)) => {
            let views = api::list_bills(ctx.conn, &engine, user.id, ctx.today).into_result()?;
            print_views(ctx, &engine, &views)?;
        }
        Some(("upcoming", sub)) => {
            let days = sub.get_one::<u32>("days").copied().unwrap_or(30);
            let views = api::upcoming_bills(ctx.conn, &engine, user.id, ctx.today, days)
                .into_result()?;
            print_views(ctx, &engine, &views)?;
        }
        Some(("status", sub)) => {
            let view = api::bill_status(ctx.conn, &engine, user.id, id_arg(sub)?, ctx.today)
                .into_result()?;
            print_views(ctx, &engine, std::slice::from_ref(&view))?;
        }
        Some(("overview", _)) => {
            let o = api::bills_overview(ctx.conn, &engine, user.id, ctx.today).into_result()?;
            if maybe_print_json(ctx.json, &o)? {
                return Ok(());
            }
            let rows = vec![
                vec!["Bills".into(), o.total_bills.to_string()],
                vec!["Paid".into(), o.paid_bills.to_string()],
                vec!["Pending".into(), o.pending_bills.to_string()],
                vec!["Overdue".into(), o.overdue_bills.to_string()],
                vec![
                    "Outstanding".into(),
                    engine.format(o.total_outstanding, &o.currency),
                ],
                vec!["Paid total".into(), engine.format(o.total_paid, &o.currency)],
            ];
            println!("{}", pretty_table(&["Bills", ""], rows));
        }
        Some(("pay", sub)) => {
            let outcome = api::mark_paid(ctx.conn, user.id, id_arg(sub)?);
            if maybe_print_json(ctx.json, &outcome)? {
                if !outcome.success {
                    bail!(outcome.message.unwrap_or_default());
                }
                return Ok(());
            }
            let message = outcome.message.clone().unwrap_or_default();
            let paid = outcome.into_result()?;
            println!("{}", message);
            if let (Some(id), Some(due)) = (paid.next_bill_id, paid.next_due_date) {
                println!("Next occurrence scheduled for {} (id {})", due, id);
            }
            if let Some(err) = paid.next_occurrence_error {
                eprintln!("warning: next occurrence was not created: {}", err);
            }
        }
        Some(("next", sub)) => {
            let next = api::next_occurrence(ctx.conn, user.id, id_arg(sub)?).into_result()?;
            if maybe_print_json(ctx.json, &next)? {
                return Ok(());
            }
            match next {
                Some(b) => println!(
                    "Next '{}' for {} would be due {}",
                    b.title,
                    engine.format_money(&b.amount),
                    b.due_date
                ),
                None => println!("Bill does not recur"),
            }
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            if !ctx.conn.delete_bill(user.id, id)? {
                bail!("Bill {} not found", id);
            }
            println!("Removed bill {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn print_views(ctx: &Ctx, engine: &CurrencyEngine, views: &[BillView]) -> Result<()> {
    if maybe_print_json(ctx.json, &views)? {
        return Ok(());
    }
    let data = views
        .iter()
        .map(|v| {
            vec![
                v.bill.id.to_string(),
                v.bill.title.clone(),
                v.formatted_amount.clone(),
                engine.format_money(&v.display_amount),
                v.bill.due_date.to_string(),
                due_label(v.bill.due_date, ctx.today, v.bill.status),
                v.bill.status.to_string(),
                v.bill.recurring.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Title", "Amount", "Display", "Due", "When", "Status", "Repeats"],
            data
        )
    );
    Ok(())
}

fn due_label(due: NaiveDate, today: NaiveDate, status: BillStatus) -> String {
    if status == BillStatus::Paid {
        "-".into()
    } else {
        relative_days(due, today)
    }
}
