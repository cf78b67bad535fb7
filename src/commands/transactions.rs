// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Ctx, amount_arg, currency_or, date_arg};
use crate::models::{Money, TxKind};
use crate::store::Store;
use crate::utils::{arg, opt_arg};
use anyhow::{Result, anyhow};
use tracing::info;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("add", sub)) = m.subcommand() {
        let (user, engine) = ctx.owner()?;
        let raw_kind = arg(sub, "type")?;
        let kind = TxKind::parse(&raw_kind)
            .ok_or_else(|| anyhow!("Invalid transaction type '{}'", raw_kind))?;
        let amount = amount_arg(sub, "amount")?;
        let ccy = currency_or(sub, &user.currency)?;
        let date = date_arg(sub, "date")?;
        let category = sub.get_one::<i64>("category").copied();
        let description = opt_arg(sub, "description");

        let money = Money::new(amount, ccy);
        let id = ctx.conn.insert_transaction(
            user.id,
            kind,
            &money,
            category,
            description.as_deref(),
            date,
        )?;
        info!(tx = id, owner = user.id, kind = kind.as_str(), "transaction recorded");
        println!(
            "Recorded {} of {} on {} (id {})",
            kind.as_str(),
            engine.format_money(&money),
            date,
            id
        );
    }
    Ok(())
}
