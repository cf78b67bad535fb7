// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{Ctx, currency_or};
use crate::engine::currency::CurrencyEngine;
use crate::store::Store;
use crate::utils::{arg, maybe_print_json, pretty_table};
use anyhow::{Result, bail};

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = arg(sub, "name")?;
            if name.is_empty() {
                bail!("User name must not be empty");
            }
            let ccy = currency_or(sub, &ctx.cfg.default_currency)?;
            if !CurrencyEngine::is_supported(&ccy) {
                bail!("Unsupported currency '{}'", ccy);
            }
            let id = ctx.conn.insert_user(&name, &ccy)?;
            println!("Added user '{}' (id {}, {})", name, id, ccy);
        }
        Some(("show", _)) => {
            let (user, engine) = ctx.owner()?;
            if maybe_print_json(ctx.json, &user)? {
                return Ok(());
            }
            let display = match CurrencyEngine::profile(&user.currency) {
                Some(p) => format!("{} ({})", p.name, p.symbol),
                None => format!("unsupported, shown as {}", engine.default_currency()),
            };
            let rows = vec![vec![
                user.id.to_string(),
                user.name,
                user.currency.clone(),
                display,
            ]];
            println!(
                "{}",
                pretty_table(&["Id", "Name", "Currency", "Display"], rows)
            );
        }
        _ => {}
    }
    Ok(())
}
