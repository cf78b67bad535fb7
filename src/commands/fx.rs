// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Ctx;
use crate::api;
use crate::config::SymbolPosition;
use crate::engine::currency::{CurrencyEngine, convert_in};
use crate::engine::rates::RateSnapshot;
use crate::utils::{arg, maybe_print_json, opt_arg, pretty_table};
use anyhow::{Context, Result};
use chrono::Utc;
use rust_decimal::Decimal;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let engine = ctx.display_engine()?;
    match m.subcommand() {
        Some(("format", sub)) => {
            let ccy = opt_arg(sub, "currency").unwrap_or_else(|| engine.default_currency().into());
            let s = api::format_money(&engine, &arg(sub, "amount")?, &ccy).into_result()?;
            if !maybe_print_json(ctx.json, &s)? {
                println!("{}", s);
            }
        }
        Some(("parse", sub)) => {
            let ccy = opt_arg(sub, "currency").unwrap_or_else(|| engine.default_currency().into());
            let d = api::parse_money(&engine, &arg(sub, "text")?, &ccy).into_result()?;
            if !maybe_print_json(ctx.json, &d)? {
                println!("{}", d);
            }
        }
        Some(("convert", sub)) => {
            let (amount, from, to) = (arg(sub, "amount")?, arg(sub, "from")?, arg(sub, "to")?);
            let c = api::convert_money(&engine, &amount, &from, &to).into_result()?;
            if !maybe_print_json(ctx.json, &c)? {
                println!("{} = {}", engine.format(c.amount, &c.from), c.formatted);
            }
        }
        Some(("currencies", _)) => {
            let list = api::supported_currencies(&engine).into_result()?;
            if maybe_print_json(ctx.json, &list)? {
                return Ok(());
            }
            let data = list
                .iter()
                .map(|c| {
                    let p = c.profile;
                    vec![
                        format!("{}{}", p.code, if c.is_default { " *" } else { "" }),
                        p.name.to_string(),
                        p.symbol.to_string(),
                        match p.position {
                            SymbolPosition::Prefix => "prefix".into(),
                            SymbolPosition::Suffix => "suffix".into(),
                        },
                        p.decimals.to_string(),
                        engine.format(Decimal::new(123456789, 2), p.code),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(
                    &["Code", "Name", "Symbol", "Position", "Decimals", "Example"],
                    data
                )
            );
        }
        Some(("rates", _)) => {
            let snap = engine.snapshot();
            print_snapshot(ctx, &engine, &snap)?;
        }
        Some(("refresh", _)) => {
            let snap = ctx
                .rates
                .refresh_now(Utc::now())
                .context("Exchange rate refresh failed; cached rates left as they were")?;
            print_snapshot(ctx, &engine, &snap)?;
        }
        _ => {}
    }
    Ok(())
}

fn print_snapshot(ctx: &Ctx, engine: &CurrencyEngine, snap: &RateSnapshot) -> Result<()> {
    if maybe_print_json(ctx.json, snap)? {
        return Ok(());
    }
    println!(
        "Base {} as of {}{}",
        snap.base,
        snap.fetched_at.format("%Y-%m-%d %H:%M UTC"),
        if snap.is_fallback { " (fallback table)" } else { "" }
    );
    let home = engine.default_currency();
    let data = snap
        .rates
        .iter()
        .filter(|(code, _)| CurrencyEngine::is_supported(code))
        .map(|(code, rate)| {
            let one = convert_in(snap, Decimal::ONE, code, home);
            vec![
                code.clone(),
                rate.normalize().to_string(),
                engine.format(one, home),
            ]
        })
        .collect();
    let in_home = format!("1 unit in {}", home);
    println!(
        "{}",
        pretty_table(&["Code", "Per base", in_home.as_str()], data)
    );
    Ok(())
}
