// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Ctx;
use crate::config as settings;
use crate::utils::{arg, maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let cfg = &ctx.cfg;
            if maybe_print_json(ctx.json, cfg)? {
                return Ok(());
            }
            let rows = vec![
                vec!["default_currency".into(), cfg.default_currency.clone()],
                vec!["rate_base".into(), cfg.rate_base.clone()],
                vec!["rate_api_url".into(), cfg.rate_api_url.clone()],
                vec!["rate_refresh_secs".into(), cfg.rate_refresh_secs.to_string()],
                vec!["rate_timeout_secs".into(), cfg.rate_timeout_secs.to_string()],
                vec![
                    "rate_source_enabled".into(),
                    cfg.rate_source_enabled.to_string(),
                ],
            ];
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        Some(("set", sub)) => {
            let key = arg(sub, "key")?;
            let value = arg(sub, "value")?;
            settings::set(ctx.conn, &key, &value)?;
            println!("{} set to {}", key, value);
        }
        _ => {}
    }
    Ok(())
}
