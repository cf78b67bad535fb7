// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Ctx;
use crate::utils::{arg, maybe_print_json, pretty_table};
use anyhow::{Result, bail};
use rusqlite::params;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct Category {
    id: i64,
    name: String,
}

pub fn handle(ctx: &Ctx, m: &clap::ArgMatches) -> Result<()> {
    let (user, _) = ctx.owner()?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = arg(sub, "name")?;
            if name.is_empty() {
                bail!("Category name must not be empty");
            }
            ctx.conn.execute(
                "INSERT INTO categories(user_id, name) VALUES (?1, ?2)",
                params![user.id, name],
            )?;
            println!(
                "Added category '{}' (id {})",
                name,
                ctx.conn.last_insert_rowid()
            );
        }
        Some(("list", _)) => {
            let mut stmt = ctx
                .conn
                .prepare("SELECT id, name FROM categories WHERE user_id=?1 ORDER BY name")?;
            let rows = stmt.query_map(params![user.id], |r| {
                Ok(Category {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            })?;
            let mut cats = Vec::new();
            for row in rows {
                cats.push(row?);
            }
            if maybe_print_json(ctx.json, &cats)? {
                return Ok(());
            }
            let data = cats
                .into_iter()
                .map(|c| vec![c.id.to_string(), c.name])
                .collect();
            println!("{}", pretty_table(&["Id", "Name"], data));
        }
        _ => {}
    }
    Ok(())
}
