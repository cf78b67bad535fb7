// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::Ctx;
use crate::engine::currency::CurrencyEngine;
use crate::models::{BillStatus, Recurrence};
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

/// Everything `doctor` would report, without printing.
pub fn check(ctx: &Ctx) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Currencies with no formatting profile
    let mut currencies = Vec::<String>::new();
    for sql in [
        "SELECT DISTINCT currency FROM users",
        "SELECT DISTINCT currency FROM transactions",
        "SELECT DISTINCT currency FROM bills",
        "SELECT DISTINCT currency FROM budgets",
        "SELECT DISTINCT currency FROM goals",
    ] {
        let mut stmt = ctx.conn.prepare(sql)?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        for row in rows {
            let c = row?;
            if !currencies.contains(&c) {
                currencies.push(c);
            }
        }
    }
    for c in &currencies {
        if !CurrencyEngine::is_supported(c) {
            issues.push(Issue {
                kind: "unsupported_currency",
                detail: c.clone(),
            });
        }
    }

    // 2) Rate coverage, judged on what is cached; doctor never fetches
    match ctx.rates.peek() {
        None => issues.push(Issue {
            kind: "no_rate_snapshot",
            detail: "run `fx refresh` to fetch exchange rates".into(),
        }),
        Some(snap) => {
            if Utc::now() - snap.fetched_at > ctx.cfg.refresh_interval() {
                issues.push(Issue {
                    kind: "stale_rates",
                    detail: format!("fetched {}", snap.fetched_at.to_rfc3339()),
                });
            }
            for c in &currencies {
                if snap.rate(&c.to_uppercase()).is_none() {
                    issues.push(Issue {
                        kind: "missing_rate",
                        detail: c.clone(),
                    });
                }
            }
        }
    }

    // 3) Bill rows the engine has to guess about
    let mut stmt = ctx.conn.prepare("SELECT id, status, recurring FROM bills ORDER BY id")?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    for row in rows {
        let (id, status, recurring) = row?;
        if BillStatus::parse(&status).is_none() {
            issues.push(Issue {
                kind: "unknown_bill_status",
                detail: format!("bill {}: '{}'", id, status),
            });
        }
        if let Recurrence::Unrecognized(raw) = Recurrence::parse(&recurring) {
            issues.push(Issue {
                kind: "unknown_recurrence",
                detail: format!("bill {}: '{}'", id, raw),
            });
        }
    }

    Ok(issues)
}

pub fn handle(ctx: &Ctx) -> Result<()> {
    let issues = check(ctx)?;
    if maybe_print_json(ctx.json, &issues)? {
        return Ok(());
    }
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
