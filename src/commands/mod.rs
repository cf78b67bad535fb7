// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod bills;
pub mod budgets;
pub mod categories;
pub mod config;
pub mod doctor;
pub mod fx;
pub mod goals;
pub mod transactions;
pub mod users;

use crate::api;
use crate::config::EngineConfig;
use crate::engine::currency::CurrencyEngine;
use crate::engine::rates::{RateCache, RateSnapshot};
use crate::models::User;
use crate::store::{self, Store};
use crate::utils::{opt_arg, parse_date, today};
use crate::{cli, db};
use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use clap::ArgMatches;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// What every command handler gets: the open database, the loaded settings
/// and the shared rate cache, plus the global flags.
pub struct Ctx<'a> {
    pub conn: &'a Connection,
    pub cfg: EngineConfig,
    pub rates: Arc<RateCache>,
    pub json: bool,
    pub today: NaiveDate,
    user: Option<i64>,
}

impl<'a> Ctx<'a> {
    pub fn new(
        conn: &'a Connection,
        cfg: EngineConfig,
        rates: Arc<RateCache>,
        m: &ArgMatches,
    ) -> Result<Self> {
        let today = match m.get_one::<String>("as-of") {
            Some(s) => parse_date(s)?,
            None => today(),
        };
        Ok(Self {
            conn,
            cfg,
            rates,
            json: m.get_flag("json"),
            today,
            user: m.get_one::<i64>("user").copied(),
        })
    }

    /// Engine keyed on the configured default currency.
    pub fn engine(&self) -> CurrencyEngine {
        CurrencyEngine::new(self.rates.clone(), &self.cfg.default_currency)
    }

    /// The `--user` owner and an engine that displays in their currency.
    pub fn owner(&self) -> Result<(User, CurrencyEngine)> {
        let id = self
            .user
            .ok_or_else(|| anyhow!("This command needs --user <id>"))?;
        let user = self.conn.user(id)?;
        let engine = self.engine().with_default(&user.currency);
        Ok((user, engine))
    }

    /// Owner's engine when `--user` is given, the configured one otherwise.
    pub fn display_engine(&self) -> Result<CurrencyEngine> {
        match self.user {
            Some(_) => Ok(self.owner()?.1),
            None => Ok(self.engine()),
        }
    }

    /// Writes the rate snapshot back when this run fetched a new one.
    /// Fallback tables are never stored.
    fn persist_rates(&self, loaded: Option<&RateSnapshot>) {
        let Some(snap) = self.rates.peek() else {
            return;
        };
        if snap.is_fallback || loaded.is_some_and(|l| l.fetched_at == snap.fetched_at) {
            return;
        }
        match store::save_snapshot(self.conn, &snap) {
            Ok(()) => debug!(fetched_at = %snap.fetched_at, "rate snapshot saved"),
            Err(e) => warn!(error = %e, "could not save rate snapshot"),
        }
    }
}

/// Builds the context from settings and dispatches one parsed command line.
pub fn run(conn: &Connection, m: &ArgMatches) -> Result<()> {
    let cfg = EngineConfig::load(conn)?;
    let loaded = store::load_snapshot(conn)?;
    let mut cache = RateCache::from_config(&cfg)?;
    if let Some(snap) = loaded.clone() {
        cache = cache.with_snapshot(snap);
    }
    let ctx = Ctx::new(conn, cfg, Arc::new(cache), m)?;

    match m.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("user", sub)) => users::handle(&ctx, sub)?,
        Some(("category", sub)) => categories::handle(&ctx, sub)?,
        Some(("tx", sub)) => transactions::handle(&ctx, sub)?,
        Some(("bill", sub)) => bills::handle(&ctx, sub)?,
        Some(("budget", sub)) => budgets::handle(&ctx, sub)?,
        Some(("goal", sub)) => goals::handle(&ctx, sub)?,
        Some(("fx", sub)) => fx::handle(&ctx, sub)?,
        Some(("config", sub)) => config::handle(&ctx, sub)?,
        Some(("doctor", _)) => doctor::handle(&ctx)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    ctx.persist_rates(loaded.as_ref());
    Ok(())
}

/// `--currency` if given, else `fallback`.
pub(crate) fn currency_or(sub: &ArgMatches, fallback: &str) -> Result<String> {
    match opt_arg(sub, "currency") {
        Some(c) => Ok(api::parse_currency(&c)?),
        None => Ok(fallback.to_string()),
    }
}

pub(crate) fn amount_arg(sub: &ArgMatches, name: &str) -> Result<Decimal> {
    let raw = crate::utils::arg(sub, name)?;
    let d = api::parse_amount(&raw)?;
    if d.is_sign_negative() && !d.is_zero() {
        bail!("--{} must not be negative, got {}", name, raw);
    }
    Ok(d)
}

pub(crate) fn date_arg(sub: &ArgMatches, name: &str) -> Result<NaiveDate> {
    Ok(api::parse_date(&crate::utils::arg(sub, name)?)?)
}

pub(crate) fn id_arg(sub: &ArgMatches) -> Result<i64> {
    sub.get_one::<i64>("id")
        .copied()
        .ok_or_else(|| anyhow!("Missing required argument '--id'"))
}

/// "in 3 days", "2 days ago", "today".
pub(crate) fn relative_days(date: NaiveDate, today: NaiveDate) -> String {
    let n = (date - today).num_days();
    match n {
        0 => "today".into(),
        1 => "in 1 day".into(),
        -1 => "1 day ago".into(),
        n if n > 0 => format!("in {} days", n),
        n => format!("{} days ago", -n),
    }
}
