// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Exchange-rate cache.
//!
//! Rates are kept as an immutable [`RateSnapshot`] behind an `Arc`. A refresh
//! builds a whole new snapshot and swaps it in, so readers always hold either
//! the old or the new table. Refresh failures never reach the caller: the
//! previous snapshot keeps being served, and on a cold start the configured
//! fallback table is used instead.

use crate::config::EngineConfig;
use crate::error::RateError;
use crate::utils::http_client;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock, TryLockError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Something that can produce rate factors relative to a base currency.
pub trait RateSource: Send + Sync {
    fn fetch(&self, base: &str) -> Result<BTreeMap<String, Decimal>, RateError>;
}

/// Fetches `{url}{BASE}` and reads its `rates` object.
pub struct HttpRateSource {
    client: reqwest::blocking::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: Option<HashMap<String, f64>>,
}

impl HttpRateSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url: url.into(),
        })
    }
}

/// Reads the factors out of a `latest` response body. Codes are uppercased;
/// zero, negative and unrepresentable factors are skipped.
pub fn parse_latest(body: &str) -> Result<BTreeMap<String, Decimal>, RateError> {
    let body: LatestRates =
        serde_json::from_str(body).map_err(|e| RateError::Malformed(e.to_string()))?;
    let raw = body
        .rates
        .ok_or_else(|| RateError::Malformed("missing 'rates' object".into()))?;
    let mut out = BTreeMap::new();
    for (code, factor) in raw {
        match Decimal::from_f64(factor) {
            Some(d) if d > Decimal::ZERO => {
                out.insert(code.to_uppercase(), d);
            }
            _ => debug!(%code, factor, "skipping unusable rate"),
        }
    }
    if out.is_empty() {
        return Err(RateError::Malformed("no usable rates".into()));
    }
    Ok(out)
}

impl RateSource for HttpRateSource {
    fn fetch(&self, base: &str) -> Result<BTreeMap<String, Decimal>, RateError> {
        let url = format!("{}{}", self.url, base);
        debug!(%url, "fetching exchange rates");
        let body = self.client.get(url).send()?.error_for_status()?.text()?;
        parse_latest(&body)
    }
}

/// Used when the rate source is switched off in settings.
pub struct DisabledSource;

impl RateSource for DisabledSource {
    fn fetch(&self, _base: &str) -> Result<BTreeMap<String, Decimal>, RateError> {
        Err(RateError::Disabled)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub base: String,
    pub rates: BTreeMap<String, Decimal>,
    pub fetched_at: DateTime<Utc>,
    /// Built from the static fallback table rather than fetched.
    #[serde(default)]
    pub is_fallback: bool,
}

impl RateSnapshot {
    pub fn new(
        base: impl Into<String>,
        mut rates: BTreeMap<String, Decimal>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let base = base.into();
        rates.entry(base.clone()).or_insert(Decimal::ONE);
        Self {
            base,
            rates,
            fetched_at,
            is_fallback: false,
        }
    }

    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(code).copied()
    }
}

pub struct RateCache {
    source: Box<dyn RateSource>,
    base: String,
    refresh_interval: chrono::Duration,
    fallback: BTreeMap<String, Decimal>,
    current: RwLock<Option<Arc<RateSnapshot>>>,
    refreshing: Mutex<()>,
}

impl RateCache {
    pub fn new(
        source: impl RateSource + 'static,
        base: impl Into<String>,
        refresh_interval: chrono::Duration,
        fallback: BTreeMap<String, Decimal>,
    ) -> Self {
        Self {
            source: Box::new(source),
            base: base.into(),
            refresh_interval,
            fallback,
            current: RwLock::new(None),
            refreshing: Mutex::new(()),
        }
    }

    /// Builds the cache described by the settings, backed by HTTP unless the
    /// source has been disabled.
    pub fn from_config(cfg: &EngineConfig) -> anyhow::Result<Self> {
        let fallback = crate::config::FALLBACK_RATES.clone();
        let cache = if cfg.rate_source_enabled {
            let src = HttpRateSource::new(cfg.rate_api_url.clone(), cfg.timeout())?;
            Self::new(src, cfg.rate_base.clone(), cfg.refresh_interval(), fallback)
        } else {
            Self::new(
                DisabledSource,
                cfg.rate_base.clone(),
                cfg.refresh_interval(),
                fallback,
            )
        };
        Ok(cache)
    }

    /// Seeds the cache with a previously persisted snapshot. Ignored when the
    /// snapshot was taken against another base currency.
    pub fn with_snapshot(self, snapshot: RateSnapshot) -> Self {
        if snapshot.base == self.base && !snapshot.rates.is_empty() {
            self.replace(Arc::new(snapshot));
        } else {
            debug!(
                stored = %snapshot.base,
                configured = %self.base,
                "ignoring persisted snapshot"
            );
        }
        self
    }

    /// Current snapshot without triggering a refresh.
    pub fn peek(&self) -> Option<Arc<RateSnapshot>> {
        match self.current.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn get_rates(&self) -> Arc<RateSnapshot> {
        self.get_rates_at(Utc::now())
    }

    /// Returns a usable snapshot, refreshing it first when it is older than
    /// the refresh interval. Never fails.
    pub fn get_rates_at(&self, now: DateTime<Utc>) -> Arc<RateSnapshot> {
        if let Some(snap) = self.peek() {
            if !self.is_stale(&snap, now) {
                return snap;
            }
        }

        let _guard = match self.refreshing.try_lock() {
            Ok(g) => g,
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
            Err(TryLockError::WouldBlock) => match self.peek() {
                // someone else is refreshing; a stale table beats waiting
                Some(snap) => return snap,
                None => self.refreshing.lock().unwrap_or_else(|p| p.into_inner()),
            },
        };

        if let Some(snap) = self.peek() {
            if !self.is_stale(&snap, now) {
                return snap;
            }
        }

        match self.fetch_and_replace(now) {
            Ok(snap) => snap,
            Err(err) => {
                warn!(base = %self.base, error = %err, "exchange rate refresh failed");
                match self.peek() {
                    Some(prev) => prev,
                    None => {
                        let mut fallback =
                            RateSnapshot::new(self.base.clone(), self.fallback.clone(), now);
                        fallback.is_fallback = true;
                        let snap = Arc::new(fallback);
                        info!(base = %self.base, "serving fallback exchange rates");
                        self.replace(snap.clone());
                        snap
                    }
                }
            }
        }
    }

    /// Refreshes unconditionally and reports the outcome. On failure the
    /// cached snapshot is left untouched.
    pub fn refresh_now(&self, now: DateTime<Utc>) -> Result<Arc<RateSnapshot>, RateError> {
        let _guard = self.refreshing.lock().unwrap_or_else(|p| p.into_inner());
        self.fetch_and_replace(now)
    }

    fn fetch_and_replace(&self, now: DateTime<Utc>) -> Result<Arc<RateSnapshot>, RateError> {
        let rates = self.source.fetch(&self.base)?;
        let snap = Arc::new(RateSnapshot::new(self.base.clone(), rates, now));
        info!(base = %self.base, count = snap.rates.len(), "exchange rates refreshed");
        self.replace(snap.clone());
        Ok(snap)
    }

    fn is_stale(&self, snap: &RateSnapshot, now: DateTime<Utc>) -> bool {
        now - snap.fetched_at > self.refresh_interval
    }

    fn replace(&self, snap: Arc<RateSnapshot>) {
        match self.current.write() {
            Ok(mut g) => *g = Some(snap),
            Err(poisoned) => *poisoned.into_inner() = Some(snap),
        }
    }
}
