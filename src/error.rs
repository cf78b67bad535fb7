// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Errors raised by the engine and the store.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid currency code '{0}', expected a 3-letter code")]
    InvalidCurrency(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Corrupt {field} '{value}' in stored row")]
    Corrupt { field: &'static str, value: String },

    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Why a rate refresh failed. Only an explicit refresh reports it.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed rate response: {0}")]
    Malformed(String),

    #[error("rate source disabled")]
    Disabled,
}
