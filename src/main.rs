// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use billfold::{cli, commands, db};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("BILLFOLD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = cli::build_cli().get_matches();
    let conn = db::open_or_init()?;
    commands::run(&conn, &matches)
}
