// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use billfold::commands::{self, Ctx, doctor};
use billfold::config::{self, EngineConfig};
use billfold::engine::rates::RateCache;
use billfold::store::Store;
use billfold::{cli, db};
use rusqlite::{Connection, params};
use std::sync::Arc;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    config::set(&conn, "rate_source_enabled", "false").unwrap();
    conn
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["billfold"];
    argv.extend_from_slice(args);
    let m = cli::build_cli().try_get_matches_from(argv)?;
    commands::run(conn, &m)
}

fn scalar(conn: &Connection, sql: &str) -> String {
    conn.query_row(sql, [], |r| r.get(0)).unwrap()
}

#[test]
fn cli_definition_is_consistent() {
    cli::build_cli().debug_assert();
}

#[test]
fn recurring_bill_flow() {
    let conn = setup();
    run(&conn, &["user", "add", "--name", "Ana", "--currency", "usd"]).unwrap();
    assert_eq!(conn.user(1).unwrap().currency, "USD");

    run(
        &conn,
        &[
            "--user", "1", "bill", "add", "--title", "Rent", "--amount", "1000", "--due",
            "2024-01-31", "--recurring", "monthly",
        ],
    )
    .unwrap();
    run(&conn, &["bill", "pay", "--id", "1", "--user", "1"]).unwrap();

    assert_eq!(scalar(&conn, "SELECT status FROM bills WHERE id=1"), "paid");
    assert_eq!(scalar(&conn, "SELECT due_date FROM bills WHERE id=2"), "2024-02-29");
    assert_eq!(scalar(&conn, "SELECT status FROM bills WHERE id=2"), "pending");
}

#[test]
fn global_flags_work_after_subcommand() {
    let conn = setup();
    run(&conn, &["user", "add", "--name", "Ana"]).unwrap();
    run(
        &conn,
        &[
            "bill", "add", "--title", "Net", "--amount", "30", "--due", "2024-02-01", "--user",
            "1",
        ],
    )
    .unwrap();
    run(
        &conn,
        &["bill", "list", "--user", "1", "--json", "--as-of", "2024-03-01"],
    )
    .unwrap();
    assert_eq!(scalar(&conn, "SELECT status FROM bills WHERE id=1"), "overdue");
    // default currency applies when none is given
    assert_eq!(scalar(&conn, "SELECT currency FROM users WHERE id=1"), "PHP");
}

#[test]
fn owner_commands_need_user() {
    let conn = setup();
    let err = run(&conn, &["bill", "list"]).unwrap_err();
    assert!(err.to_string().contains("--user"));
    assert!(run(&conn, &["bill", "list", "--user", "9"]).is_err());
}

#[test]
fn bad_bill_input_is_rejected() {
    let conn = setup();
    run(&conn, &["user", "add", "--name", "Ana"]).unwrap();
    let base = [
        "--user", "1", "bill", "add", "--title", "X", "--due", "2024-01-01",
    ];

    let mut weekly = base.to_vec();
    weekly.extend_from_slice(&["--amount", "5", "--recurring", "weekly"]);
    assert!(run(&conn, &weekly).is_err());

    let mut bad_amount = base.to_vec();
    bad_amount.extend_from_slice(&["--amount", "five"]);
    assert!(run(&conn, &bad_amount).is_err());

    let mut bad_ccy = base.to_vec();
    bad_ccy.extend_from_slice(&["--amount", "5", "--currency", "dollars"]);
    assert!(run(&conn, &bad_ccy).is_err());

    assert_eq!(scalar(&conn, "SELECT COUNT(*) || '' FROM bills"), "0");
}

#[test]
fn budget_and_goal_commands_round_trip() {
    let conn = setup();
    run(&conn, &["user", "add", "--name", "Ana", "--currency", "EUR"]).unwrap();
    run(&conn, &["--user", "1", "category", "add", "--name", "Food"]).unwrap();
    run(
        &conn,
        &[
            "--user", "1", "budget", "add", "--amount", "200", "--start", "2024-06-01", "--end",
            "2024-06-30", "--category", "1",
        ],
    )
    .unwrap();
    run(
        &conn,
        &[
            "--user", "1", "tx", "add", "--amount", "50", "--date", "2024-06-03", "--category",
            "1",
        ],
    )
    .unwrap();
    run(&conn, &["--user", "1", "--as-of", "2024-06-15", "budget", "list"]).unwrap();
    run(&conn, &["--user", "1", "budget", "overview", "--json"]).unwrap();

    run(
        &conn,
        &["--user", "1", "goal", "add", "--title", "Bike", "--target", "300"],
    )
    .unwrap();
    run(
        &conn,
        &["--user", "1", "goal", "progress", "--id", "1", "--amount", "120"],
    )
    .unwrap();
    assert_eq!(scalar(&conn, "SELECT progress FROM goals WHERE id=1"), "120");
    assert!(run(
        &conn,
        &["--user", "1", "goal", "progress", "--id", "2", "--amount", "1"]
    )
    .is_err());

    let err = run(
        &conn,
        &[
            "--user", "1", "budget", "add", "--amount", "1", "--start", "2024-06-30", "--end",
            "2024-06-01",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("before it starts"));
}

#[test]
fn fallback_rates_are_not_persisted() {
    let conn = setup();
    run(&conn, &["fx", "convert", "--amount", "10", "--from", "USD", "--to", "PHP"]).unwrap();
    run(&conn, &["fx", "rates"]).unwrap();
    assert_eq!(scalar(&conn, "SELECT COUNT(*) || '' FROM fx_snapshot"), "0");
    assert!(run(&conn, &["fx", "refresh"]).is_err());
}

#[test]
fn fx_input_errors_surface() {
    let conn = setup();
    assert!(run(&conn, &["fx", "format", "--amount", "ten"]).is_err());
    run(&conn, &["fx", "format", "--amount", "-1234.5", "--currency", "CHF"]).unwrap();
    run(&conn, &["fx", "parse", "--text", "nonsense"]).unwrap();
    run(&conn, &["fx", "currencies", "--json"]).unwrap();
}

#[test]
fn config_set_validates() {
    let conn = setup();
    run(&conn, &["config", "set", "--key", "default_currency", "--value", "eur"]).unwrap();
    assert_eq!(EngineConfig::load(&conn).unwrap().default_currency, "EUR");
    assert!(run(&conn, &["config", "set", "--key", "default_currency", "--value", "XYZ"]).is_err());
    assert!(run(&conn, &["config", "set", "--key", "rate_refresh_secs", "--value", "soon"]).is_err());
    assert!(run(&conn, &["config", "set", "--key", "colour", "--value", "red"]).is_err());
    run(&conn, &["config", "show"]).unwrap();
}

#[test]
fn doctor_finds_problem_rows() {
    let conn = setup();
    conn.execute("INSERT INTO users(name, currency) VALUES ('Old', 'XYZ')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO bills(user_id, title, amount, currency, due_date, recurring)
         VALUES (?1, 'Odd', '10', 'USD', '2024-06-01', 'weekly')",
        params![1],
    )
    .unwrap();

    let m = cli::build_cli()
        .try_get_matches_from(["billfold", "doctor"])
        .unwrap();
    let cfg = EngineConfig::load(&conn).unwrap();
    let rates = Arc::new(RateCache::from_config(&cfg).unwrap());
    let ctx = Ctx::new(&conn, cfg, rates, &m).unwrap();
    let kinds: Vec<&str> = doctor::check(&ctx)
        .unwrap()
        .iter()
        .map(|i| i.kind)
        .collect();
    assert!(kinds.contains(&"unsupported_currency"));
    assert!(kinds.contains(&"no_rate_snapshot"));
    assert!(kinds.contains(&"unknown_recurrence"));
    assert!(!kinds.contains(&"unknown_bill_status"));
}

#[test]
fn database_file_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("billfold.sqlite");
    {
        let conn = db::open_at(&path).unwrap();
        conn.insert_user("Ana", "GBP").unwrap();
    }
    let conn = db::open_at(&path).unwrap();
    assert_eq!(conn.user(1).unwrap().name, "Ana");
}

#[test]
fn budgets_and_goals_can_be_removed_by_their_owner() {
    let conn = setup();
    run(&conn, &["user", "add", "--name", "Ana"]).unwrap();
    run(&conn, &["user", "add", "--name", "Ben"]).unwrap();
    run(
        &conn,
        &[
            "--user", "1", "budget", "add", "--amount", "200", "--start", "2024-06-01", "--end",
            "2024-06-30",
        ],
    )
    .unwrap();
    run(
        &conn,
        &["--user", "1", "goal", "add", "--title", "Bike", "--target", "300"],
    )
    .unwrap();

    assert!(run(&conn, &["--user", "2", "budget", "rm", "--id", "1"]).is_err());
    assert!(run(&conn, &["--user", "2", "goal", "rm", "--id", "1"]).is_err());
    assert_eq!(scalar(&conn, "SELECT CAST(COUNT(*) AS TEXT) FROM budgets"), "1");
    assert_eq!(scalar(&conn, "SELECT CAST(COUNT(*) AS TEXT) FROM goals"), "1");

    run(&conn, &["--user", "1", "budget", "rm", "--id", "1"]).unwrap();
    run(&conn, &["--user", "1", "goal", "rm", "--id", "1"]).unwrap();
    assert_eq!(scalar(&conn, "SELECT CAST(COUNT(*) AS TEXT) FROM budgets"), "0");
    assert_eq!(scalar(&conn, "SELECT CAST(COUNT(*) AS TEXT) FROM goals"), "0");
    assert!(run(&conn, &["--user", "1", "goal", "rm", "--id", "1"]).is_err());
}

#[test]
fn upcoming_accepts_the_widest_window() {
    let conn = setup();
    run(&conn, &["user", "add", "--name", "Ana"]).unwrap();
    run(
        &conn,
        &["--user", "1", "bill", "add", "--title", "Rent", "--amount", "900", "--due", "2024-07-01"],
    )
    .unwrap();
    run(
        &conn,
        &["--user", "1", "--as-of", "2024-06-01", "bill", "upcoming", "--days", "4294967295"],
    )
    .unwrap();
}
