// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json() -> Arg {
    Arg::new("json")
        .long("json")
        .global(true)
        .action(ArgAction::SetTrue)
        .help("Print the structured result as JSON")
}

fn user() -> Arg {
    Arg::new("user")
        .long("user")
        .global(true)
        .value_parser(value_parser!(i64))
        .help("Owner id to act as")
}

fn as_of() -> Arg {
    Arg::new("as-of")
        .long("as-of")
        .global(true)
        .help("Evaluate dates as of YYYY-MM-DD instead of today")
}

fn id() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

fn text(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

pub fn build_cli() -> Command {
    Command::new("billfold")
        .about("Multi-currency bills, budgets and goals")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(json())
        .arg(user())
        .arg(as_of())
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("user")
                .about("Account owners")
                .subcommand(
                    Command::new("add")
                        .arg(text("name"))
                        .arg(opt("currency").help("Preferred currency code")),
                )
                .subcommand(Command::new("show")),
        )
        .subcommand(
            Command::new("category")
                .about("Spending categories")
                .subcommand(Command::new("add").arg(text("name")))
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("tx")
                .about("Record income and expenses")
                .subcommand(
                    Command::new("add")
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("expense")
                                .value_parser(["expense", "income"]),
                        )
                        .arg(text("amount"))
                        .arg(opt("currency"))
                        .arg(text("date"))
                        .arg(opt("category").value_parser(value_parser!(i64)))
                        .arg(opt("description")),
                ),
        )
        .subcommand(
            Command::new("bill")
                .about("Bills and their lifecycle")
                .subcommand(
                    Command::new("add")
                        .arg(text("title"))
                        .arg(text("amount"))
                        .arg(opt("currency"))
                        .arg(text("due"))
                        .arg(
                            Arg::new("recurring")
                                .long("recurring")
                                .default_value("none")
                                .help("none, monthly, quarterly or yearly"),
                        )
                        .arg(opt("category").value_parser(value_parser!(i64)))
                        .arg(opt("description")),
                )
                .subcommand(Command::new("list"))
                .subcommand(
                    Command::new("upcoming").arg(
                        Arg::new("days")
                            .long("days")
                            .default_value("30")
                            .value_parser(value_parser!(u32)),
                    ),
                )
                .subcommand(Command::new("overview"))
                .subcommand(Command::new("status").arg(id()))
                .subcommand(Command::new("pay").arg(id()))
                .subcommand(Command::new("next").arg(id()))
                .subcommand(Command::new("rm").arg(id())),
        )
        .subcommand(
            Command::new("budget")
                .about("Spending limits per period")
                .subcommand(
                    Command::new("add")
                        .arg(text("amount"))
                        .arg(opt("currency"))
                        .arg(text("start"))
                        .arg(text("end"))
                        .arg(
                            opt("category")
                                .value_parser(value_parser!(i64))
                                .help("Leave out to cover every category"),
                        ),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("overview"))
                .subcommand(Command::new("rm").arg(id())),
        )
        .subcommand(
            Command::new("goal")
                .about("Savings goals")
                .subcommand(
                    Command::new("add")
                        .arg(text("title"))
                        .arg(text("target"))
                        .arg(opt("currency"))
                        .arg(opt("progress"))
                        .arg(opt("deadline")),
                )
                .subcommand(Command::new("list"))
                .subcommand(Command::new("progress").arg(id()).arg(text("amount")))
                .subcommand(Command::new("overview"))
                .subcommand(Command::new("rm").arg(id())),
        )
        .subcommand(
            Command::new("fx")
                .about("Currency formatting and exchange rates")
                .subcommand(
                    Command::new("format")
                        .arg(text("amount").allow_hyphen_values(true))
                        .arg(opt("currency")),
                )
                .subcommand(
                    Command::new("parse")
                        .arg(text("text").allow_hyphen_values(true))
                        .arg(opt("currency")),
                )
                .subcommand(
                    Command::new("convert")
                        .arg(text("amount").allow_hyphen_values(true))
                        .arg(text("from"))
                        .arg(text("to")),
                )
                .subcommand(Command::new("currencies"))
                .subcommand(Command::new("rates"))
                .subcommand(Command::new("refresh")),
        )
        .subcommand(
            Command::new("config")
                .about("Engine settings")
                .subcommand(Command::new("show"))
                .subcommand(Command::new("set").arg(text("key")).arg(text("value"))),
        )
        .subcommand(Command::new("doctor").about("Check stored rows for problems"))
}
