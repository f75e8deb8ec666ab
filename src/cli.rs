// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, command};

use crate::config::{DB_ENV, USER_ENV};

fn req(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).required(true)
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).required(false)
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).action(ArgAction::SetTrue)
}

fn with_json(cmd: Command) -> Command {
    cmd.arg(flag("json", "Print as pretty JSON"))
        .arg(flag("jsonl", "Print as JSON lines"))
}

fn cutoff_arg() -> Arg {
    opt(
        "cutoff",
        "Boundary date YYYY-MM-DD between summarized and itemized history",
    )
}

fn reference_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(req("portfolio", "Portfolio id"))
                .arg(req("name", "Name")),
        )
        .subcommand(with_json(
            Command::new("list").arg(req("portfolio", "Portfolio id")),
        ))
        .subcommand(
            Command::new("rename")
                .arg(req("id", "Id"))
                .arg(req("name", "New name")),
        )
        .subcommand(Command::new("rm").arg(req("id", "Id")))
}

fn transaction_fields(cmd: Command) -> Command {
    cmd.arg(opt("payee", "Payee id (\"none\" to clear on edit)"))
        .arg(opt("category", "Category id (\"none\" to clear on edit)"))
        .arg(opt("type", "Transaction type id (\"none\" to clear on edit)"))
        .arg(opt("check", "Check number"))
        .arg(opt("notes", "Free-text notes"))
}

pub fn build_cli() -> Command {
    command!()
        .name("quantum")
        .about("Portfolio-scoped budgeting ledger")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env(DB_ENV)
                .help("Path to the SQLite database"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env(USER_ENV)
                .help("Email of the acting user"),
        )
        .arg(
            Arg::new("as-of")
                .long("as-of")
                .global(true)
                .help("Treat this date (YYYY-MM-DD) as today"),
        )
        .subcommand(
            Command::new("init")
                .about("Create the database; with --email, create the first (super) user")
                .arg(opt("email", "Email of the first user"))
                .arg(opt("first", "First name"))
                .arg(opt("last", "Last name")),
        )
        .subcommand(
            Command::new("user")
                .about("Manage users")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(req("email", "Email"))
                        .arg(opt("first", "First name"))
                        .arg(opt("last", "Last name"))
                        .arg(
                            opt("role", "super_user|administrator|user")
                                .default_value("user"),
                        ),
                )
                .subcommand(with_json(Command::new("list"))),
        )
        .subcommand(
            Command::new("portfolio")
                .about("Manage portfolios and their members")
                .subcommand_required(true)
                .subcommand(Command::new("add").arg(req("name", "Portfolio name")))
                .subcommand(with_json(Command::new("list")))
                .subcommand(
                    Command::new("rename")
                        .arg(req("id", "Portfolio id"))
                        .arg(req("name", "New name")),
                )
                .subcommand(Command::new("rm").arg(req("id", "Portfolio id")))
                .subcommand(
                    Command::new("member-add")
                        .arg(req("id", "Portfolio id"))
                        .arg(req("email", "Email of the user to add")),
                )
                .subcommand(
                    Command::new("member-rm")
                        .arg(req("id", "Portfolio id"))
                        .arg(req("email", "Email of the member to remove")),
                )
                .subcommand(with_json(
                    Command::new("members").arg(req("id", "Portfolio id")),
                )),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(req("portfolio", "Portfolio id"))
                        .arg(req("name", "Account name"))
                        .arg(opt("starting-balance", "Opening balance").default_value("0")),
                )
                .subcommand(with_json(
                    Command::new("list").arg(opt("portfolio", "Only this portfolio")),
                ))
                .subcommand(with_json(
                    Command::new("show")
                        .arg(req("id", "Account id"))
                        .arg(cutoff_arg()),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(req("id", "Account id"))
                        .arg(opt("name", "New name"))
                        .arg(opt("starting-balance", "New opening balance")),
                )
                .subcommand(Command::new("rm").arg(req("id", "Account id"))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(req("portfolio", "Portfolio id"))
                        .arg(req("name", "Category name"))
                        .arg(opt("parent", "Parent category id")),
                )
                .subcommand(with_json(
                    Command::new("list").arg(req("portfolio", "Portfolio id")),
                ))
                .subcommand(
                    Command::new("rename")
                        .arg(req("id", "Category id"))
                        .arg(req("name", "New name")),
                )
                .subcommand(
                    Command::new("move")
                        .arg(req("id", "Category id"))
                        .arg(opt("parent", "New parent id; omit for top level")),
                )
                .subcommand(Command::new("rm").arg(req("id", "Category id"))),
        )
        .subcommand(reference_command("payee", "Manage payees"))
        .subcommand(reference_command("txtype", "Manage transaction types"))
        .subcommand(
            Command::new("tx")
                .about("Record and inspect transactions")
                .subcommand_required(true)
                .subcommand(with_json(transaction_fields(
                    Command::new("add")
                        .arg(req("account", "Account id"))
                        .arg(req("amount", "Signed amount, e.g. -12.34"))
                        .arg(req("date", "Transaction date YYYY-MM-DD"))
                        .arg(opt("cleared", "Clear date YYYY-MM-DD"))
                        .arg(flag("exclude", "Exclude from forecasts")),
                )))
                .subcommand(with_json(
                    Command::new("list")
                        .about("Running-balance ledger of one account")
                        .arg(req("account", "Account id"))
                        .arg(cutoff_arg())
                        .arg(
                            opt("limit", "Only the newest N rows")
                                .value_parser(clap::value_parser!(usize)),
                        ),
                ))
                .subcommand(with_json(Command::new("show").arg(req("id", "Transaction id"))))
                .subcommand(with_json(transaction_fields(
                    Command::new("edit")
                        .arg(req("id", "Transaction id"))
                        .arg(opt("amount", "Signed amount"))
                        .arg(opt("date", "Transaction date YYYY-MM-DD"))
                        .arg(opt("cleared", "Clear date YYYY-MM-DD"))
                        .arg(
                            flag("uncleared", "Remove the clear date")
                                .conflicts_with("cleared"),
                        )
                        .arg(
                            opt("exclude", "Exclude from forecasts (true|false)")
                                .value_parser(clap::value_parser!(bool)),
                        ),
                )))
                .subcommand(with_json(
                    Command::new("clear")
                        .arg(req("id", "Transaction id"))
                        .arg(opt("date", "Clear date; defaults to today")),
                ))
                .subcommand(Command::new("rm").arg(req("id", "Transaction id"))),
        )
        .subcommand(
            Command::new("budget")
                .about("Budgets and their monthly totals")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(req("portfolio", "Portfolio id"))
                        .arg(req("category", "Category id"))
                        .arg(req("name", "Budget name"))
                        .arg(req("amount", "Target amount per month")),
                )
                .subcommand(with_json(
                    Command::new("list")
                        .arg(flag("with-data", "Include monthly totals"))
                        .arg(cutoff_arg()),
                ))
                .subcommand(with_json(
                    Command::new("show")
                        .arg(req("id", "Budget id"))
                        .arg(cutoff_arg()),
                ))
                .subcommand(with_json(
                    Command::new("report")
                        .about("Monthly totals per category across all portfolios")
                        .arg(cutoff_arg()),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(req("id", "Budget id"))
                        .arg(opt("name", "New name"))
                        .arg(opt("category", "New category id"))
                        .arg(opt("amount", "New target amount")),
                )
                .subcommand(Command::new("rm").arg(req("id", "Budget id"))),
        )
        .subcommand(
            Command::new("schedule")
                .about("Recurring transactions")
                .subcommand_required(true)
                .subcommand(transaction_fields(
                    Command::new("add")
                        .arg(req("account", "Account id"))
                        .arg(req("repeat", "Repeat option id (see `schedule options`)"))
                        .arg(req("start", "First occurrence YYYY-MM-DD"))
                        .arg(opt("end", "Last allowed date YYYY-MM-DD (inclusive)"))
                        .arg(
                            opt("limit", "Maximum number of occurrences")
                                .value_parser(clap::value_parser!(u32)),
                        )
                        .arg(opt("amount", "Fixed amount"))
                        .arg(
                            opt("estimate", "Average the last N matching transactions")
                                .value_parser(clap::value_parser!(u32))
                                .conflicts_with("amount"),
                        ),
                ))
                .subcommand(with_json(
                    Command::new("list").arg(opt("account", "Only this account")),
                ))
                .subcommand(with_json(
                    Command::new("show").arg(req("id", "Schedule id")),
                ))
                .subcommand(transaction_fields(
                    Command::new("edit")
                        .arg(req("id", "Schedule id"))
                        .arg(opt("repeat", "Repeat option id"))
                        .arg(opt("start", "First occurrence YYYY-MM-DD"))
                        .arg(opt("end", "Last allowed date YYYY-MM-DD (\"none\" to clear)"))
                        .arg(opt("limit", "Maximum number of occurrences (\"none\" to clear)"))
                        .arg(opt("amount", "Fixed amount; stops estimating"))
                        .arg(
                            opt("estimate", "Average the last N matching transactions; drops the fixed amount")
                                .value_parser(clap::value_parser!(u32))
                                .conflicts_with("amount"),
                        ),
                ))
                .subcommand(with_json(
                    Command::new("next")
                        .arg(req("id", "Schedule id"))
                        .arg(
                            opt("count", "How many upcoming dates to list")
                                .value_parser(clap::value_parser!(usize))
                                .default_value("1"),
                        ),
                ))
                .subcommand(with_json(
                    Command::new("materialize").arg(req("id", "Schedule id")),
                ))
                .subcommand(Command::new("rm").arg(req("id", "Schedule id")))
                .subcommand(with_json(Command::new("options")))
                .subcommand(
                    Command::new("option-add")
                        .arg(req("name", "Option name"))
                        .arg(
                            req("quantity", "Units per step")
                                .value_parser(clap::value_parser!(u32)),
                        )
                        .arg(req("unit", "day|week|month|year|semi_month")),
                ),
        )
        .subcommand(
            Command::new("summary")
                .about("Monthly balance checkpoints")
                .subcommand_required(true)
                .subcommand(with_json(
                    Command::new("rebuild")
                        .arg(req("account", "Account id"))
                        .arg(opt("through", "Last month YYYY-MM; defaults to last month")),
                ))
                .subcommand(with_json(
                    Command::new("list").arg(req("account", "Account id")),
                )),
        )
        .subcommand(
            Command::new("config")
                .about("Stored settings")
                .subcommand_required(true)
                .subcommand(with_json(Command::new("list")))
                .subcommand(Command::new("get").arg(req("key", "Setting key")))
                .subcommand(
                    Command::new("set")
                        .arg(req("key", "Setting key"))
                        .arg(req("value", "Setting value")),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Write ledger or budget data to a file")
                .subcommand_required(true)
                .subcommand(
                    Command::new("ledger")
                        .arg(req("account", "Account id"))
                        .arg(opt("format", "csv|json").default_value("csv"))
                        .arg(req("out", "Output path"))
                        .arg(cutoff_arg()),
                )
                .subcommand(
                    Command::new("budgets")
                        .arg(opt("format", "csv|json").default_value("csv"))
                        .arg(req("out", "Output path"))
                        .arg(cutoff_arg()),
                ),
        )
}
