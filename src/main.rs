// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use quantum::commands::{self, Session};
use quantum::config::{DEFAULT_LOG_FILTER, LOG_ENV};
use quantum::store::references::ReferenceKind;
use quantum::{cli, db};

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let path = match matches.get_one::<String>("db") {
        Some(p) => PathBuf::from(p),
        None => db::default_db_path()?,
    };
    let conn = db::open_or_init(&path)?;

    let Some((name, sub)) = matches.subcommand() else {
        cli::build_cli().print_help()?;
        println!();
        return Ok(());
    };
    if name == "init" {
        commands::users::init(&conn, sub)?;
        println!("Database initialized at {}", path.display());
        return Ok(());
    }

    let today = commands::today(&matches)?;
    let user = matches.get_one::<String>("user").map(String::as_str);
    let session = Session::open(&conn, user, today)?;

    match name {
        "user" => commands::users::handle(&conn, &session, sub)?,
        "portfolio" => commands::portfolios::handle(&conn, &session, sub)?,
        "account" => commands::accounts::handle(&conn, &session, sub)?,
        "category" => commands::categories::handle(&conn, &session, sub)?,
        "payee" => commands::references::handle(&conn, &session, ReferenceKind::Payee, sub)?,
        "txtype" => {
            commands::references::handle(&conn, &session, ReferenceKind::TransactionType, sub)?
        }
        "tx" => commands::transactions::handle(&conn, &session, sub)?,
        "budget" => commands::budgets::handle(&conn, &session, sub)?,
        "schedule" => commands::scheduled::handle(&conn, &session, sub)?,
        "summary" => commands::summaries::handle(&conn, &session, sub)?,
        "config" => commands::settings::handle(&conn, &session, sub)?,
        "export" => commands::exporter::handle(&conn, &session, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
