// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use clap::ArgMatches;
use rusqlite::Connection;

use super::Session;
use crate::ledger;
use crate::permissions::{Operation, Resource};
use crate::rollup;
use crate::utils::{fmt_opt, required, required_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Csv,
    Json,
}

fn format_of(sub: &ArgMatches) -> Result<Format> {
    let fmt = required(sub, "format")?.trim().to_lowercase();
    match fmt.as_str() {
        "csv" => Ok(Format::Csv),
        "json" => Ok(Format::Json),
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
}

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("ledger", sub)) => export_ledger(conn, session, sub),
        Some(("budgets", sub)) => export_budgets(conn, session, sub),
        _ => Ok(()),
    }
}

fn export_ledger(conn: &Connection, session: &Session, sub: &ArgMatches) -> Result<()> {
    session.authorize(Resource::Transaction, Operation::Read)?;
    let fmt = format_of(sub)?;
    let out = required(sub, "out")?;
    let account_id = required_id(sub, "account")?;
    let cutoff = session.ledger_cutoff(sub)?;
    let entries = ledger::account_ledger(conn, &session.caller, account_id, cutoff)?;

    match fmt {
        Format::Csv => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id",
                "transaction_date",
                "clear_date",
                "payee_id",
                "category_id",
                "amount",
                "balance",
                "notes",
            ])?;
            for e in &entries {
                let t = &e.transaction;
                wtr.write_record([
                    t.id.to_string(),
                    t.transaction_date.to_string(),
                    fmt_opt(t.clear_date),
                    fmt_opt(t.payee_id),
                    fmt_opt(t.category_id),
                    t.amount.to_string(),
                    fmt_opt(e.balance),
                    t.notes.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        Format::Json => std::fs::write(out, serde_json::to_string_pretty(&entries)?)?,
    }
    tracing::info!(account_id, rows = entries.len(), out = %out, "ledger exported");
    println!("Exported {} ledger rows to {}", entries.len(), out);
    Ok(())
}

fn export_budgets(conn: &Connection, session: &Session, sub: &ArgMatches) -> Result<()> {
    session.authorize(Resource::Budget, Operation::Read)?;
    let fmt = format_of(sub)?;
    let out = required(sub, "out")?;
    let cutoff = session.rollup_cutoff(sub)?;
    let budgets = rollup::budgets_with_data(conn, &session.caller, cutoff)?;

    match fmt {
        Format::Csv => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "budget_id",
                "name",
                "category_id",
                "target",
                "report_month",
                "amount",
            ])?;
            for b in &budgets {
                for d in &b.data {
                    wtr.write_record([
                        b.budget.id.to_string(),
                        b.budget.name.clone(),
                        b.budget.category_id.to_string(),
                        b.budget.amount.to_string(),
                        d.report_month.to_string(),
                        d.amount.to_string(),
                    ])?;
                }
            }
            wtr.flush()?;
        }
        Format::Json => std::fs::write(out, serde_json::to_string_pretty(&budgets)?)?,
    }
    tracing::info!(budgets = budgets.len(), out = %out, "budgets exported");
    println!("Exported {} budgets to {}", budgets.len(), out);
    Ok(())
}
