// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;
use rusqlite::Connection;

use super::{Session, reference_patch};
use crate::ledger::{self, LedgerEntry};
use crate::models::{NewTransaction, TransactionPatch};
use crate::permissions::{Operation, Resource};
use crate::store::transactions;
use crate::utils::{
    fmt_opt, optional_date, optional_decimal, optional_id, parse_date, parse_decimal,
    pretty_table, print_json_if_requested, required, required_id,
};

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, session, sub)?,
        Some(("list", sub)) => list(conn, session, sub)?,
        Some(("show", sub)) => {
            session.authorize(Resource::Transaction, Operation::Read)?;
            let t = transactions::get_transaction(conn, &session.caller, required_id(sub, "id")?)?;
            print_single(sub, LedgerEntry::unbalanced(t))?;
        }
        Some(("edit", sub)) => edit(conn, session, sub)?,
        Some(("clear", sub)) => {
            session.authorize(Resource::Transaction, Operation::Update)?;
            let date = optional_date(sub, "date")?.unwrap_or(session.today);
            let patch = TransactionPatch {
                clear_date: Some(Some(date)),
                ..Default::default()
            };
            let t = transactions::update_transaction(
                conn,
                &session.caller,
                required_id(sub, "id")?,
                &patch,
            )?;
            print_single(sub, LedgerEntry::unbalanced(t))?;
        }
        Some(("rm", sub)) => {
            session.authorize(Resource::Transaction, Operation::Delete)?;
            let id = required_id(sub, "id")?;
            transactions::delete_transaction(conn, &session.caller, id)?;
            println!("Removed transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, session: &Session, sub: &ArgMatches) -> Result<()> {
    session.authorize(Resource::Transaction, Operation::Create)?;
    let new = NewTransaction {
        account_id: required_id(sub, "account")?,
        transaction_type_id: optional_id(sub, "type")?,
        payee_id: optional_id(sub, "payee")?,
        category_id: optional_id(sub, "category")?,
        amount: parse_decimal(required(sub, "amount")?)?,
        transaction_date: parse_date(required(sub, "date")?)?,
        clear_date: optional_date(sub, "cleared")?,
        check_number: sub.get_one::<String>("check").cloned(),
        exclude_from_forecast: sub.get_flag("exclude"),
        notes: sub.get_one::<String>("notes").cloned(),
    };
    let t = transactions::create_transaction(conn, &session.caller, &new)?;
    print_single(sub, LedgerEntry::unbalanced(t))
}

fn edit(conn: &Connection, session: &Session, sub: &ArgMatches) -> Result<()> {
    session.authorize(Resource::Transaction, Operation::Update)?;
    let clear_date = if sub.get_flag("uncleared") {
        Some(None)
    } else {
        optional_date(sub, "cleared")?.map(Some)
    };
    let patch = TransactionPatch {
        transaction_type_id: reference_patch(sub, "type")?,
        payee_id: reference_patch(sub, "payee")?,
        category_id: reference_patch(sub, "category")?,
        amount: optional_decimal(sub, "amount")?,
        transaction_date: optional_date(sub, "date")?,
        clear_date,
        check_number: sub.get_one::<String>("check").map(|s| Some(s.clone())),
        exclude_from_forecast: sub.get_one::<bool>("exclude").copied(),
        notes: sub.get_one::<String>("notes").map(|s| Some(s.clone())),
    };
    let t = transactions::update_transaction(conn, &session.caller, required_id(sub, "id")?, &patch)?;
    print_single(sub, LedgerEntry::unbalanced(t))
}

fn print_single(sub: &ArgMatches, entry: LedgerEntry) -> Result<()> {
    if !print_json_if_requested(sub, &entry)? {
        let t = &entry.transaction;
        println!(
            "Transaction {}: {} on {} (cleared {}) acct {}",
            t.id,
            t.amount,
            t.transaction_date,
            fmt_opt(t.clear_date),
            t.account_id
        );
    }
    Ok(())
}

fn list(conn: &Connection, session: &Session, sub: &ArgMatches) -> Result<()> {
    let data = ledger_rows(conn, session, sub)?;
    if !print_json_if_requested(sub, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|e| {
                let t = &e.transaction;
                vec![
                    t.id.to_string(),
                    t.transaction_date.to_string(),
                    fmt_opt(t.clear_date),
                    fmt_opt(t.payee_id),
                    fmt_opt(t.category_id),
                    t.amount.to_string(),
                    fmt_opt(e.balance),
                    t.notes.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Cleared", "Payee", "Category", "Amount", "Balance", "Notes"],
                rows,
            )
        );
    }
    Ok(())
}

/// Ledger rows for `tx list`, oldest first. `--limit N` keeps the newest N.
pub fn ledger_rows(conn: &Connection, session: &Session, sub: &ArgMatches) -> Result<Vec<LedgerEntry>> {
    session.authorize(Resource::Transaction, Operation::Read)?;
    let account_id = required_id(sub, "account")?;
    let cutoff = session.ledger_cutoff(sub)?;
    let mut entries = ledger::account_ledger(conn, &session.caller, account_id, cutoff)?;
    if let Some(&limit) = sub.get_one::<usize>("limit") {
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
    }
    Ok(entries)
}
