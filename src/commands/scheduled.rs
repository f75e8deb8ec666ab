// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use clap::ArgMatches;
use rusqlite::Connection;

use super::{Session, reference_patch};
use crate::ledger::LedgerEntry;
use crate::models::{
    NewScheduledTransaction, RepeatUnit, ScheduledTransaction, ScheduledTransactionPatch,
};
use crate::permissions::{Operation, Resource};
use crate::schedule::{self, Cadence};
use crate::store::scheduled;
use crate::utils::{
    fmt_opt, optional_date, optional_decimal, optional_id, parse_date, pretty_table,
    print_json_if_requested, required, required_id,
};

const SCHEDULE_HEADERS: &[&str] = &["Id", "Account", "Repeat", "Start", "End", "Limit", "Amount", "Last made"];

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    let caller = &session.caller;
    match m.subcommand() {
        Some(("add", sub)) => {
            session.authorize(Resource::ScheduledTransaction, Operation::Create)?;
            let new = NewScheduledTransaction {
                account_id: required_id(sub, "account")?,
                transaction_type_id: optional_id(sub, "type")?,
                payee_id: optional_id(sub, "payee")?,
                category_id: optional_id(sub, "category")?,
                fixed_amount: optional_decimal(sub, "amount")?,
                estimate_occurrences: sub.get_one::<u32>("estimate").copied(),
                start_date: parse_date(required(sub, "start")?)?,
                end_date: optional_date(sub, "end")?,
                limit_occurrences: sub.get_one::<u32>("limit").copied(),
                repeat_option_id: required_id(sub, "repeat")?,
                notes: sub.get_one::<String>("notes").cloned(),
            };
            let s = scheduled::create_scheduled(conn, caller, &new)?;
            println!("Added schedule {} starting {}", s.id, s.start_date);
        }
        Some(("list", sub)) => {
            session.authorize(Resource::ScheduledTransaction, Operation::Read)?;
            let data = scheduled::list_scheduled(conn, caller, optional_id(sub, "account")?)?;
            if !print_json_if_requested(sub, &data)? {
                let rows = data.iter().map(schedule_row).collect();
                println!("{}", pretty_table(SCHEDULE_HEADERS, rows));
            }
        }
        Some(("show", sub)) => {
            session.authorize(Resource::ScheduledTransaction, Operation::Read)?;
            let s = scheduled::get_scheduled(conn, caller, required_id(sub, "id")?)?;
            if !print_json_if_requested(sub, &s)? {
                println!("{}", pretty_table(SCHEDULE_HEADERS, vec![schedule_row(&s)]));
            }
        }
        Some(("edit", sub)) => {
            session.authorize(Resource::ScheduledTransaction, Operation::Update)?;
            let id = required_id(sub, "id")?;
            let s = scheduled::update_scheduled(conn, caller, id, &edit_patch(sub)?)?;
            println!("Updated schedule {}", s.id);
        }
        Some(("next", sub)) => {
            let data = upcoming(conn, session, sub)?;
            if !print_json_if_requested(sub, &data)? {
                if data.is_empty() {
                    println!("No further occurrences");
                }
                let rows = data
                    .iter()
                    .map(|e| {
                        vec![
                            e.transaction.transaction_date.to_string(),
                            e.transaction.amount.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Date", "Amount"], rows));
            }
        }
        Some(("materialize", sub)) => {
            session.authorize(Resource::Transaction, Operation::Create)?;
            let id = required_id(sub, "id")?;
            let created = schedule::materialize(conn, caller, id, session.today)?;
            let view = created.map(LedgerEntry::unbalanced);
            if !print_json_if_requested(sub, &view)? {
                match view {
                    Some(e) => println!(
                        "Recorded transaction {} for {} on {}",
                        e.transaction.id, e.transaction.amount, e.transaction.transaction_date
                    ),
                    None => println!("Schedule {} has no further occurrences", id),
                }
            }
        }
        Some(("rm", sub)) => {
            session.authorize(Resource::ScheduledTransaction, Operation::Delete)?;
            let id = required_id(sub, "id")?;
            scheduled::delete_scheduled(conn, caller, id)?;
            println!("Removed schedule {}", id);
        }
        Some(("options", sub)) => {
            session.authorize(Resource::RepeatOption, Operation::Read)?;
            let data = scheduled::list_repeat_options(conn)?;
            if !print_json_if_requested(sub, &data)? {
                let rows = data
                    .iter()
                    .map(|o| {
                        vec![
                            o.id.to_string(),
                            o.name.clone(),
                            o.quantity.to_string(),
                            o.repeat_unit.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Id", "Name", "Every", "Unit"], rows));
            }
        }
        Some(("option-add", sub)) => {
            session.authorize(Resource::RepeatOption, Operation::Create)?;
            let unit = required(sub, "unit")?.parse::<RepeatUnit>()?;
            let quantity = sub.get_one::<u32>("quantity").copied().unwrap_or(1);
            let o = scheduled::create_repeat_option(conn, required(sub, "name")?, quantity, unit)?;
            println!("Added repeat option '{}' (id {})", o.name, o.id);
        }
        _ => {}
    }
    Ok(())
}

fn schedule_row(s: &ScheduledTransaction) -> Vec<String> {
    vec![
        s.id.to_string(),
        s.account_id.to_string(),
        s.repeat_option_id.to_string(),
        s.start_date.to_string(),
        fmt_opt(s.end_date),
        fmt_opt(s.limit_occurrences),
        s.fixed_amount
            .map(|a| a.to_string())
            .or_else(|| s.estimate_occurrences.map(|k| format!("avg of {}", k)))
            .unwrap_or_default(),
        fmt_opt(s.last_materialized_date),
    ]
}

/// `"none"` clears an optional field.
fn clearable<T>(
    m: &ArgMatches,
    name: &str,
    parse: impl Fn(&str) -> Result<T>,
) -> Result<Option<Option<T>>> {
    match m.get_one::<String>(name).map(|s| s.trim()) {
        None => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("none") => Ok(Some(None)),
        Some(s) => parse(s).map(|v| Some(Some(v))),
    }
}

/// A fixed amount and an estimate window exclude each other, so setting one
/// clears the other.
fn edit_patch(sub: &ArgMatches) -> Result<ScheduledTransactionPatch> {
    let mut patch = ScheduledTransactionPatch {
        transaction_type_id: reference_patch(sub, "type")?,
        payee_id: reference_patch(sub, "payee")?,
        category_id: reference_patch(sub, "category")?,
        start_date: optional_date(sub, "start")?,
        end_date: clearable(sub, "end", parse_date)?,
        limit_occurrences: clearable(sub, "limit", |s| {
            s.parse::<u32>()
                .with_context(|| format!("Invalid limit '{}'", s))
        })?,
        repeat_option_id: optional_id(sub, "repeat")?,
        notes: sub.get_one::<String>("notes").map(|s| Some(s.clone())),
        ..Default::default()
    };
    if let Some(amount) = optional_decimal(sub, "amount")? {
        patch.fixed_amount = Some(Some(amount));
        patch.estimate_occurrences = Some(None);
    }
    if let Some(k) = sub.get_one::<u32>("estimate").copied() {
        patch.estimate_occurrences = Some(Some(k));
        patch.fixed_amount = Some(None);
    }
    Ok(patch)
}

/// Preview rows for `schedule next`: the first is exactly what
/// `materialize` would write; later ones repeat its amount.
pub fn upcoming(conn: &Connection, session: &Session, sub: &ArgMatches) -> Result<Vec<LedgerEntry>> {
    session.authorize(Resource::ScheduledTransaction, Operation::Read)?;
    let id = required_id(sub, "id")?;
    let count = sub.get_one::<usize>("count").copied().unwrap_or(1);
    let Some(first) = schedule::preview(conn, &session.caller, id, session.today)? else {
        return Ok(Vec::new());
    };
    let s = scheduled::get_scheduled(conn, &session.caller, id)?;
    let cadence = Cadence::from_option(&scheduled::get_repeat_option(conn, s.repeat_option_id)?)?;
    let amount = first.transaction.amount;
    Ok(schedule::upcoming(
        cadence,
        s.start_date,
        s.end_date,
        s.limit_occurrences,
        first.transaction.transaction_date,
        count,
    )
    .into_iter()
    .map(|o| LedgerEntry::unbalanced(schedule::preview_transaction(&s, o.date, amount)))
    .collect())
}
