// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Scheduled transaction templates and the repeat options they point at.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, named_params, params};

use super::{accounts, affected, ensure_reference, member_of, non_empty};
use crate::error::{QuantumError, QuantumResult};
use crate::models::{
    NewScheduledTransaction, RepeatOption, RepeatUnit, ScheduledTransaction,
    ScheduledTransactionPatch,
};
use crate::money::{from_cents, to_cents_opt};
use crate::permissions::Caller;

const SCHEDULED_COLUMNS: &str = "s.id, s.account_id, s.transaction_type_id, s.payee_id, s.category_id, \
     s.fixed_amount, s.estimate_occurrences, s.start_date, s.end_date, s.limit_occurrences, \
     s.repeat_option_id, s.last_materialized_date, s.notes";

fn map_scheduled(r: &Row<'_>) -> rusqlite::Result<ScheduledTransaction> {
    let fixed: Option<i64> = r.get(5)?;
    Ok(ScheduledTransaction {
        id: r.get(0)?,
        account_id: r.get(1)?,
        transaction_type_id: r.get(2)?,
        payee_id: r.get(3)?,
        category_id: r.get(4)?,
        fixed_amount: fixed.map(from_cents),
        estimate_occurrences: r.get(6)?,
        start_date: r.get(7)?,
        end_date: r.get(8)?,
        limit_occurrences: r.get(9)?,
        repeat_option_id: r.get(10)?,
        last_materialized_date: r.get(11)?,
        notes: r.get(12)?,
    })
}

fn validate(new: &NewScheduledTransaction) -> QuantumResult<()> {
    match (new.fixed_amount, new.estimate_occurrences) {
        (None, None) => {
            return Err(QuantumError::validation(
                "a schedule needs a fixed amount or a number of occurrences to estimate from",
            ));
        }
        (_, Some(0)) => {
            return Err(QuantumError::validation(
                "estimate occurrences must be at least 1",
            ));
        }
        _ => {}
    }
    if new.end_date.is_some_and(|end| end < new.start_date) {
        return Err(QuantumError::validation("end date is before start date"));
    }
    Ok(())
}

/// Field rules plus tenancy of every referenced row.
fn check_references(
    conn: &Connection,
    caller: &Caller,
    new: &NewScheduledTransaction,
) -> QuantumResult<()> {
    validate(new)?;
    let account = accounts::get_account(conn, caller, new.account_id)?;
    ensure_reference(conn, "transaction_types", "transaction type", new.transaction_type_id, account.portfolio_id)?;
    ensure_reference(conn, "payees", "payee", new.payee_id, account.portfolio_id)?;
    ensure_reference(conn, "categories", "category", new.category_id, account.portfolio_id)?;
    get_repeat_option(conn, new.repeat_option_id)?;
    Ok(())
}

pub fn create_scheduled(
    conn: &Connection,
    caller: &Caller,
    new: &NewScheduledTransaction,
) -> QuantumResult<ScheduledTransaction> {
    check_references(conn, caller, new)?;
    let fixed = to_cents_opt(new.fixed_amount)?;
    conn.execute(
        "INSERT INTO scheduled_transactions(account_id, transaction_type_id, payee_id, category_id,
             fixed_amount, estimate_occurrences, start_date, end_date, limit_occurrences,
             repeat_option_id, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            new.account_id,
            new.transaction_type_id,
            new.payee_id,
            new.category_id,
            fixed,
            new.estimate_occurrences,
            new.start_date,
            new.end_date,
            new.limit_occurrences,
            new.repeat_option_id,
            new.notes
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(scheduled_id = id, account_id = new.account_id, "schedule created");
    get_scheduled(conn, caller, id)
}

pub fn get_scheduled(
    conn: &Connection,
    caller: &Caller,
    id: i64,
) -> QuantumResult<ScheduledTransaction> {
    let sql = format!(
        "SELECT {} FROM scheduled_transactions s
         JOIN accounts a ON a.id=s.account_id
         WHERE s.id=:id AND {}",
        SCHEDULED_COLUMNS,
        member_of("a.portfolio_id")
    );
    conn.query_row(&sql, named_params! {":id": id, ":user_id": caller.user_id}, map_scheduled)
        .optional()?
        .ok_or(QuantumError::NotFound("scheduled transaction"))
}

pub fn list_scheduled(
    conn: &Connection,
    caller: &Caller,
    account_id: Option<i64>,
) -> QuantumResult<Vec<ScheduledTransaction>> {
    let sql = format!(
        "SELECT {} FROM scheduled_transactions s
         JOIN accounts a ON a.id=s.account_id
         WHERE (:account_id IS NULL OR s.account_id=:account_id) AND {}
         ORDER BY s.account_id, s.start_date, s.id",
        SCHEDULED_COLUMNS,
        member_of("a.portfolio_id")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        named_params! {":account_id": account_id, ":user_id": caller.user_id},
        map_scheduled,
    )?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Applies `patch`. The account and `last_materialized_date` are kept.
pub fn update_scheduled(
    conn: &Connection,
    caller: &Caller,
    id: i64,
    patch: &ScheduledTransactionPatch,
) -> QuantumResult<ScheduledTransaction> {
    let current = get_scheduled(conn, caller, id)?;
    let merged = NewScheduledTransaction {
        account_id: current.account_id,
        transaction_type_id: patch.transaction_type_id.unwrap_or(current.transaction_type_id),
        payee_id: patch.payee_id.unwrap_or(current.payee_id),
        category_id: patch.category_id.unwrap_or(current.category_id),
        fixed_amount: patch.fixed_amount.unwrap_or(current.fixed_amount),
        estimate_occurrences: patch
            .estimate_occurrences
            .unwrap_or(current.estimate_occurrences),
        start_date: patch.start_date.unwrap_or(current.start_date),
        end_date: patch.end_date.unwrap_or(current.end_date),
        limit_occurrences: patch.limit_occurrences.unwrap_or(current.limit_occurrences),
        repeat_option_id: patch.repeat_option_id.unwrap_or(current.repeat_option_id),
        notes: patch.notes.clone().unwrap_or(current.notes),
    };
    check_references(conn, caller, &merged)?;
    let fixed = to_cents_opt(merged.fixed_amount)?;
    let n = conn.execute(
        "UPDATE scheduled_transactions SET transaction_type_id=?1, payee_id=?2, category_id=?3,
                fixed_amount=?4, estimate_occurrences=?5, start_date=?6, end_date=?7,
                limit_occurrences=?8, repeat_option_id=?9, notes=?10
         WHERE id=?11",
        params![
            merged.transaction_type_id,
            merged.payee_id,
            merged.category_id,
            fixed,
            merged.estimate_occurrences,
            merged.start_date,
            merged.end_date,
            merged.limit_occurrences,
            merged.repeat_option_id,
            merged.notes,
            id
        ],
    )?;
    affected(n, "scheduled transaction")?;
    tracing::info!(scheduled_id = id, "schedule updated");
    get_scheduled(conn, caller, id)
}

pub fn delete_scheduled(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<()> {
    get_scheduled(conn, caller, id)?;
    let n = conn.execute("DELETE FROM scheduled_transactions WHERE id=?1", params![id])?;
    affected(n, "scheduled transaction")
}

pub fn set_last_materialized(conn: &Connection, id: i64, date: NaiveDate) -> QuantumResult<()> {
    let n = conn.execute(
        "UPDATE scheduled_transactions SET last_materialized_date=?1 WHERE id=?2",
        params![date, id],
    )?;
    affected(n, "scheduled transaction")
}

const REPEAT_OPTION_SQL: &str = "SELECT o.id, o.name, o.quantity, u.name, o.order_index
     FROM repeat_options o JOIN repeat_units u ON u.id=o.repeat_unit_id";

fn map_repeat_option(r: &Row<'_>) -> rusqlite::Result<(i64, String, u32, String, i64)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
}

fn into_repeat_option(raw: (i64, String, u32, String, i64)) -> QuantumResult<RepeatOption> {
    let (id, name, quantity, unit, order_index) = raw;
    let repeat_unit = unit.parse::<RepeatUnit>().map_err(|_| {
        QuantumError::IntegrityViolation(format!(
            "repeat option {} uses unknown unit '{}'",
            id, unit
        ))
    })?;
    Ok(RepeatOption {
        id,
        name,
        quantity,
        repeat_unit,
        order_index,
    })
}

pub fn list_repeat_options(conn: &Connection) -> QuantumResult<Vec<RepeatOption>> {
    let sql = format!("{} ORDER BY o.order_index, o.id", REPEAT_OPTION_SQL);
    let mut stmt = conn.prepare(&sql)?;
    let raw = stmt
        .query_map([], map_repeat_option)?
        .collect::<Result<Vec<_>, _>>()?;
    raw.into_iter().map(into_repeat_option).collect()
}

pub fn get_repeat_option(conn: &Connection, id: i64) -> QuantumResult<RepeatOption> {
    let sql = format!("{} WHERE o.id=?1", REPEAT_OPTION_SQL);
    let raw = conn
        .query_row(&sql, params![id], map_repeat_option)
        .optional()?
        .ok_or(QuantumError::NotFound("repeat option"))?;
    into_repeat_option(raw)
}

/// Repeat options are global; only super users reach this through the
/// command layer.
pub fn create_repeat_option(
    conn: &Connection,
    name: &str,
    quantity: u32,
    unit: RepeatUnit,
) -> QuantumResult<RepeatOption> {
    let name = non_empty(name, "repeat option")?;
    if quantity == 0 {
        return Err(QuantumError::validation("repeat quantity must be at least 1"));
    }
    let n = conn.execute(
        "INSERT INTO repeat_options(name, quantity, repeat_unit_id, order_index)
         SELECT ?1, ?2, u.id, (SELECT COALESCE(MAX(order_index), -1) + 1 FROM repeat_options)
         FROM repeat_units u WHERE u.name=?3",
        params![name, quantity, unit.as_str()],
    )?;
    affected(n, "repeat unit")?;
    get_repeat_option(conn, conn.last_insert_rowid())
}
