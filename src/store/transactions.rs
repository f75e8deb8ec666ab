// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transaction writes keep the monthly checkpoints honest: any change that
//! touches a clear date drops the checkpoints from that month onward.

use rusqlite::{Connection, OptionalExtension, named_params, params};

use super::{accounts, affected, ensure_reference, member_of};
use crate::error::{QuantumError, QuantumResult};
use crate::models::{NewTransaction, Transaction, TransactionPatch};
use crate::money::to_cents;
use crate::permissions::Caller;
use crate::queries::{TRANSACTION_COLUMNS, map_transaction};
use crate::summaries;

fn ensure_references(
    conn: &Connection,
    portfolio_id: i64,
    transaction_type_id: Option<i64>,
    payee_id: Option<i64>,
    category_id: Option<i64>,
) -> QuantumResult<()> {
    ensure_reference(conn, "transaction_types", "transaction type", transaction_type_id, portfolio_id)?;
    ensure_reference(conn, "payees", "payee", payee_id, portfolio_id)?;
    ensure_reference(conn, "categories", "category", category_id, portfolio_id)
}

/// Inserts `new` without opening a transaction of its own, so callers can
/// group it with other writes. Returns the new row id.
pub fn insert_transaction(
    conn: &Connection,
    caller: &Caller,
    new: &NewTransaction,
) -> QuantumResult<i64> {
    let account = accounts::get_account(conn, caller, new.account_id)?;
    ensure_references(
        conn,
        account.portfolio_id,
        new.transaction_type_id,
        new.payee_id,
        new.category_id,
    )?;
    let cents = to_cents(new.amount)?;
    conn.execute(
        "INSERT INTO transactions(account_id, transaction_type_id, payee_id, category_id, amount,
                                  transaction_date, clear_date, check_number, exclude_from_forecast, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            new.account_id,
            new.transaction_type_id,
            new.payee_id,
            new.category_id,
            cents,
            new.transaction_date,
            new.clear_date,
            new.check_number,
            new.exclude_from_forecast,
            new.notes
        ],
    )?;
    let id = conn.last_insert_rowid();
    if let Some(cleared) = new.clear_date {
        summaries::invalidate_from(conn, new.account_id, cleared)?;
    }
    Ok(id)
}

pub fn create_transaction(
    conn: &Connection,
    caller: &Caller,
    new: &NewTransaction,
) -> QuantumResult<Transaction> {
    let tx = conn.unchecked_transaction()?;
    let id = insert_transaction(&tx, caller, new)?;
    tx.commit()?;
    tracing::info!(transaction_id = id, account_id = new.account_id, amount = %new.amount, "transaction recorded");
    get_transaction(conn, caller, id)
}

pub fn get_transaction(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<Transaction> {
    let sql = format!(
        "SELECT {} FROM transactions t
         JOIN accounts a ON a.id=t.account_id
         WHERE t.id=:id AND {}",
        TRANSACTION_COLUMNS,
        member_of("a.portfolio_id")
    );
    conn.query_row(&sql, named_params! {":id": id, ":user_id": caller.user_id}, map_transaction)
        .optional()?
        .ok_or(QuantumError::NotFound("transaction"))
}

/// Applies `patch`. The owning account cannot change.
pub fn update_transaction(
    conn: &Connection,
    caller: &Caller,
    id: i64,
    patch: &TransactionPatch,
) -> QuantumResult<Transaction> {
    let current = get_transaction(conn, caller, id)?;
    let account = accounts::get_account(conn, caller, current.account_id)?;

    let transaction_type_id = patch.transaction_type_id.unwrap_or(current.transaction_type_id);
    let payee_id = patch.payee_id.unwrap_or(current.payee_id);
    let category_id = patch.category_id.unwrap_or(current.category_id);
    ensure_references(conn, account.portfolio_id, transaction_type_id, payee_id, category_id)?;

    let amount = patch.amount.unwrap_or(current.amount);
    let cents = to_cents(amount)?;
    let transaction_date = patch.transaction_date.unwrap_or(current.transaction_date);
    let clear_date = patch.clear_date.unwrap_or(current.clear_date);
    let check_number = patch.check_number.clone().unwrap_or(current.check_number.clone());
    let exclude = patch
        .exclude_from_forecast
        .unwrap_or(current.exclude_from_forecast);
    let notes = patch.notes.clone().unwrap_or(current.notes.clone());

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE transactions SET transaction_type_id=?1, payee_id=?2, category_id=?3, amount=?4,
                transaction_date=?5, clear_date=?6, check_number=?7, exclude_from_forecast=?8, notes=?9
         WHERE id=?10",
        params![
            transaction_type_id,
            payee_id,
            category_id,
            cents,
            transaction_date,
            clear_date,
            check_number,
            exclude,
            notes,
            id
        ],
    )?;
    let earliest = [current.clear_date, clear_date].into_iter().flatten().min();
    if let Some(from) = earliest {
        summaries::invalidate_from(&tx, current.account_id, from)?;
    }
    tx.commit()?;
    tracing::info!(transaction_id = id, "transaction updated");
    get_transaction(conn, caller, id)
}

pub fn delete_transaction(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<()> {
    let current = get_transaction(conn, caller, id)?;
    let tx = conn.unchecked_transaction()?;
    let n = tx.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    affected(n, "transaction")?;
    if let Some(cleared) = current.clear_date {
        summaries::invalidate_from(&tx, current.account_id, cleared)?;
    }
    tx.commit()?;
    tracing::info!(transaction_id = id, "transaction deleted");
    Ok(())
}
