// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use rusqlite::{Connection, OptionalExtension, Row, named_params, params};

use super::{affected, ensure_member, member_of, non_empty};
use crate::error::{QuantumError, QuantumResult};
use crate::models::Account;
use crate::money::{from_cents, to_cents};
use crate::permissions::Caller;
use crate::summaries;

fn map_account(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        portfolio_id: r.get(1)?,
        name: r.get(2)?,
        starting_balance: from_cents(r.get(3)?),
    })
}

pub fn create_account(
    conn: &Connection,
    caller: &Caller,
    portfolio_id: i64,
    name: &str,
    starting_balance: Decimal,
) -> QuantumResult<Account> {
    let name = non_empty(name, "account")?;
    ensure_member(conn, caller, portfolio_id)?;
    let cents = to_cents(starting_balance)?;
    conn.execute(
        "INSERT INTO accounts(portfolio_id, name, starting_balance) VALUES (?1, ?2, ?3)",
        params![portfolio_id, name, cents],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(account_id = id, portfolio_id, "account created");
    get_account(conn, caller, id)
}

pub fn get_account(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<Account> {
    let sql = format!(
        "SELECT a.id, a.portfolio_id, a.name, a.starting_balance FROM accounts a
         WHERE a.id=:id AND {}",
        member_of("a.portfolio_id")
    );
    conn.query_row(&sql, named_params! {":id": id, ":user_id": caller.user_id}, map_account)
        .optional()?
        .ok_or(QuantumError::NotFound("account"))
}

pub fn list_accounts(
    conn: &Connection,
    caller: &Caller,
    portfolio_id: Option<i64>,
) -> QuantumResult<Vec<Account>> {
    let sql = format!(
        "SELECT a.id, a.portfolio_id, a.name, a.starting_balance FROM accounts a
         WHERE (:portfolio_id IS NULL OR a.portfolio_id=:portfolio_id) AND {}
         ORDER BY a.portfolio_id, a.name",
        member_of("a.portfolio_id")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        named_params! {":portfolio_id": portfolio_id, ":user_id": caller.user_id},
        map_account,
    )?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// A changed starting balance shifts every checkpoint, so they are dropped.
pub fn update_account(
    conn: &Connection,
    caller: &Caller,
    id: i64,
    name: Option<&str>,
    starting_balance: Option<Decimal>,
) -> QuantumResult<Account> {
    let current = get_account(conn, caller, id)?;
    let name = match name {
        Some(n) => non_empty(n, "account")?,
        None => current.name.clone(),
    };
    let tx = conn.unchecked_transaction()?;
    let cents = match starting_balance {
        Some(balance) => to_cents(balance)?,
        None => to_cents(current.starting_balance)?,
    };
    tx.execute(
        "UPDATE accounts SET name=?1, starting_balance=?2 WHERE id=?3",
        params![name, cents, id],
    )?;
    if starting_balance.is_some_and(|b| b != current.starting_balance) {
        summaries::invalidate_all(&tx, id)?;
    }
    tx.commit()?;
    get_account(conn, caller, id)
}

pub fn delete_account(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<()> {
    get_account(conn, caller, id)?;
    let n = conn.execute("DELETE FROM accounts WHERE id=?1", params![id])?;
    affected(n, "account")?;
    tracing::info!(account_id = id, "account deleted");
    Ok(())
}
