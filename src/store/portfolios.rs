// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, named_params, params};

use super::{affected, ensure_member, member_of, non_empty};
use crate::error::{QuantumError, QuantumResult};
use crate::models::{Portfolio, User};
use crate::permissions::Caller;
use crate::store::users;

/// Creates the portfolio and makes the caller its first member.
pub fn create_portfolio(conn: &Connection, caller: &Caller, name: &str) -> QuantumResult<Portfolio> {
    let name = non_empty(name, "portfolio")?;
    let tx = conn.unchecked_transaction()?;
    tx.execute("INSERT INTO portfolios(name) VALUES (?1)", params![name])?;
    let id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO portfolio_users(portfolio_id, user_id) VALUES (?1, ?2)",
        params![id, caller.user_id],
    )?;
    tx.commit()?;
    tracing::info!(portfolio_id = id, user = %caller.email, "portfolio created");
    Ok(Portfolio { id, name })
}

pub fn get_portfolio(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<Portfolio> {
    let sql = format!(
        "SELECT p.id, p.name FROM portfolios p WHERE p.id=:id AND {}",
        member_of("p.id")
    );
    conn.query_row(
        &sql,
        named_params! {":id": id, ":user_id": caller.user_id},
        |r| {
            Ok(Portfolio {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(QuantumError::NotFound("portfolio"))
}

pub fn list_portfolios(conn: &Connection, caller: &Caller) -> QuantumResult<Vec<Portfolio>> {
    let sql = format!(
        "SELECT p.id, p.name FROM portfolios p WHERE {} ORDER BY p.name, p.id",
        member_of("p.id")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(named_params! {":user_id": caller.user_id}, |r| {
        Ok(Portfolio {
            id: r.get(0)?,
            name: r.get(1)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn rename_portfolio(
    conn: &Connection,
    caller: &Caller,
    id: i64,
    name: &str,
) -> QuantumResult<Portfolio> {
    let name = non_empty(name, "portfolio")?;
    ensure_member(conn, caller, id)?;
    let n = conn.execute("UPDATE portfolios SET name=?1 WHERE id=?2", params![name, id])?;
    affected(n, "portfolio")?;
    Ok(Portfolio { id, name })
}

/// Deleting a portfolio cascades to everything it owns.
pub fn delete_portfolio(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<()> {
    ensure_member(conn, caller, id)?;
    let n = conn.execute("DELETE FROM portfolios WHERE id=?1", params![id])?;
    affected(n, "portfolio")?;
    tracing::info!(portfolio_id = id, user = %caller.email, "portfolio deleted");
    Ok(())
}

pub fn add_member(
    conn: &Connection,
    caller: &Caller,
    portfolio_id: i64,
    email: &str,
) -> QuantumResult<User> {
    ensure_member(conn, caller, portfolio_id)?;
    let user = users::find_user_by_email(conn, email)?;
    conn.execute(
        "INSERT OR IGNORE INTO portfolio_users(portfolio_id, user_id) VALUES (?1, ?2)",
        params![portfolio_id, user.id],
    )?;
    tracing::info!(portfolio_id, member = %user.email, "member added");
    Ok(user)
}

/// A portfolio always keeps at least one member.
pub fn remove_member(
    conn: &Connection,
    caller: &Caller,
    portfolio_id: i64,
    email: &str,
) -> QuantumResult<()> {
    ensure_member(conn, caller, portfolio_id)?;
    let user = users::find_user_by_email(conn, email)?;
    let members: i64 = conn.query_row(
        "SELECT COUNT(*) FROM portfolio_users WHERE portfolio_id=?1",
        params![portfolio_id],
        |r| r.get(0),
    )?;
    if members <= 1 {
        return Err(QuantumError::validation(
            "cannot remove the last member of a portfolio",
        ));
    }
    let n = conn.execute(
        "DELETE FROM portfolio_users WHERE portfolio_id=?1 AND user_id=?2",
        params![portfolio_id, user.id],
    )?;
    affected(n, "portfolio member")
}

pub fn list_members(conn: &Connection, caller: &Caller, portfolio_id: i64) -> QuantumResult<Vec<User>> {
    ensure_member(conn, caller, portfolio_id)?;
    let mut stmt = conn.prepare(
        "SELECT u.id FROM users u
         JOIN portfolio_users pu ON pu.user_id=u.id
         WHERE pu.portfolio_id=?1 ORDER BY u.email",
    )?;
    let ids = stmt
        .query_map(params![portfolio_id], |r| r.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    ids.into_iter().map(|id| users::get_user(conn, id)).collect()
}
