// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use rusqlite::{Connection, OptionalExtension, Row, named_params, params};

use super::{affected, ensure_member, ensure_reference, member_of, non_empty};
use crate::error::{QuantumError, QuantumResult};
use crate::models::Budget;
use crate::money::{from_cents, to_cents};
use crate::permissions::Caller;

fn map_budget(r: &Row<'_>) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        portfolio_id: r.get(1)?,
        category_id: r.get(2)?,
        name: r.get(3)?,
        amount: from_cents(r.get(4)?),
    })
}

/// The category must belong to the budget's portfolio.
pub fn create_budget(
    conn: &Connection,
    caller: &Caller,
    portfolio_id: i64,
    category_id: i64,
    name: &str,
    amount: Decimal,
) -> QuantumResult<Budget> {
    let name = non_empty(name, "budget")?;
    ensure_member(conn, caller, portfolio_id)?;
    ensure_reference(conn, "categories", "category", Some(category_id), portfolio_id)?;
    let cents = to_cents(amount)?;
    conn.execute(
        "INSERT INTO budgets(portfolio_id, category_id, name, amount) VALUES (?1, ?2, ?3, ?4)",
        params![portfolio_id, category_id, name, cents],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(budget_id = id, category_id, "budget created");
    get_budget(conn, caller, id)
}

pub fn get_budget(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<Budget> {
    let sql = format!(
        "SELECT b.id, b.portfolio_id, b.category_id, b.name, b.amount FROM budgets b
         WHERE b.id=:id AND {}",
        member_of("b.portfolio_id")
    );
    conn.query_row(&sql, named_params! {":id": id, ":user_id": caller.user_id}, map_budget)
        .optional()?
        .ok_or(QuantumError::NotFound("budget"))
}

/// Every budget in every portfolio the caller belongs to.
pub fn list_budgets(conn: &Connection, caller: &Caller) -> QuantumResult<Vec<Budget>> {
    let sql = format!(
        "SELECT b.id, b.portfolio_id, b.category_id, b.name, b.amount FROM budgets b
         WHERE {}
         ORDER BY b.portfolio_id, b.name, b.id",
        member_of("b.portfolio_id")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(named_params! {":user_id": caller.user_id}, map_budget)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn update_budget(
    conn: &Connection,
    caller: &Caller,
    id: i64,
    name: Option<&str>,
    category_id: Option<i64>,
    amount: Option<Decimal>,
) -> QuantumResult<Budget> {
    let current = get_budget(conn, caller, id)?;
    let name = match name {
        Some(n) => non_empty(n, "budget")?,
        None => current.name.clone(),
    };
    let category_id = category_id.unwrap_or(current.category_id);
    ensure_reference(
        conn,
        "categories",
        "category",
        Some(category_id),
        current.portfolio_id,
    )?;
    let cents = to_cents(amount.unwrap_or(current.amount))?;
    conn.execute(
        "UPDATE budgets SET name=?1, category_id=?2, amount=?3 WHERE id=?4",
        params![name, category_id, cents, id],
    )?;
    get_budget(conn, caller, id)
}

pub fn delete_budget(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<()> {
    get_budget(conn, caller, id)?;
    let n = conn.execute("DELETE FROM budgets WHERE id=?1", params![id])?;
    affected(n, "budget")
}
