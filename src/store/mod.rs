// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Portfolio-scoped CRUD. Every read joins through `portfolio_users`, so an
//! id outside the caller's memberships behaves exactly like a missing id.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod portfolios;
pub mod references;
pub mod scheduled;
pub mod transactions;
pub mod users;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{QuantumError, QuantumResult};
use crate::permissions::Caller;

/// Membership predicate for a `portfolio_id` column expression; binds the
/// caller's user id as the named parameter `:user_id`.
pub(crate) fn member_of(portfolio_column: &str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM portfolio_users pu WHERE pu.portfolio_id={} AND pu.user_id=:user_id)",
        portfolio_column
    )
}

pub(crate) fn ensure_member(
    conn: &Connection,
    caller: &Caller,
    portfolio_id: i64,
) -> QuantumResult<()> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM portfolio_users WHERE portfolio_id=?1 AND user_id=?2",
            params![portfolio_id, caller.user_id],
            |r| r.get(0),
        )
        .optional()?;
    found.map(|_| ()).ok_or(QuantumError::NotFound("portfolio"))
}

/// Checks that an optional reference (`payee`, `category`, ...) lives in
/// `portfolio_id`. A reference from another portfolio is reported as not
/// found.
pub(crate) fn ensure_reference(
    conn: &Connection,
    table: &'static str,
    entity: &'static str,
    id: Option<i64>,
    portfolio_id: i64,
) -> QuantumResult<()> {
    let Some(id) = id else {
        return Ok(());
    };
    let sql = format!("SELECT 1 FROM {} WHERE id=?1 AND portfolio_id=?2", table);
    let found: Option<i64> = conn
        .query_row(&sql, params![id, portfolio_id], |r| r.get(0))
        .optional()?;
    found.map(|_| ()).ok_or(QuantumError::NotFound(entity))
}

pub(crate) fn non_empty(name: &str, what: &str) -> QuantumResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(QuantumError::validation(format!("{} name cannot be empty", what)));
    }
    Ok(trimmed.to_string())
}

/// Maps "no row affected" to `NotFound`.
pub(crate) fn affected(count: usize, entity: &'static str) -> QuantumResult<()> {
    if count == 0 {
        Err(QuantumError::NotFound(entity))
    } else {
        Ok(())
    }
}
