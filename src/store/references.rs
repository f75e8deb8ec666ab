// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Payees and transaction types: named, portfolio-scoped labels.

use rusqlite::{Connection, OptionalExtension, Row, named_params, params};

use super::{affected, ensure_member, member_of, non_empty};
use crate::error::{QuantumError, QuantumResult};
use crate::models::NamedReference;
use crate::permissions::{Caller, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Payee,
    TransactionType,
}

impl ReferenceKind {
    pub fn table(self) -> &'static str {
        match self {
            ReferenceKind::Payee => "payees",
            ReferenceKind::TransactionType => "transaction_types",
        }
    }

    pub fn entity(self) -> &'static str {
        match self {
            ReferenceKind::Payee => "payee",
            ReferenceKind::TransactionType => "transaction type",
        }
    }

    pub fn resource(self) -> Resource {
        match self {
            ReferenceKind::Payee => Resource::Payee,
            ReferenceKind::TransactionType => Resource::TransactionType,
        }
    }
}

fn map_reference(r: &Row<'_>) -> rusqlite::Result<NamedReference> {
    Ok(NamedReference {
        id: r.get(0)?,
        portfolio_id: r.get(1)?,
        name: r.get(2)?,
    })
}

pub fn create_reference(
    conn: &Connection,
    caller: &Caller,
    kind: ReferenceKind,
    portfolio_id: i64,
    name: &str,
) -> QuantumResult<NamedReference> {
    let name = non_empty(name, kind.entity())?;
    ensure_member(conn, caller, portfolio_id)?;
    let sql = format!("INSERT INTO {}(portfolio_id, name) VALUES (?1, ?2)", kind.table());
    conn.execute(&sql, params![portfolio_id, name])?;
    get_reference(conn, caller, kind, conn.last_insert_rowid())
}

pub fn get_reference(
    conn: &Connection,
    caller: &Caller,
    kind: ReferenceKind,
    id: i64,
) -> QuantumResult<NamedReference> {
    let sql = format!(
        "SELECT x.id, x.portfolio_id, x.name FROM {} x WHERE x.id=:id AND {}",
        kind.table(),
        member_of("x.portfolio_id")
    );
    conn.query_row(&sql, named_params! {":id": id, ":user_id": caller.user_id}, map_reference)
        .optional()?
        .ok_or(QuantumError::NotFound(kind.entity()))
}

pub fn list_references(
    conn: &Connection,
    caller: &Caller,
    kind: ReferenceKind,
    portfolio_id: i64,
) -> QuantumResult<Vec<NamedReference>> {
    ensure_member(conn, caller, portfolio_id)?;
    let sql = format!(
        "SELECT id, portfolio_id, name FROM {} WHERE portfolio_id=?1 ORDER BY name",
        kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![portfolio_id], map_reference)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn rename_reference(
    conn: &Connection,
    caller: &Caller,
    kind: ReferenceKind,
    id: i64,
    name: &str,
) -> QuantumResult<NamedReference> {
    let name = non_empty(name, kind.entity())?;
    get_reference(conn, caller, kind, id)?;
    let sql = format!("UPDATE {} SET name=?1 WHERE id=?2", kind.table());
    conn.execute(&sql, params![name, id])?;
    get_reference(conn, caller, kind, id)
}

pub fn delete_reference(
    conn: &Connection,
    caller: &Caller,
    kind: ReferenceKind,
    id: i64,
) -> QuantumResult<()> {
    get_reference(conn, caller, kind, id)?;
    let sql = format!("DELETE FROM {} WHERE id=?1", kind.table());
    let n = conn.execute(&sql, params![id])?;
    affected(n, kind.entity())
}
