// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, Row, named_params, params};

use super::{affected, ensure_member, ensure_reference, member_of, non_empty};
use crate::category_tree::CategoryTree;
use crate::error::{QuantumError, QuantumResult};
use crate::models::Category;
use crate::permissions::Caller;

fn map_category(r: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: r.get(0)?,
        portfolio_id: r.get(1)?,
        name: r.get(2)?,
        parent_category_id: r.get(3)?,
    })
}

pub fn create_category(
    conn: &Connection,
    caller: &Caller,
    portfolio_id: i64,
    name: &str,
    parent_category_id: Option<i64>,
) -> QuantumResult<Category> {
    let name = non_empty(name, "category")?;
    ensure_member(conn, caller, portfolio_id)?;
    ensure_reference(
        conn,
        "categories",
        "parent category",
        parent_category_id,
        portfolio_id,
    )?;
    conn.execute(
        "INSERT INTO categories(portfolio_id, name, parent_category_id) VALUES (?1, ?2, ?3)",
        params![portfolio_id, name, parent_category_id],
    )?;
    get_category(conn, caller, conn.last_insert_rowid())
}

pub fn get_category(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<Category> {
    let sql = format!(
        "SELECT c.id, c.portfolio_id, c.name, c.parent_category_id FROM categories c
         WHERE c.id=:id AND {}",
        member_of("c.portfolio_id")
    );
    conn.query_row(&sql, named_params! {":id": id, ":user_id": caller.user_id}, map_category)
        .optional()?
        .ok_or(QuantumError::NotFound("category"))
}

pub fn list_categories(
    conn: &Connection,
    caller: &Caller,
    portfolio_id: i64,
) -> QuantumResult<Vec<Category>> {
    ensure_member(conn, caller, portfolio_id)?;
    let mut stmt = conn.prepare(
        "SELECT id, portfolio_id, name, parent_category_id FROM categories
         WHERE portfolio_id=?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![portfolio_id], map_category)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn category_tree(conn: &Connection, caller: &Caller, portfolio_id: i64) -> QuantumResult<CategoryTree> {
    Ok(CategoryTree::new(list_categories(conn, caller, portfolio_id)?))
}

pub fn rename_category(
    conn: &Connection,
    caller: &Caller,
    id: i64,
    name: &str,
) -> QuantumResult<Category> {
    let name = non_empty(name, "category")?;
    get_category(conn, caller, id)?;
    conn.execute("UPDATE categories SET name=?1 WHERE id=?2", params![name, id])?;
    get_category(conn, caller, id)
}

/// Moves a category under `parent` (or to the top level), refusing moves
/// that would make it its own ancestor.
pub fn set_parent(
    conn: &Connection,
    caller: &Caller,
    id: i64,
    parent: Option<i64>,
) -> QuantumResult<Category> {
    let category = get_category(conn, caller, id)?;
    let tree = category_tree(conn, caller, category.portfolio_id)?;
    tree.check_parent(id, parent)?;
    conn.execute(
        "UPDATE categories SET parent_category_id=?1 WHERE id=?2",
        params![parent, id],
    )?;
    tracing::info!(category_id = id, ?parent, "category moved");
    get_category(conn, caller, id)
}

/// Children are re-attached to the top level; transactions lose their
/// category; budgets on it are removed.
pub fn delete_category(conn: &Connection, caller: &Caller, id: i64) -> QuantumResult<()> {
    get_category(conn, caller, id)?;
    let n = conn.execute("DELETE FROM categories WHERE id=?1", params![id])?;
    affected(n, "category")
}
