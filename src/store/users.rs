// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{QuantumError, QuantumResult};
use crate::models::User;
use crate::permissions::{Caller, Role};

const USER_COLUMNS: &str = "id, email, first_name, last_name, role";

fn map_user(r: &Row<'_>) -> rusqlite::Result<(i64, String, String, String, String)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
}

fn into_user(raw: (i64, String, String, String, String)) -> QuantumResult<User> {
    let (id, email, first_name, last_name, role) = raw;
    let role = role
        .parse::<Role>()
        .map_err(|_| QuantumError::IntegrityViolation(format!("user {} has role '{}'", id, role)))?;
    Ok(User {
        id,
        email,
        first_name,
        last_name,
        role,
    })
}

impl From<User> for Caller {
    fn from(user: User) -> Self {
        Caller {
            user_id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

pub fn count_users(conn: &Connection) -> QuantumResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?)
}

pub fn create_user(
    conn: &Connection,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> QuantumResult<User> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(QuantumError::validation(format!("'{}' is not an email address", email)));
    }
    conn.execute(
        "INSERT INTO users(email, first_name, last_name, role) VALUES (?1, ?2, ?3, ?4)",
        params![email, first_name.trim(), last_name.trim(), role.as_str()],
    )?;
    tracing::info!(%email, %role, "user created");
    get_user(conn, conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> QuantumResult<User> {
    let sql = format!("SELECT {} FROM users WHERE id=?1", USER_COLUMNS);
    let raw = conn.query_row(&sql, params![id], map_user).optional()?;
    raw.map(into_user).ok_or(QuantumError::NotFound("user"))?
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> QuantumResult<User> {
    let sql = format!("SELECT {} FROM users WHERE email=?1", USER_COLUMNS);
    let raw = conn
        .query_row(&sql, params![email.trim().to_lowercase()], map_user)
        .optional()?;
    raw.map(into_user).ok_or(QuantumError::NotFound("user"))?
}

pub fn list_users(conn: &Connection) -> QuantumResult<Vec<User>> {
    let sql = format!("SELECT {} FROM users ORDER BY email", USER_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_user)?;
    rows.map(|raw| into_user(raw?)).collect()
}
