// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, params};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::RepeatUnit;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Quantum", "quantum"));

/// (name, quantity, unit) in display order.
const REPEAT_OPTIONS: &[(&str, u32, RepeatUnit)] = &[
    ("Daily", 1, RepeatUnit::Day),
    ("Weekly", 1, RepeatUnit::Week),
    ("Bi-Weekly", 2, RepeatUnit::Week),
    ("Semi-Monthly", 1, RepeatUnit::SemiMonth),
    ("Monthly", 1, RepeatUnit::Month),
    ("Quarterly", 3, RepeatUnit::Month),
    ("Semi-Annually", 6, RepeatUnit::Month),
    ("Annually", 1, RepeatUnit::Year),
];

pub fn default_db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("quantum.sqlite"))
}

pub fn open_or_init(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Create DB directory {}", parent.display()))?;
    }
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Fresh in-memory database with the full schema, used by tests.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        role TEXT NOT NULL CHECK(role IN ('super_user','administrator','user')),
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS portfolios(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS portfolio_users(
        portfolio_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        PRIMARY KEY(portfolio_id, user_id),
        FOREIGN KEY(portfolio_id) REFERENCES portfolios(id) ON DELETE CASCADE,
        FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_portfolio_users_user ON portfolio_users(user_id);

    -- money columns hold integer cents
    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        portfolio_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        starting_balance INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(portfolio_id, name),
        FOREIGN KEY(portfolio_id) REFERENCES portfolios(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        portfolio_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        parent_category_id INTEGER,
        UNIQUE(portfolio_id, name),
        FOREIGN KEY(portfolio_id) REFERENCES portfolios(id) ON DELETE CASCADE,
        FOREIGN KEY(parent_category_id) REFERENCES categories(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS payees(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        portfolio_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(portfolio_id, name),
        FOREIGN KEY(portfolio_id) REFERENCES portfolios(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS transaction_types(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        portfolio_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        UNIQUE(portfolio_id, name),
        FOREIGN KEY(portfolio_id) REFERENCES portfolios(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        transaction_type_id INTEGER,
        payee_id INTEGER,
        category_id INTEGER,
        amount INTEGER NOT NULL,
        transaction_date TEXT NOT NULL,
        clear_date TEXT,
        check_number TEXT,
        exclude_from_forecast INTEGER NOT NULL DEFAULT 0,
        notes TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE,
        FOREIGN KEY(transaction_type_id) REFERENCES transaction_types(id) ON DELETE SET NULL,
        FOREIGN KEY(payee_id) REFERENCES payees(id) ON DELETE SET NULL,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_account_clear ON transactions(account_id, clear_date);
    CREATE INDEX IF NOT EXISTS idx_transactions_category_clear ON transactions(category_id, clear_date);

    CREATE TABLE IF NOT EXISTS transaction_summaries(
        account_id INTEGER NOT NULL,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
        balance INTEGER NOT NULL,
        PRIMARY KEY(account_id, year, month),
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        portfolio_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        amount INTEGER NOT NULL,
        FOREIGN KEY(portfolio_id) REFERENCES portfolios(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS repeat_units(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS repeat_options(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        quantity INTEGER NOT NULL CHECK(quantity > 0),
        repeat_unit_id INTEGER NOT NULL,
        order_index INTEGER NOT NULL,
        FOREIGN KEY(repeat_unit_id) REFERENCES repeat_units(id)
    );

    CREATE TABLE IF NOT EXISTS scheduled_transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        transaction_type_id INTEGER,
        payee_id INTEGER,
        category_id INTEGER,
        fixed_amount INTEGER,
        estimate_occurrences INTEGER,
        start_date TEXT NOT NULL,
        end_date TEXT,
        limit_occurrences INTEGER,
        repeat_option_id INTEGER NOT NULL,
        last_materialized_date TEXT,
        notes TEXT,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE CASCADE,
        FOREIGN KEY(transaction_type_id) REFERENCES transaction_types(id) ON DELETE SET NULL,
        FOREIGN KEY(payee_id) REFERENCES payees(id) ON DELETE SET NULL,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL,
        FOREIGN KEY(repeat_option_id) REFERENCES repeat_options(id)
    );
    "#,
    )?;
    seed_repeat_options(conn)?;
    Ok(())
}

fn seed_repeat_options(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    for unit in RepeatUnit::ALL {
        tx.execute(
            "INSERT OR IGNORE INTO repeat_units(name) VALUES (?1)",
            params![unit.as_str()],
        )?;
    }
    for (order, (name, quantity, unit)) in REPEAT_OPTIONS.iter().enumerate() {
        tx.execute(
            "INSERT OR IGNORE INTO repeat_options(name, quantity, repeat_unit_id, order_index)
             SELECT ?1, ?2, id, ?3 FROM repeat_units WHERE name=?4",
            params![name, quantity, order as i64, unit.as_str()],
        )?;
    }
    tx.commit()?;
    Ok(())
}
