// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime settings. Built-in defaults are overridden by rows of the
//! `settings` table.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{QuantumError, QuantumResult};
use crate::month::trailing_cutoff;

/// Database path override.
pub const DB_ENV: &str = "QUANTUM_DB";
/// Email of the acting user.
pub const USER_ENV: &str = "QUANTUM_USER";
/// `tracing` filter directives.
pub const LOG_ENV: &str = "QUANTUM_LOG";
pub const DEFAULT_LOG_FILTER: &str = "quantum=info";

pub const LEDGER_WINDOW_KEY: &str = "ledger_window_months";
pub const ROLLUP_WINDOW_KEY: &str = "rollup_window_months";

const KNOWN_KEYS: &[&str] = &[LEDGER_WINDOW_KEY, ROLLUP_WINDOW_KEY];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub ledger_window_months: u32,
    pub rollup_window_months: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ledger_window_months: 6,
            rollup_window_months: 12,
        }
    }
}

impl Settings {
    pub fn load(conn: &Connection) -> QuantumResult<Self> {
        let mut settings = Self::default();
        if let Some(v) = get_setting(conn, LEDGER_WINDOW_KEY)? {
            settings.ledger_window_months = parse_months(LEDGER_WINDOW_KEY, &v)?;
        }
        if let Some(v) = get_setting(conn, ROLLUP_WINDOW_KEY)? {
            settings.rollup_window_months = parse_months(ROLLUP_WINDOW_KEY, &v)?;
        }
        Ok(settings)
    }

    pub fn ledger_cutoff(&self, today: NaiveDate) -> NaiveDate {
        trailing_cutoff(today, self.ledger_window_months)
    }

    pub fn rollup_cutoff(&self, today: NaiveDate) -> NaiveDate {
        trailing_cutoff(today, self.rollup_window_months)
    }
}

fn parse_months(key: &str, value: &str) -> QuantumResult<u32> {
    value.trim().parse::<u32>().map_err(|_| {
        QuantumError::validation(format!(
            "setting {} must be a whole number of months, got '{}'",
            key, value
        ))
    })
}

pub fn get_setting(conn: &Connection, key: &str) -> QuantumResult<Option<String>> {
    Ok(conn
        .query_row("SELECT value FROM settings WHERE key=?1", params![key], |r| {
            r.get(0)
        })
        .optional()?)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> QuantumResult<()> {
    if !KNOWN_KEYS.contains(&key) {
        return Err(QuantumError::validation(format!(
            "unknown setting '{}' (known: {})",
            key,
            KNOWN_KEYS.join(", ")
        )));
    }
    let months = parse_months(key, value)?;
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, months.to_string()],
    )?;
    tracing::info!(key, value = months, "setting stored");
    Ok(())
}

/// Effective value of every known setting, stored or default.
pub fn list_settings(conn: &Connection) -> QuantumResult<Vec<(String, String)>> {
    let effective = Settings::load(conn)?;
    Ok(vec![
        (
            LEDGER_WINDOW_KEY.to_string(),
            effective.ledger_window_months.to_string(),
        ),
        (
            ROLLUP_WINDOW_KEY.to_string(),
            effective.rollup_window_months.to_string(),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_values_override_defaults() {
        let conn = crate::db::open_in_memory().unwrap();
        assert_eq!(Settings::load(&conn).unwrap(), Settings::default());
        set_setting(&conn, ROLLUP_WINDOW_KEY, "3").unwrap();
        let s = Settings::load(&conn).unwrap();
        assert_eq!(s.rollup_window_months, 3);
        assert_eq!(s.ledger_window_months, 6);
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        assert_eq!(s.rollup_cutoff(today), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn unknown_keys_and_bad_numbers_are_rejected() {
        let conn = crate::db::open_in_memory().unwrap();
        assert!(matches!(
            set_setting(&conn, "base_currency", "USD"),
            Err(QuantumError::Validation(_))
        ));
        assert!(matches!(
            set_setting(&conn, LEDGER_WINDOW_KEY, "-1"),
            Err(QuantumError::Validation(_))
        ));
    }
}
