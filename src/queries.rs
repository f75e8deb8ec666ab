// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Store primitives consumed by the ledger and rollup engines. Each access
//! pattern is one function with its SQL kept as a constant here.
//!
//! The "recent" tier is `clear_date IS NULL OR clear_date >= cutoff`; the
//! "older" tier is everything cleared before the cutoff that is not recent.
//! Older-tier reads are aggregates so their size does not grow with history.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::error::{QuantumError, QuantumResult};
use crate::models::{Transaction, TransactionSummary};
use crate::money::from_cents;
use crate::month::YearMonth;

pub const TRANSACTION_COLUMNS: &str = "t.id, t.account_id, t.transaction_type_id, t.payee_id, t.category_id, t.amount, \
     t.transaction_date, t.clear_date, t.check_number, t.exclude_from_forecast, t.notes";

pub const STARTING_BALANCE_SQL: &str = "SELECT starting_balance FROM accounts WHERE id=?1";

pub static RECENT_ACCOUNT_TRANSACTIONS_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "SELECT {} FROM transactions t
         WHERE t.account_id=?1 AND (t.clear_date IS NULL OR t.clear_date >= ?2)",
        TRANSACTION_COLUMNS
    )
});

pub const OLDER_ACCOUNT_SUM_SQL: &str = "SELECT COALESCE(SUM(t.amount), 0)
     FROM transactions t
     WHERE t.account_id=?1
       AND t.clear_date IS NOT NULL
       AND t.clear_date < ?3
       AND (?2 IS NULL OR t.clear_date >= ?2)
       AND t.id NOT IN (
           SELECT r.id FROM transactions r
           WHERE r.account_id=?1 AND (r.clear_date IS NULL OR r.clear_date >= ?3)
       )";

pub const LATEST_SUMMARIES_SQL: &str = "SELECT account_id, year, month, balance
     FROM transaction_summaries
     WHERE account_id=?1
     ORDER BY year DESC, month DESC
     LIMIT ?2";

pub const RECENT_ROLLUP_SQL: &str = "SELECT t.category_id, substr(COALESCE(t.clear_date, t.transaction_date), 1, 7), t.amount
     FROM transactions t
     JOIN accounts a ON a.id=t.account_id
     JOIN portfolio_users pu ON pu.portfolio_id=a.portfolio_id
     WHERE pu.user_id=?1
       AND t.category_id IS NOT NULL
       AND (?2 IS NULL OR t.category_id=?2)
       AND (t.clear_date IS NULL OR t.clear_date >= ?3)";

pub const OLDER_ROLLUP_SQL: &str = "SELECT t.category_id, substr(t.clear_date, 1, 7) AS report_month, SUM(t.amount)
     FROM transactions t
     JOIN accounts a ON a.id=t.account_id
     JOIN portfolio_users pu ON pu.portfolio_id=a.portfolio_id
     WHERE pu.user_id=?1
       AND t.category_id IS NOT NULL
       AND (?2 IS NULL OR t.category_id=?2)
       AND t.clear_date IS NOT NULL
       AND t.clear_date < ?3
     GROUP BY t.category_id, report_month";

/// Maps a row selected with [`TRANSACTION_COLUMNS`] (in order).
pub fn map_transaction(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        account_id: r.get(1)?,
        transaction_type_id: r.get(2)?,
        payee_id: r.get(3)?,
        category_id: r.get(4)?,
        amount: from_cents(r.get(5)?),
        transaction_date: r.get(6)?,
        clear_date: r.get(7)?,
        check_number: r.get(8)?,
        exclude_from_forecast: r.get(9)?,
        notes: r.get(10)?,
    })
}

/// One (category, month, amount) row feeding the rollup.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMonthAmount {
    pub category_id: i64,
    pub report_month: YearMonth,
    pub amount: Decimal,
}

fn map_rollup_row(r: &Row<'_>) -> rusqlite::Result<(i64, String, i64)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?))
}

fn into_rollup_rows(raw: Vec<(i64, String, i64)>) -> QuantumResult<Vec<CategoryMonthAmount>> {
    raw.into_iter()
        .map(|(category_id, month, cents)| {
            let report_month = month.parse::<YearMonth>().map_err(|_| {
                QuantumError::IntegrityViolation(format!(
                    "transaction in category {} has unreadable date '{}'",
                    category_id, month
                ))
            })?;
            Ok(CategoryMonthAmount {
                category_id,
                report_month,
                amount: from_cents(cents),
            })
        })
        .collect()
}

pub fn starting_balance(conn: &Connection, account_id: i64) -> QuantumResult<Decimal> {
    let cents: Option<i64> = conn
        .query_row(STARTING_BALANCE_SQL, params![account_id], |r| r.get(0))
        .optional()?;
    cents
        .map(from_cents)
        .ok_or(QuantumError::NotFound("account"))
}

/// Unscoped existence check, used to tell a vanished row from a hidden one.
pub fn category_exists(conn: &Connection, category_id: i64) -> QuantumResult<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM categories WHERE id=?1", params![category_id], |r| r.get(0))
        .optional()?;
    Ok(found.is_some())
}

pub fn recent_account_transactions(
    conn: &Connection,
    account_id: i64,
    cutoff: NaiveDate,
) -> QuantumResult<Vec<Transaction>> {
    let mut stmt = conn.prepare_cached(RECENT_ACCOUNT_TRANSACTIONS_SQL.as_str())?;
    let rows = stmt.query_map(params![account_id, cutoff], map_transaction)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Sum of transactions cleared before `cutoff` (and on/after `since` when
/// given), excluding the recent id-set.
pub fn older_account_sum(
    conn: &Connection,
    account_id: i64,
    since: Option<NaiveDate>,
    cutoff: NaiveDate,
) -> QuantumResult<Decimal> {
    let cents: i64 = conn.query_row(
        OLDER_ACCOUNT_SUM_SQL,
        params![account_id, since, cutoff],
        |r| r.get(0),
    )?;
    Ok(from_cents(cents))
}

pub fn latest_summaries(
    conn: &Connection,
    account_id: i64,
    limit: u32,
) -> QuantumResult<Vec<TransactionSummary>> {
    let mut stmt = conn.prepare_cached(LATEST_SUMMARIES_SQL)?;
    let rows = stmt.query_map(params![account_id, limit], |r| {
        Ok(TransactionSummary {
            account_id: r.get(0)?,
            year: r.get(1)?,
            month: r.get(2)?,
            balance: from_cents(r.get(3)?),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn recent_rollup_rows(
    conn: &Connection,
    user_id: i64,
    category_id: Option<i64>,
    cutoff: NaiveDate,
) -> QuantumResult<Vec<CategoryMonthAmount>> {
    let mut stmt = conn.prepare_cached(RECENT_ROLLUP_SQL)?;
    let raw = stmt
        .query_map(params![user_id, category_id, cutoff], map_rollup_row)?
        .collect::<Result<Vec<_>, _>>()?;
    into_rollup_rows(raw)
}

/// Older-tier rows arrive already summed per (category, month).
pub fn older_rollup_rows(
    conn: &Connection,
    user_id: i64,
    category_id: Option<i64>,
    cutoff: NaiveDate,
) -> QuantumResult<Vec<CategoryMonthAmount>> {
    let mut stmt = conn.prepare_cached(OLDER_ROLLUP_SQL)?;
    let raw = stmt
        .query_map(params![user_id, category_id, cutoff], map_rollup_row)?
        .collect::<Result<Vec<_>, _>>()?;
    into_rollup_rows(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fixture() -> Connection {
        let conn = crate::db::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO users(id, email, role) VALUES (1, 'a@example.com', 'user'), (2, 'b@example.com', 'user');
            INSERT INTO portfolios(id, name) VALUES (1, 'Home'), (2, 'Other');
            INSERT INTO portfolio_users(portfolio_id, user_id) VALUES (1, 1), (2, 2);
            INSERT INTO accounts(id, portfolio_id, name, starting_balance) VALUES (1, 1, 'Checking', 100000), (2, 2, 'Foreign', 0);
            INSERT INTO categories(id, portfolio_id, name) VALUES (1, 1, 'Food'), (2, 2, 'Theirs');
            INSERT INTO transactions(account_id, category_id, amount, transaction_date, clear_date) VALUES
                (1, 1, -1000, '2023-05-01', '2023-05-03'),
                (1, 1, -2550, '2023-05-20', '2023-05-21'),
                (1, 1,  5000, '2024-02-01', '2024-02-02'),
                (1, 1, -700,  '2023-01-01', NULL),
                (2, 2, -999,  '2024-02-01', '2024-02-02');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn recent_tier_keeps_uncleared_rows_of_any_age() {
        let conn = fixture();
        let recent = recent_account_transactions(&conn, 1, d("2024-01-01")).unwrap();
        let mut amounts: Vec<_> = recent.iter().map(|t| t.amount).collect();
        amounts.sort();
        assert_eq!(amounts, vec![dec!(-7.00), dec!(50.00)]);
    }

    #[test]
    fn older_sum_is_one_exact_aggregate() {
        let conn = fixture();
        assert_eq!(
            older_account_sum(&conn, 1, None, d("2024-01-01")).unwrap(),
            dec!(-35.50)
        );
        assert_eq!(
            older_account_sum(&conn, 1, Some(d("2023-05-10")), d("2024-01-01")).unwrap(),
            dec!(-25.50)
        );
        assert_eq!(older_account_sum(&conn, 99, None, d("2024-01-01")).unwrap(), dec!(0));
    }

    #[test]
    fn starting_balance_of_missing_account_is_not_found() {
        let conn = fixture();
        assert_eq!(starting_balance(&conn, 1).unwrap(), dec!(1000));
        assert!(starting_balance(&conn, 42).unwrap_err().is_not_found());
    }

    #[test]
    fn rollup_rows_are_scoped_to_membership() {
        let conn = fixture();
        let older = older_rollup_rows(&conn, 1, None, d("2024-01-01")).unwrap();
        assert_eq!(
            older,
            vec![CategoryMonthAmount {
                category_id: 1,
                report_month: YearMonth::new(2023, 5).unwrap(),
                amount: dec!(-35.50),
            }]
        );
        let recent = recent_rollup_rows(&conn, 1, Some(1), d("2024-01-01")).unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|r| r.category_id == 1));
        assert!(recent_rollup_rows(&conn, 1, Some(2), d("2024-01-01")).unwrap().is_empty());
    }

    #[test]
    fn summaries_come_newest_first() {
        let conn = fixture();
        conn.execute_batch(
            "INSERT INTO transaction_summaries(account_id, year, month, balance) VALUES
                (1, 2023, 11, 10), (1, 2023, 12, 20), (1, 2022, 12, 5);",
        )
        .unwrap();
        let got = latest_summaries(&conn, 1, 2).unwrap();
        assert_eq!(
            got.iter().map(|s| (s.year, s.month)).collect::<Vec<_>>(),
            vec![(2023, 12), (2023, 11)]
        );
    }
}
