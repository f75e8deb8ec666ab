// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly balance checkpoints. A checkpoint for (account, year, month) is the
//! starting balance plus every transaction cleared on or before that month's
//! last day. Writes that could change one drop it and everything after it.

use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, params};

use crate::error::{QuantumError, QuantumResult};
use crate::models::TransactionSummary;
use crate::money::{from_cents, to_cents};
use crate::month::YearMonth;
use crate::permissions::Caller;
use crate::store::accounts;

const MONTHLY_CLEARED_SQL: &str = "SELECT substr(clear_date, 1, 7) AS m, SUM(amount)
     FROM transactions
     WHERE account_id=?1 AND clear_date IS NOT NULL AND clear_date < ?2
     GROUP BY m
     ORDER BY m";

pub fn invalidate_from(conn: &Connection, account_id: i64, date: NaiveDate) -> QuantumResult<()> {
    let n = conn.execute(
        "DELETE FROM transaction_summaries
         WHERE account_id=?1 AND (year > ?2 OR (year = ?2 AND month >= ?3))",
        params![account_id, date.year(), date.month()],
    )?;
    if n > 0 {
        tracing::debug!(account_id, from = %YearMonth::of(date), dropped = n, "summaries invalidated");
    }
    Ok(())
}

pub fn invalidate_all(conn: &Connection, account_id: i64) -> QuantumResult<()> {
    let n = conn.execute(
        "DELETE FROM transaction_summaries WHERE account_id=?1",
        params![account_id],
    )?;
    tracing::debug!(account_id, dropped = n, "summaries invalidated");
    Ok(())
}

/// Recomputes every checkpoint from the first cleared month through
/// `through`, one row per month with no gaps.
pub fn rebuild(
    conn: &Connection,
    caller: &Caller,
    account_id: i64,
    through: YearMonth,
) -> QuantumResult<Vec<TransactionSummary>> {
    let account = accounts::get_account(conn, caller, account_id)?;
    let tx = conn.unchecked_transaction()?;

    let monthly: Vec<(YearMonth, i64)> = {
        let mut stmt = tx.prepare(MONTHLY_CLEARED_SQL)?;
        let raw = stmt
            .query_map(params![account_id, through.next().first_day()], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|(m, cents)| {
                m.parse::<YearMonth>()
                    .map(|ym| (ym, cents))
                    .map_err(|_| {
                        QuantumError::IntegrityViolation(format!(
                            "account {} has a transaction with unreadable clear date '{}'",
                            account_id, m
                        ))
                    })
            })
            .collect::<QuantumResult<_>>()?
    };

    tx.execute(
        "DELETE FROM transaction_summaries WHERE account_id=?1",
        params![account_id],
    )?;

    let mut summaries = Vec::new();
    if let Some(&(first, _)) = monthly.first() {
        let mut balance = to_cents(account.starting_balance)?;
        let mut pending = monthly.into_iter().peekable();
        let mut month = first;
        while month <= through {
            while let Some((_, cents)) = pending.next_if(|(m, _)| *m == month) {
                balance = balance.checked_add(cents).ok_or_else(|| {
                    QuantumError::validation(format!(
                        "balance of account {} overflows in {}",
                        account_id, month
                    ))
                })?;
            }
            tx.execute(
                "INSERT INTO transaction_summaries(account_id, year, month, balance)
                 VALUES (?1, ?2, ?3, ?4)",
                params![account_id, month.year, month.month, balance],
            )?;
            summaries.push(TransactionSummary {
                account_id,
                year: month.year,
                month: month.month,
                balance: from_cents(balance),
            });
            month = month.next();
        }
    }
    tx.commit()?;
    tracing::info!(account_id, months = summaries.len(), through = %through, "summaries rebuilt");
    Ok(summaries)
}

/// Checkpoints of one account, oldest first.
pub fn list_summaries(
    conn: &Connection,
    caller: &Caller,
    account_id: i64,
) -> QuantumResult<Vec<TransactionSummary>> {
    accounts::get_account(conn, caller, account_id)?;
    let mut stmt = conn.prepare(
        "SELECT account_id, year, month, balance FROM transaction_summaries
         WHERE account_id=?1 ORDER BY year, month",
    )?;
    let rows = stmt.query_map(params![account_id], |r| {
        Ok(TransactionSummary {
            account_id: r.get(0)?,
            year: r.get(1)?,
            month: r.get(2)?,
            balance: from_cents(r.get(3)?),
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
