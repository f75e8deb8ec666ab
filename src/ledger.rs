// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Running balances for one account.
//!
//! History is split at a cutoff date. Everything cleared before it collapses
//! into an opening amount (a starting balance or monthly checkpoint, plus one
//! aggregate sum); everything cleared on or after it, and everything not yet
//! cleared, is ordered precisely and carries its own balance.
//!
//! Virtual order: the opening base sits at index -2, the older-tier sum at
//! -1, and recent transactions from 0 upward by
//! `(clear_date or far future, transaction_date, id)`.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{QuantumError, QuantumResult};
use crate::models::Transaction;
use crate::permissions::Caller;
use crate::queries;
use crate::store::accounts;

/// How many of the newest checkpoints are considered when looking for one
/// that ends before the cutoff.
pub const SUMMARY_LOOKBACK: u32 = 24;

pub const BASE_ORDER_INDEX: i64 = -2;
pub const OLDER_SUM_ORDER_INDEX: i64 = -1;

/// The two synthetic positions that precede every recent transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Opening {
    pub base: Decimal,
    pub sum_of_old: Decimal,
}

impl Opening {
    pub fn total(self) -> Decimal {
        self.base + self.sum_of_old
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(skip)]
    pub order_index: i64,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pub balance: Option<Decimal>,
}

impl LedgerEntry {
    /// Single-record view: the balance is not computed.
    pub fn unbalanced(transaction: Transaction) -> Self {
        Self {
            transaction,
            order_index: 0,
            balance: None,
        }
    }
}

pub fn order_key(t: &Transaction) -> (NaiveDate, NaiveDate, i64) {
    (
        t.clear_date.unwrap_or(NaiveDate::MAX),
        t.transaction_date,
        t.id,
    )
}

/// Splits into (recent, older) at `cutoff`.
pub fn partition(
    transactions: Vec<Transaction>,
    cutoff: NaiveDate,
) -> (Vec<Transaction>, Vec<Transaction>) {
    transactions
        .into_iter()
        .partition(|t| t.clear_date.is_none_or(|cleared| cleared >= cutoff))
}

pub fn running_balances(opening: Opening, mut recent: Vec<Transaction>) -> Vec<LedgerEntry> {
    recent.sort_by_key(order_key);
    let mut balance = opening.total();
    recent
        .into_iter()
        .enumerate()
        .map(|(i, transaction)| {
            balance += transaction.amount;
            LedgerEntry {
                transaction,
                order_index: i as i64,
                balance: Some(balance),
            }
        })
        .collect()
}

/// In-memory ledger over rows the caller already holds.
pub fn ledger_from_transactions(
    starting_balance: Decimal,
    transactions: Vec<Transaction>,
    cutoff: NaiveDate,
) -> Vec<LedgerEntry> {
    let (recent, older) = partition(transactions, cutoff);
    let opening = Opening {
        base: starting_balance,
        sum_of_old: older.iter().map(|t| t.amount).sum(),
    };
    running_balances(opening, recent)
}

/// Opening amount for `cutoff`. Uses the newest checkpoint whose month ends
/// before the cutoff when there is one, else the starting balance.
pub fn opening_balance(
    conn: &Connection,
    account_id: i64,
    cutoff: NaiveDate,
) -> QuantumResult<Opening> {
    let mut checkpoint = None;
    for summary in queries::latest_summaries(conn, account_id, SUMMARY_LOOKBACK)? {
        let month = summary.year_month().ok_or_else(|| {
            QuantumError::IntegrityViolation(format!(
                "summary for account {} has month {}",
                account_id, summary.month
            ))
        })?;
        let boundary = month.next().first_day();
        if boundary <= cutoff {
            checkpoint = Some((summary.balance, boundary));
            break;
        }
    }

    match checkpoint {
        Some((base, boundary)) => {
            tracing::debug!(account_id, %boundary, "opening from checkpoint");
            Ok(Opening {
                base,
                sum_of_old: queries::older_account_sum(conn, account_id, Some(boundary), cutoff)?,
            })
        }
        None => Ok(Opening {
            base: queries::starting_balance(conn, account_id)?,
            sum_of_old: queries::older_account_sum(conn, account_id, None, cutoff)?,
        }),
    }
}

/// Ordered recent transactions of one account with running balances.
pub fn account_ledger(
    conn: &Connection,
    caller: &Caller,
    account_id: i64,
    cutoff: NaiveDate,
) -> QuantumResult<Vec<LedgerEntry>> {
    accounts::get_account(conn, caller, account_id)?;
    let opening = opening_balance(conn, account_id, cutoff)?;
    let recent = queries::recent_account_transactions(conn, account_id, cutoff)?;
    tracing::debug!(
        account_id,
        %cutoff,
        recent = recent.len(),
        base = %opening.base,
        sum_of_old = %opening.sum_of_old,
        "ledger computed"
    );
    Ok(running_balances(opening, recent))
}

/// Balance after every transaction of the account, cleared or not.
pub fn account_balance(
    conn: &Connection,
    caller: &Caller,
    account_id: i64,
    cutoff: NaiveDate,
) -> QuantumResult<Decimal> {
    accounts::get_account(conn, caller, account_id)?;
    let opening = opening_balance(conn, account_id, cutoff)?;
    let recent: Decimal = queries::recent_account_transactions(conn, account_id, cutoff)?
        .iter()
        .map(|t| t.amount)
        .sum();
    Ok(opening.total() + recent)
}
