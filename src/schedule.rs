// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Occurrence arithmetic for scheduled transactions.
//!
//! Occurrence `n` is always derived from the anchor date, never from the
//! previous occurrence, so a schedule anchored on the 31st lands on the last
//! day of short months and returns to the 31st afterwards. Semi-monthly
//! schedules fall on the 1st and the 16th; their quantity counts half-month
//! slots.

use chrono::{Datelike, Days, NaiveDate};
use rusqlite::{Connection, params};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{QuantumError, QuantumResult};
use crate::ledger::LedgerEntry;
use crate::models::{NewTransaction, RepeatOption, RepeatUnit, ScheduledTransaction, Transaction};
use crate::money::{SCALE, from_cents};
use crate::month::{YearMonth, shift_months};
use crate::permissions::Caller;
use crate::store::{scheduled, transactions};

/// Id carried by a preview that has not been written.
pub const PREVIEW_TRANSACTION_ID: i64 = 0;

const RECENT_MATCHING_AMOUNTS_SQL: &str = "SELECT amount FROM transactions
     WHERE account_id=?1 AND payee_id IS ?2 AND category_id IS ?3
     ORDER BY transaction_date DESC, id DESC
     LIMIT ?4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    pub unit: RepeatUnit,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub index: u32,
    pub date: NaiveDate,
}

/// Half-month slot of the first 1st/16th on or after `date`.
fn semi_month_slot(date: NaiveDate) -> i64 {
    let month = YearMonth::of(date);
    match date.day() {
        1 => month.ordinal() * 2,
        2..=16 => month.ordinal() * 2 + 1,
        _ => month.next().ordinal() * 2,
    }
}

fn slot_date(slot: i64) -> Option<NaiveDate> {
    let month = YearMonth::from_ordinal(slot.div_euclid(2))?;
    let day = if slot.rem_euclid(2) == 0 { 1 } else { 16 };
    NaiveDate::from_ymd_opt(month.year, month.month, day)
}

impl Cadence {
    pub fn new(unit: RepeatUnit, quantity: u32) -> QuantumResult<Self> {
        if quantity == 0 {
            return Err(QuantumError::validation("repeat quantity must be at least 1"));
        }
        Ok(Self { unit, quantity })
    }

    pub fn from_option(option: &RepeatOption) -> QuantumResult<Self> {
        Self::new(option.repeat_unit, option.quantity)
    }

    /// Date of occurrence `n`, or `None` past the calendar's range.
    pub fn occurrence(self, anchor: NaiveDate, n: u32) -> Option<NaiveDate> {
        let steps = u64::from(n) * u64::from(self.quantity);
        match self.unit {
            RepeatUnit::Day => anchor.checked_add_days(Days::new(steps)),
            RepeatUnit::Week => anchor.checked_add_days(Days::new(steps.checked_mul(7)?)),
            RepeatUnit::Month => shift(anchor, steps),
            RepeatUnit::Year => shift(anchor, steps.checked_mul(12)?),
            RepeatUnit::SemiMonth => {
                slot_date(semi_month_slot(anchor).checked_add(i64::try_from(steps).ok()?)?)
            }
        }
    }

    /// Smallest `n` whose occurrence is on or after `target`.
    pub fn first_index_on_or_after(self, anchor: NaiveDate, target: NaiveDate) -> Option<u32> {
        if self.occurrence(anchor, 0)? >= target {
            return Some(0);
        }
        let q = i64::from(self.quantity);
        let estimate = match self.unit {
            RepeatUnit::Day => (target - anchor).num_days() / q,
            RepeatUnit::Week => (target - anchor).num_days() / (7 * q),
            RepeatUnit::Month => (YearMonth::of(target).ordinal() - YearMonth::of(anchor).ordinal()) / q - 1,
            RepeatUnit::Year => i64::from(target.year() - anchor.year()) / q - 1,
            RepeatUnit::SemiMonth => (semi_month_slot(target) - semi_month_slot(anchor)) / q - 1,
        };
        let mut n = u32::try_from(estimate.max(0)).ok()?;
        while self.occurrence(anchor, n)? < target {
            n = n.checked_add(1)?;
        }
        Some(n)
    }
}

fn shift(anchor: NaiveDate, months: u64) -> Option<NaiveDate> {
    let months = i64::try_from(months).ok()?;
    let shifted = shift_months(anchor, months);
    (shifted != NaiveDate::MAX).then_some(shifted)
}

/// First occurrence on or after `from` that respects `end_date` (inclusive)
/// and `limit` (occurrences `0..limit`).
pub fn next_occurrence(
    cadence: Cadence,
    start: NaiveDate,
    end: Option<NaiveDate>,
    limit: Option<u32>,
    from: NaiveDate,
) -> Option<Occurrence> {
    let index = cadence.first_index_on_or_after(start, from)?;
    if limit.is_some_and(|k| index >= k) {
        return None;
    }
    let date = cadence.occurrence(start, index)?;
    if end.is_some_and(|end| date > end) {
        return None;
    }
    Some(Occurrence { index, date })
}

/// Up to `count` consecutive occurrences starting at the first one on or
/// after `from`.
pub fn upcoming(
    cadence: Cadence,
    start: NaiveDate,
    end: Option<NaiveDate>,
    limit: Option<u32>,
    from: NaiveDate,
    count: usize,
) -> Vec<Occurrence> {
    let mut out = Vec::with_capacity(count);
    let mut cursor = from;
    while out.len() < count {
        let Some(next) = next_occurrence(cadence, start, end, limit, cursor) else {
            break;
        };
        out.push(next);
        match next.date.succ_opt() {
            Some(day) => cursor = day,
            None => break,
        }
    }
    out
}

/// Where the search for the next occurrence begins: today, or the day after
/// the last materialized occurrence when that is later.
pub fn search_from(schedule: &ScheduledTransaction, today: NaiveDate) -> NaiveDate {
    match schedule.last_materialized_date.and_then(|d| d.succ_opt()) {
        Some(after) if after > today => after,
        _ => today,
    }
}

/// The fixed amount, or the rounded average of the latest `k` transactions
/// with the same account, payee and category. Zero when nothing matches.
pub fn estimate_amount(conn: &Connection, schedule: &ScheduledTransaction) -> QuantumResult<Decimal> {
    if let Some(fixed) = schedule.fixed_amount {
        return Ok(fixed);
    }
    let Some(k) = schedule.estimate_occurrences else {
        return Ok(Decimal::ZERO);
    };
    let mut stmt = conn.prepare_cached(RECENT_MATCHING_AMOUNTS_SQL)?;
    let amounts = stmt
        .query_map(
            params![schedule.account_id, schedule.payee_id, schedule.category_id, k],
            |r| r.get::<_, i64>(0),
        )?
        .collect::<Result<Vec<_>, _>>()?;
    if amounts.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let total: Decimal = amounts.iter().copied().map(from_cents).sum();
    let average = total / Decimal::from(amounts.len());
    Ok(average.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero))
}

pub fn preview_transaction(
    schedule: &ScheduledTransaction,
    date: NaiveDate,
    amount: Decimal,
) -> Transaction {
    Transaction {
        id: PREVIEW_TRANSACTION_ID,
        account_id: schedule.account_id,
        transaction_type_id: schedule.transaction_type_id,
        payee_id: schedule.payee_id,
        category_id: schedule.category_id,
        amount,
        transaction_date: date,
        clear_date: None,
        check_number: None,
        exclude_from_forecast: false,
        notes: schedule.notes.clone(),
    }
}

/// The next transaction a schedule would produce, never written. `None` once
/// the schedule is exhausted.
pub fn preview(
    conn: &Connection,
    caller: &Caller,
    scheduled_id: i64,
    today: NaiveDate,
) -> QuantumResult<Option<LedgerEntry>> {
    let schedule = scheduled::get_scheduled(conn, caller, scheduled_id)?;
    let option = scheduled::get_repeat_option(conn, schedule.repeat_option_id)?;
    let cadence = Cadence::from_option(&option)?;
    let from = search_from(&schedule, today);
    let Some(next) = next_occurrence(
        cadence,
        schedule.start_date,
        schedule.end_date,
        schedule.limit_occurrences,
        from,
    ) else {
        tracing::debug!(scheduled_id, %from, "schedule exhausted");
        return Ok(None);
    };
    let amount = estimate_amount(conn, &schedule)?;
    tracing::debug!(scheduled_id, index = next.index, date = %next.date, %amount, "next occurrence");
    Ok(Some(LedgerEntry::unbalanced(preview_transaction(
        &schedule, next.date, amount,
    ))))
}

/// Writes the next occurrence as a real transaction and records it as
/// materialized. Both writes commit together or not at all.
pub fn materialize(
    conn: &Connection,
    caller: &Caller,
    scheduled_id: i64,
    today: NaiveDate,
) -> QuantumResult<Option<Transaction>> {
    let Some(entry) = preview(conn, caller, scheduled_id, today)? else {
        return Ok(None);
    };
    let draft = entry.transaction;
    let tx = conn.unchecked_transaction()?;
    let id = transactions::insert_transaction(
        &tx,
        caller,
        &NewTransaction {
            account_id: draft.account_id,
            transaction_type_id: draft.transaction_type_id,
            payee_id: draft.payee_id,
            category_id: draft.category_id,
            amount: draft.amount,
            transaction_date: draft.transaction_date,
            clear_date: None,
            check_number: None,
            exclude_from_forecast: false,
            notes: draft.notes,
        },
    )?;
    scheduled::set_last_materialized(&tx, scheduled_id, draft.transaction_date)?;
    tx.commit()?;
    let created = transactions::get_transaction(conn, caller, id)?;
    tracing::info!(scheduled_id, transaction_id = created.id, date = %created.transaction_date, "occurrence materialized");
    Ok(Some(created))
}
