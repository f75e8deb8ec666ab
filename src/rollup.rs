// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monthly totals per category for budget reporting.
//!
//! Rows cleared before the cutoff arrive pre-summed per (category, month of
//! clear date). Rows cleared on or after it, or not cleared, arrive one by
//! one and report under `clear_date`, falling back to `transaction_date`.
//! Both tiers are merged and summed per (category, month). Transactions
//! without a category never appear.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{QuantumError, QuantumResult};
use crate::models::Budget;
use crate::month::YearMonth;
use crate::permissions::Caller;
use crate::queries::{self, CategoryMonthAmount};
use crate::store::budgets;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupRow {
    pub category_id: i64,
    pub report_month: YearMonth,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

/// A rollup row with the category dropped, for a single budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthAmount {
    pub report_month: YearMonth,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

impl From<RollupRow> for MonthAmount {
    fn from(row: RollupRow) -> Self {
        Self {
            report_month: row.report_month,
            amount: row.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetWithData {
    #[serde(flatten)]
    pub budget: Budget,
    pub data: Vec<MonthAmount>,
}

/// Groups by (category, month) and sums, ordered by category, month, amount.
pub fn rollup(rows: impl IntoIterator<Item = CategoryMonthAmount>) -> Vec<RollupRow> {
    let mut sums: BTreeMap<(i64, YearMonth), Decimal> = BTreeMap::new();
    for row in rows {
        *sums.entry((row.category_id, row.report_month)).or_default() += row.amount;
    }
    // Keys are unique, so key order already settles the amount tie-break.
    sums.into_iter()
        .map(|((category_id, report_month), amount)| RollupRow {
            category_id,
            report_month,
            amount,
        })
        .collect()
}

fn collect_rows(
    conn: &Connection,
    caller: &Caller,
    category_id: Option<i64>,
    cutoff: NaiveDate,
) -> QuantumResult<Vec<RollupRow>> {
    let older = queries::older_rollup_rows(conn, caller.user_id, category_id, cutoff)?;
    let recent = queries::recent_rollup_rows(conn, caller.user_id, category_id, cutoff)?;
    tracing::debug!(
        ?category_id,
        %cutoff,
        older = older.len(),
        recent = recent.len(),
        "rollup rows fetched"
    );
    Ok(rollup(older.into_iter().chain(recent)))
}

/// Monthly totals for one budget's category.
pub fn budget_data(
    conn: &Connection,
    caller: &Caller,
    budget_id: i64,
    cutoff: NaiveDate,
) -> QuantumResult<Vec<MonthAmount>> {
    let budget = budgets::get_budget(conn, caller, budget_id)?;
    if !queries::category_exists(conn, budget.category_id)? {
        return Err(QuantumError::IntegrityViolation(format!(
            "budget {} refers to missing category {}",
            budget.id, budget.category_id
        )));
    }
    Ok(collect_rows(conn, caller, Some(budget.category_id), cutoff)?
        .into_iter()
        .map(MonthAmount::from)
        .collect())
}

/// Monthly totals for every category in every portfolio of the caller.
pub fn all_budget_data(
    conn: &Connection,
    caller: &Caller,
    cutoff: NaiveDate,
) -> QuantumResult<Vec<RollupRow>> {
    collect_rows(conn, caller, None, cutoff)
}

/// Every visible budget with its data, from a single rollup pass.
pub fn budgets_with_data(
    conn: &Connection,
    caller: &Caller,
    cutoff: NaiveDate,
) -> QuantumResult<Vec<BudgetWithData>> {
    let mut by_category: HashMap<i64, Vec<MonthAmount>> = HashMap::new();
    for row in all_budget_data(conn, caller, cutoff)? {
        by_category
            .entry(row.category_id)
            .or_default()
            .push(row.into());
    }
    Ok(budgets::list_budgets(conn, caller)?
        .into_iter()
        .map(|budget| {
            let data = by_category
                .get(&budget.category_id)
                .cloned()
                .unwrap_or_default();
            BudgetWithData { budget, data }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(category_id: i64, month: &str, amount: Decimal) -> CategoryMonthAmount {
        CategoryMonthAmount {
            category_id,
            report_month: month.parse().unwrap(),
            amount,
        }
    }

    #[test]
    fn same_month_rows_collapse() {
        let got = rollup([row(7, "2024-03", dec!(300)), row(7, "2024-03", dec!(-100))]);
        assert_eq!(
            got,
            vec![RollupRow {
                category_id: 7,
                report_month: "2024-03".parse().unwrap(),
                amount: dec!(200),
            }]
        );
    }

    #[test]
    fn output_is_ordered_by_category_then_month() {
        let got = rollup([
            row(2, "2024-01", dec!(1)),
            row(1, "2024-02", dec!(2)),
            row(1, "2023-12", dec!(3)),
            row(2, "2024-01", dec!(4)),
        ]);
        let keys: Vec<_> = got
            .iter()
            .map(|r| (r.category_id, r.report_month.to_string(), r.amount))
            .collect();
        assert_eq!(
            keys,
            vec![
                (1, "2023-12".to_string(), dec!(3)),
                (1, "2024-02".to_string(), dec!(2)),
                (2, "2024-01".to_string(), dec!(5)),
            ]
        );
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(rollup(Vec::new()).is_empty());
    }

    #[test]
    fn month_amount_serializes_month_as_text() {
        let json = serde_json::to_string(&MonthAmount {
            report_month: "2024-03".parse().unwrap(),
            amount: dec!(200.00),
        })
        .unwrap();
        assert_eq!(json, r#"{"report_month":"2024-03","amount":200.00}"#);
    }
}
