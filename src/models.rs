// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::QuantumError;
use crate::month::YearMonth;
use crate::permissions::Role;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: i64,
    pub portfolio_id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub starting_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: i64,
    pub portfolio_id: i64,
    pub name: String,
    pub parent_category_id: Option<i64>,
}

/// Payees and transaction types share this shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedReference {
    pub id: i64,
    pub portfolio_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub transaction_type_id: Option<i64>,
    pub payee_id: Option<i64>,
    pub category_id: Option<i64>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub clear_date: Option<NaiveDate>,
    pub check_number: Option<String>,
    pub exclude_from_forecast: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTransaction {
    pub account_id: i64,
    pub transaction_type_id: Option<i64>,
    pub payee_id: Option<i64>,
    pub category_id: Option<i64>,
    pub amount: Decimal,
    pub transaction_date: NaiveDate,
    pub clear_date: Option<NaiveDate>,
    pub check_number: Option<String>,
    pub exclude_from_forecast: bool,
    pub notes: Option<String>,
}

/// Edits to a transaction. There is no account field: a transaction never
/// moves between accounts. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionPatch {
    pub transaction_type_id: Option<Option<i64>>,
    pub payee_id: Option<Option<i64>>,
    pub category_id: Option<Option<i64>>,
    pub amount: Option<Decimal>,
    pub transaction_date: Option<NaiveDate>,
    pub clear_date: Option<Option<NaiveDate>>,
    pub check_number: Option<Option<String>>,
    pub exclude_from_forecast: Option<bool>,
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub account_id: i64,
    pub year: i32,
    pub month: u32,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub balance: Decimal,
}

impl TransactionSummary {
    pub fn year_month(&self) -> Option<YearMonth> {
        YearMonth::new(self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Budget {
    pub id: i64,
    pub portfolio_id: i64,
    pub category_id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatUnit {
    Day,
    Week,
    Month,
    Year,
    /// The 1st and the 16th of every month.
    SemiMonth,
}

impl RepeatUnit {
    pub const ALL: [RepeatUnit; 5] = [
        RepeatUnit::Day,
        RepeatUnit::Week,
        RepeatUnit::Month,
        RepeatUnit::Year,
        RepeatUnit::SemiMonth,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RepeatUnit::Day => "day",
            RepeatUnit::Week => "week",
            RepeatUnit::Month => "month",
            RepeatUnit::Year => "year",
            RepeatUnit::SemiMonth => "semi_month",
        }
    }
}

impl fmt::Display for RepeatUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepeatUnit {
    type Err = QuantumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepeatUnit::ALL
            .into_iter()
            .find(|u| u.as_str() == s.trim())
            .ok_or_else(|| QuantumError::validation(format!("unknown repeat unit '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepeatOption {
    pub id: i64,
    pub name: String,
    pub quantity: u32,
    pub repeat_unit: RepeatUnit,
    pub order_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledTransaction {
    pub id: i64,
    pub account_id: i64,
    pub transaction_type_id: Option<i64>,
    pub payee_id: Option<i64>,
    pub category_id: Option<i64>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pub fixed_amount: Option<Decimal>,
    pub estimate_occurrences: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub limit_occurrences: Option<u32>,
    pub repeat_option_id: i64,
    /// Occurrences on or before this date have already been written as
    /// real transactions.
    pub last_materialized_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewScheduledTransaction {
    pub account_id: i64,
    pub transaction_type_id: Option<i64>,
    pub payee_id: Option<i64>,
    pub category_id: Option<i64>,
    pub fixed_amount: Option<Decimal>,
    pub estimate_occurrences: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub limit_occurrences: Option<u32>,
    pub repeat_option_id: i64,
    pub notes: Option<String>,
}

/// Outer `None` keeps the current value; `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScheduledTransactionPatch {
    pub transaction_type_id: Option<Option<i64>>,
    pub payee_id: Option<Option<i64>>,
    pub category_id: Option<Option<i64>>,
    pub fixed_amount: Option<Option<Decimal>>,
    pub estimate_occurrences: Option<Option<u32>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub limit_occurrences: Option<Option<u32>>,
    pub repeat_option_id: Option<i64>,
    pub notes: Option<Option<String>>,
}
