// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use chrono::NaiveDate;
use quantum::commands::Session;
use quantum::db;
use quantum::models::{NewTransaction, Transaction};
use quantum::permissions::{Caller, Role};
use quantum::store::{accounts, categories, portfolios, transactions, users};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub struct Fixture {
    pub conn: Connection,
    pub owner: Caller,
    pub stranger: Caller,
    pub portfolio: i64,
    pub account: i64,
    pub category: i64,
}

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Owner with one portfolio, a 1000.00 account and a "Groceries" category,
/// plus a second user with a portfolio of their own.
pub fn fixture() -> Fixture {
    let conn = db::open_in_memory().unwrap();
    let owner: Caller = users::create_user(&conn, "owner@example.com", "Olive", "Owner", Role::User)
        .unwrap()
        .into();
    let stranger: Caller =
        users::create_user(&conn, "stranger@example.com", "Sam", "Stranger", Role::User)
            .unwrap()
            .into();
    let portfolio = portfolios::create_portfolio(&conn, &owner, "Household").unwrap().id;
    portfolios::create_portfolio(&conn, &stranger, "Elsewhere").unwrap();
    let account = accounts::create_account(&conn, &owner, portfolio, "Checking", dec!(1000))
        .unwrap()
        .id;
    let category = categories::create_category(&conn, &owner, portfolio, "Groceries", None)
        .unwrap()
        .id;
    Fixture {
        conn,
        owner,
        stranger,
        portfolio,
        account,
        category,
    }
}

impl Fixture {
    pub fn session(&self, today: &str) -> Session {
        Session::for_caller(self.owner.clone(), d(today))
    }

    pub fn add_tx(
        &self,
        amount: Decimal,
        date: &str,
        cleared: Option<&str>,
        category: Option<i64>,
    ) -> Transaction {
        transactions::create_transaction(
            &self.conn,
            &self.owner,
            &NewTransaction {
                account_id: self.account,
                category_id: category,
                amount,
                transaction_date: d(date),
                clear_date: cleared.map(d),
                ..Default::default()
            },
        )
        .unwrap()
    }
}
