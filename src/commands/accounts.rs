// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use super::Session;
use crate::ledger;
use crate::models::Account;
use crate::permissions::{Operation, Resource};
use crate::store::accounts;
use crate::utils::{
    optional_decimal, optional_id, parse_decimal, pretty_table, print_json_if_requested,
    required, required_id,
};

#[derive(Debug, Serialize)]
pub struct AccountView {
    #[serde(flatten)]
    pub account: Account,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub balance: Decimal,
}

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    let caller = &session.caller;
    match m.subcommand() {
        Some(("add", sub)) => {
            session.authorize(Resource::Account, Operation::Create)?;
            let balance = parse_decimal(required(sub, "starting-balance")?)?;
            let a = accounts::create_account(
                conn,
                caller,
                required_id(sub, "portfolio")?,
                required(sub, "name")?,
                balance,
            )?;
            println!("Added account '{}' (id {}, starting {})", a.name, a.id, a.starting_balance);
        }
        Some(("list", sub)) => {
            session.authorize(Resource::Account, Operation::Read)?;
            let data = accounts::list_accounts(conn, caller, optional_id(sub, "portfolio")?)?;
            if !print_json_if_requested(sub, &data)? {
                let rows = data
                    .iter()
                    .map(|a| {
                        vec![
                            a.id.to_string(),
                            a.portfolio_id.to_string(),
                            a.name.clone(),
                            a.starting_balance.to_string(),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["Id", "Portfolio", "Name", "Starting"], rows)
                );
            }
        }
        Some(("show", sub)) => {
            session.authorize(Resource::Account, Operation::Read)?;
            let view = account_view(conn, session, sub)?;
            if !print_json_if_requested(sub, &view)? {
                println!(
                    "{}",
                    pretty_table(
                        &["Id", "Portfolio", "Name", "Starting", "Balance"],
                        vec![vec![
                            view.account.id.to_string(),
                            view.account.portfolio_id.to_string(),
                            view.account.name.clone(),
                            view.account.starting_balance.to_string(),
                            view.balance.to_string(),
                        ]],
                    )
                );
            }
        }
        Some(("edit", sub)) => {
            session.authorize(Resource::Account, Operation::Update)?;
            let a = accounts::update_account(
                conn,
                caller,
                required_id(sub, "id")?,
                sub.get_one::<String>("name").map(String::as_str),
                optional_decimal(sub, "starting-balance")?,
            )?;
            println!("Updated account {} ('{}', starting {})", a.id, a.name, a.starting_balance);
        }
        Some(("rm", sub)) => {
            session.authorize(Resource::Account, Operation::Delete)?;
            let id = required_id(sub, "id")?;
            accounts::delete_account(conn, caller, id)?;
            println!("Removed account {}", id);
        }
        _ => {}
    }
    Ok(())
}

/// The account with its balance after every recorded transaction.
pub fn account_view(conn: &Connection, session: &Session, sub: &ArgMatches) -> Result<AccountView> {
    let id = required_id(sub, "id")?;
    let account = accounts::get_account(conn, &session.caller, id)?;
    let cutoff = session.ledger_cutoff(sub)?;
    let balance = ledger::account_balance(conn, &session.caller, id, cutoff)?;
    Ok(AccountView { account, balance })
}
