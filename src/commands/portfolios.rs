// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;
use rusqlite::Connection;

use super::Session;
use crate::permissions::{Operation, Resource};
use crate::store::portfolios;
use crate::utils::{pretty_table, print_json_if_requested, required, required_id};

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    let caller = &session.caller;
    match m.subcommand() {
        Some(("add", sub)) => {
            session.authorize(Resource::Portfolio, Operation::Create)?;
            let p = portfolios::create_portfolio(conn, caller, required(sub, "name")?)?;
            println!("Added portfolio '{}' (id {})", p.name, p.id);
        }
        Some(("list", sub)) => {
            session.authorize(Resource::Portfolio, Operation::Read)?;
            let data = portfolios::list_portfolios(conn, caller)?;
            if !print_json_if_requested(sub, &data)? {
                let rows = data
                    .iter()
                    .map(|p| vec![p.id.to_string(), p.name.clone()])
                    .collect();
                println!("{}", pretty_table(&["Id", "Name"], rows));
            }
        }
        Some(("rename", sub)) => {
            session.authorize(Resource::Portfolio, Operation::Update)?;
            let p = portfolios::rename_portfolio(
                conn,
                caller,
                required_id(sub, "id")?,
                required(sub, "name")?,
            )?;
            println!("Renamed portfolio {} to '{}'", p.id, p.name);
        }
        Some(("rm", sub)) => {
            session.authorize(Resource::Portfolio, Operation::Delete)?;
            let id = required_id(sub, "id")?;
            portfolios::delete_portfolio(conn, caller, id)?;
            println!("Removed portfolio {}", id);
        }
        Some(("member-add", sub)) => {
            session.authorize(Resource::Membership, Operation::Create)?;
            let id = required_id(sub, "id")?;
            let user = portfolios::add_member(conn, caller, id, required(sub, "email")?)?;
            println!("Added {} to portfolio {}", user.email, id);
        }
        Some(("member-rm", sub)) => {
            session.authorize(Resource::Membership, Operation::Delete)?;
            let id = required_id(sub, "id")?;
            let email = required(sub, "email")?;
            portfolios::remove_member(conn, caller, id, email)?;
            println!("Removed {} from portfolio {}", email, id);
        }
        Some(("members", sub)) => {
            session.authorize(Resource::Membership, Operation::Read)?;
            let data = portfolios::list_members(conn, caller, required_id(sub, "id")?)?;
            if !print_json_if_requested(sub, &data)? {
                let rows = data
                    .iter()
                    .map(|u| vec![u.id.to_string(), u.email.clone(), u.role.to_string()])
                    .collect();
                println!("{}", pretty_table(&["Id", "Email", "Role"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
