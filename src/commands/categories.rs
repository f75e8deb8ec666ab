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
use crate::store::categories;
use crate::utils::{fmt_opt, optional_id, pretty_table, print_json_if_requested, required, required_id};

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    let caller = &session.caller;
    match m.subcommand() {
        Some(("add", sub)) => {
            session.authorize(Resource::Category, Operation::Create)?;
            let c = categories::create_category(
                conn,
                caller,
                required_id(sub, "portfolio")?,
                required(sub, "name")?,
                optional_id(sub, "parent")?,
            )?;
            println!("Added category '{}' (id {})", c.name, c.id);
        }
        Some(("list", sub)) => {
            session.authorize(Resource::Category, Operation::Read)?;
            let tree = categories::category_tree(conn, caller, required_id(sub, "portfolio")?)?;
            let walked = tree.walk();
            let flat: Vec<_> = walked.iter().map(|(_, c)| *c).collect();
            if !print_json_if_requested(sub, &flat)? {
                let rows = walked
                    .iter()
                    .map(|(depth, c)| {
                        vec![
                            c.id.to_string(),
                            format!("{}{}", "  ".repeat(*depth), c.name),
                            fmt_opt(c.parent_category_id),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Id", "Name", "Parent"], rows));
            }
        }
        Some(("rename", sub)) => {
            session.authorize(Resource::Category, Operation::Update)?;
            let c = categories::rename_category(
                conn,
                caller,
                required_id(sub, "id")?,
                required(sub, "name")?,
            )?;
            println!("Renamed category {} to '{}'", c.id, c.name);
        }
        Some(("move", sub)) => {
            session.authorize(Resource::Category, Operation::Update)?;
            let c = categories::set_parent(
                conn,
                caller,
                required_id(sub, "id")?,
                optional_id(sub, "parent")?,
            )?;
            match c.parent_category_id {
                Some(p) => println!("Moved category '{}' under {}", c.name, p),
                None => println!("Moved category '{}' to the top level", c.name),
            }
        }
        Some(("rm", sub)) => {
            session.authorize(Resource::Category, Operation::Delete)?;
            let id = required_id(sub, "id")?;
            categories::delete_category(conn, caller, id)?;
            println!("Removed category {}", id);
        }
        _ => {}
    }
    Ok(())
}
