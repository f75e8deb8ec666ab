// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! `payee` and `txtype` share one handler.

use anyhow::Result;
use clap::ArgMatches;
use rusqlite::Connection;

use super::Session;
use crate::permissions::Operation;
use crate::store::references::{self, ReferenceKind};
use crate::utils::{pretty_table, print_json_if_requested, required, required_id};

pub fn handle(
    conn: &Connection,
    session: &Session,
    kind: ReferenceKind,
    m: &ArgMatches,
) -> Result<()> {
    let caller = &session.caller;
    let resource = kind.resource();
    match m.subcommand() {
        Some(("add", sub)) => {
            session.authorize(resource, Operation::Create)?;
            let r = references::create_reference(
                conn,
                caller,
                kind,
                required_id(sub, "portfolio")?,
                required(sub, "name")?,
            )?;
            println!("Added {} '{}' (id {})", kind.entity(), r.name, r.id);
        }
        Some(("list", sub)) => {
            session.authorize(resource, Operation::Read)?;
            let data =
                references::list_references(conn, caller, kind, required_id(sub, "portfolio")?)?;
            if !print_json_if_requested(sub, &data)? {
                let rows = data
                    .iter()
                    .map(|r| vec![r.id.to_string(), r.name.clone()])
                    .collect();
                println!("{}", pretty_table(&["Id", "Name"], rows));
            }
        }
        Some(("rename", sub)) => {
            session.authorize(resource, Operation::Update)?;
            let r = references::rename_reference(
                conn,
                caller,
                kind,
                required_id(sub, "id")?,
                required(sub, "name")?,
            )?;
            println!("Renamed {} {} to '{}'", kind.entity(), r.id, r.name);
        }
        Some(("rm", sub)) => {
            session.authorize(resource, Operation::Delete)?;
            let id = required_id(sub, "id")?;
            references::delete_reference(conn, caller, kind, id)?;
            println!("Removed {} {}", kind.entity(), id);
        }
        _ => {}
    }
    Ok(())
}
