// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use clap::ArgMatches;
use rusqlite::Connection;

use super::Session;
use crate::permissions::{Operation, Resource, Role};
use crate::store::users;
use crate::utils::{pretty_table, print_json_if_requested, required};

/// Creates the first user as super user. Later users go through `user add`.
pub fn init(conn: &Connection, m: &ArgMatches) -> Result<()> {
    let Some(email) = m.get_one::<String>("email") else {
        return Ok(());
    };
    if users::count_users(conn)? > 0 {
        bail!("Users already exist; add more with `quantum user add`");
    }
    let first = m.get_one::<String>("first").map(String::as_str).unwrap_or("");
    let last = m.get_one::<String>("last").map(String::as_str).unwrap_or("");
    let user = users::create_user(conn, email, first, last, Role::SuperUser)?;
    println!("Created super user {} (id {})", user.email, user.id);
    Ok(())
}

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            session.authorize(Resource::User, Operation::Create)?;
            let role = required(sub, "role")?.parse::<Role>()?;
            let first = sub.get_one::<String>("first").map(String::as_str).unwrap_or("");
            let last = sub.get_one::<String>("last").map(String::as_str).unwrap_or("");
            let user = users::create_user(conn, required(sub, "email")?, first, last, role)?;
            println!("Added user {} as {} (id {})", user.email, user.role, user.id);
        }
        Some(("list", sub)) => {
            session.authorize(Resource::User, Operation::Read)?;
            let data = users::list_users(conn)?;
            if !print_json_if_requested(sub, &data)? {
                let rows = data
                    .iter()
                    .map(|u| {
                        vec![
                            u.id.to_string(),
                            u.email.clone(),
                            format!("{} {}", u.first_name, u.last_name).trim().to_string(),
                            u.role.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Id", "Email", "Name", "Role"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
