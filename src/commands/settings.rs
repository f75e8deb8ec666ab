// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use anyhow::Result;
use clap::ArgMatches;
use rusqlite::Connection;

use super::Session;
use crate::config;
use crate::permissions::{Operation, Resource};
use crate::utils::{pretty_table, print_json_if_requested, required};

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            session.authorize(Resource::Setting, Operation::Read)?;
            let data = config::list_settings(conn)?;
            let as_map: BTreeMap<_, _> = data.iter().cloned().collect();
            if !print_json_if_requested(sub, &as_map)? {
                let rows = data.into_iter().map(|(k, v)| vec![k, v]).collect();
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        }
        Some(("get", sub)) => {
            session.authorize(Resource::Setting, Operation::Read)?;
            let key = required(sub, "key")?;
            let value = config::list_settings(conn)?
                .into_iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v);
            match value {
                Some(v) => println!("{}", v),
                None => println!("{} is not set", key),
            }
        }
        Some(("set", sub)) => {
            session.authorize(Resource::Setting, Operation::Update)?;
            let key = required(sub, "key")?;
            let value = required(sub, "value")?;
            config::set_setting(conn, key, value)?;
            println!("Set {} = {}", key, value);
        }
        _ => {}
    }
    Ok(())
}
