// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use clap::ArgMatches;
use rusqlite::Connection;

use super::Session;
use crate::models::TransactionSummary;
use crate::month::YearMonth;
use crate::permissions::{Operation, Resource};
use crate::summaries;
use crate::utils::{parse_month, pretty_table, print_json_if_requested, required_id};

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    let caller = &session.caller;
    match m.subcommand() {
        Some(("rebuild", sub)) => {
            session.authorize(Resource::Summary, Operation::Create)?;
            let through = match sub.get_one::<String>("through") {
                Some(s) => parse_month(s)?,
                None => YearMonth::of(session.today).prev(),
            };
            let data = summaries::rebuild(conn, caller, required_id(sub, "account")?, through)?;
            if !print_json_if_requested(sub, &data)? {
                println!("Rebuilt {} monthly checkpoints through {}", data.len(), through);
            }
        }
        Some(("list", sub)) => {
            session.authorize(Resource::Summary, Operation::Read)?;
            let data = summaries::list_summaries(conn, caller, required_id(sub, "account")?)?;
            if !print_json_if_requested(sub, &data)? {
                println!("{}", summary_table(&data));
            }
        }
        _ => {}
    }
    Ok(())
}

fn summary_table(data: &[TransactionSummary]) -> comfy_table::Table {
    let rows = data
        .iter()
        .map(|s| {
            vec![
                format!("{:04}-{:02}", s.year, s.month),
                s.balance.to_string(),
            ]
        })
        .collect();
    pretty_table(&["Month", "Balance"], rows)
}
