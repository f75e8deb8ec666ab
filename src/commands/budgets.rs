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
use crate::rollup::{self, BudgetWithData, MonthAmount};
use crate::store::budgets;
use crate::utils::{
    optional_decimal, optional_id, parse_decimal, pretty_table, print_json_if_requested,
    required, required_id,
};

pub fn handle(conn: &Connection, session: &Session, m: &ArgMatches) -> Result<()> {
    let caller = &session.caller;
    match m.subcommand() {
        Some(("add", sub)) => {
            session.authorize(Resource::Budget, Operation::Create)?;
            let b = budgets::create_budget(
                conn,
                caller,
                required_id(sub, "portfolio")?,
                required_id(sub, "category")?,
                required(sub, "name")?,
                parse_decimal(required(sub, "amount")?)?,
            )?;
            println!("Added budget '{}' (id {}) = {}", b.name, b.id, b.amount);
        }
        Some(("list", sub)) => list(conn, session, sub)?,
        Some(("show", sub)) => {
            let view = budget_view(conn, session, sub)?;
            if !print_json_if_requested(sub, &view)? {
                println!(
                    "Budget '{}' (id {}, category {}) target {}",
                    view.budget.name, view.budget.id, view.budget.category_id, view.budget.amount
                );
                println!("{}", month_table(&view.data));
            }
        }
        Some(("report", sub)) => {
            session.authorize(Resource::Budget, Operation::Read)?;
            let cutoff = session.rollup_cutoff(sub)?;
            let data = rollup::all_budget_data(conn, caller, cutoff)?;
            if !print_json_if_requested(sub, &data)? {
                let rows = data
                    .iter()
                    .map(|r| {
                        vec![
                            r.category_id.to_string(),
                            r.report_month.to_string(),
                            r.amount.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Category", "Month", "Amount"], rows));
            }
        }
        Some(("edit", sub)) => {
            session.authorize(Resource::Budget, Operation::Update)?;
            let b = budgets::update_budget(
                conn,
                caller,
                required_id(sub, "id")?,
                sub.get_one::<String>("name").map(String::as_str),
                optional_id(sub, "category")?,
                optional_decimal(sub, "amount")?,
            )?;
            println!("Updated budget {} ('{}') = {}", b.id, b.name, b.amount);
        }
        Some(("rm", sub)) => {
            session.authorize(Resource::Budget, Operation::Delete)?;
            let id = required_id(sub, "id")?;
            budgets::delete_budget(conn, caller, id)?;
            println!("Removed budget {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn month_table(data: &[MonthAmount]) -> comfy_table::Table {
    let rows = data
        .iter()
        .map(|d| vec![d.report_month.to_string(), d.amount.to_string()])
        .collect();
    pretty_table(&["Month", "Amount"], rows)
}

fn list(conn: &Connection, session: &Session, sub: &ArgMatches) -> Result<()> {
    session.authorize(Resource::Budget, Operation::Read)?;
    if sub.get_flag("with-data") {
        let cutoff = session.rollup_cutoff(sub)?;
        let data = rollup::budgets_with_data(conn, &session.caller, cutoff)?;
        if !print_json_if_requested(sub, &data)? {
            let rows = data
                .iter()
                .flat_map(|b| {
                    b.data.iter().map(move |d| {
                        vec![
                            b.budget.id.to_string(),
                            b.budget.name.clone(),
                            b.budget.amount.to_string(),
                            d.report_month.to_string(),
                            d.amount.to_string(),
                        ]
                    })
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Id", "Budget", "Target", "Month", "Actual"], rows)
            );
        }
        return Ok(());
    }
    let data = budgets::list_budgets(conn, &session.caller)?;
    if !print_json_if_requested(sub, &data)? {
        let rows = data
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    b.portfolio_id.to_string(),
                    b.category_id.to_string(),
                    b.name.clone(),
                    b.amount.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Portfolio", "Category", "Name", "Target"], rows)
        );
    }
    Ok(())
}

/// One budget with its monthly totals.
pub fn budget_view(conn: &Connection, session: &Session, sub: &ArgMatches) -> Result<BudgetWithData> {
    session.authorize(Resource::Budget, Operation::Read)?;
    let id = required_id(sub, "id")?;
    let cutoff = session.rollup_cutoff(sub)?;
    let budget = budgets::get_budget(conn, &session.caller, id)?;
    let data = rollup::budget_data(conn, &session.caller, id, cutoff)?;
    Ok(BudgetWithData { budget, data })
}
