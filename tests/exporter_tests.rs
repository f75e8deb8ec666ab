// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use clap::ArgMatches;
use common::fixture;
use quantum::store::budgets;
use quantum::{cli, commands::exporter};
use rust_decimal_macros::dec;
use serde_json::Value;
use tempfile::tempdir;

fn export_matches(args: &[&str]) -> ArgMatches {
    let mut argv = vec!["quantum", "export"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("export", m)) => m.clone(),
        _ => panic!("no export subcommand"),
    }
}

#[test]
fn ledger_json_carries_running_balances() {
    let fx = fixture();
    let cleared = fx.add_tx(dec!(500), "2024-01-10", Some("2024-01-10"), None);
    let pending = fx.add_tx(dec!(-12.34), "2024-01-05", None, Some(fx.category));

    let dir = tempdir().unwrap();
    let out = dir.path().join("ledger.json");
    let out_str = out.to_string_lossy().to_string();
    let account = fx.account.to_string();
    let m = export_matches(&[
        "ledger", "--account", &account, "--format", "json", "--out", &out_str, "--cutoff",
        "2023-12-01",
    ]);
    exporter::handle(&fx.conn, &fx.session("2024-02-01"), &m).unwrap();

    let rows: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], cleared.id);
    assert_eq!(rows[0]["balance"].to_string(), "1500.00");
    assert_eq!(rows[1]["id"], pending.id);
    assert_eq!(rows[1]["amount"].to_string(), "-12.34");
    assert_eq!(rows[1]["balance"].to_string(), "1487.66");
    assert_eq!(rows[1]["clear_date"], Value::Null);
    assert!(rows[1].get("order_index").is_none());
}

#[test]
fn budgets_csv_has_one_line_per_month() {
    let fx = fixture();
    let budget = budgets::create_budget(&fx.conn, &fx.owner, fx.portfolio, fx.category, "Food", dec!(250))
        .unwrap();
    fx.add_tx(dec!(-20), "2024-03-03", Some("2024-03-04"), Some(fx.category));
    fx.add_tx(dec!(-30), "2024-04-03", None, Some(fx.category));

    let dir = tempdir().unwrap();
    let out = dir.path().join("budgets.csv");
    let out_str = out.to_string_lossy().to_string();
    let m = export_matches(&["budgets", "--out", &out_str, "--cutoff", "2024-01-01"]);
    exporter::handle(&fx.conn, &fx.session("2024-05-01"), &m).unwrap();

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[4], "report_month");
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][0], budget.id.to_string());
    assert_eq!(&records[0][1], "Food");
    assert_eq!(&records[0][4], "2024-03");
    assert_eq!(&records[0][5], "-20.00");
    assert_eq!(&records[1][4], "2024-04");
}

#[test]
fn unknown_format_fails_without_writing() {
    let fx = fixture();
    let dir = tempdir().unwrap();
    let out = dir.path().join("ledger.xml");
    let out_str = out.to_string_lossy().to_string();
    let account = fx.account.to_string();
    let m = export_matches(&[
        "ledger", "--account", &account, "--format", "xml", "--out", &out_str,
    ]);
    let err = exporter::handle(&fx.conn, &fx.session("2024-02-01"), &m).unwrap_err();
    assert!(err.to_string().contains("Unknown format"));
    assert!(!out.exists());
}
