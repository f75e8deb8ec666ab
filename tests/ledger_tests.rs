// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{d, fixture};
use quantum::error::QuantumError;
use quantum::ledger;
use quantum::month::YearMonth;
use quantum::summaries;
use quantum::{cli, commands::transactions};
use rusqlite::params;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn balances(entries: &[ledger::LedgerEntry]) -> Vec<(i64, Decimal)> {
    entries
        .iter()
        .map(|e| (e.transaction.id, e.balance.unwrap()))
        .collect()
}

#[test]
fn cleared_transaction_sorts_before_uncleared() {
    let fx = fixture();
    let pending = fx.add_tx(dec!(-200), "2024-01-05", None, None);
    let cleared = fx.add_tx(dec!(500), "2024-01-10", Some("2024-01-10"), None);

    let entries = ledger::account_ledger(&fx.conn, &fx.owner, fx.account, d("2023-08-01")).unwrap();
    assert_eq!(
        balances(&entries),
        vec![(cleared.id, dec!(1500)), (pending.id, dec!(1300))]
    );
}

#[test]
fn checkpoint_replaces_older_history() {
    let fx = fixture();
    fx.add_tx(dec!(-300), "2023-06-01", Some("2023-06-02"), None);
    let later = fx.add_tx(dec!(50), "2024-01-01", Some("2024-01-02"), None);
    fx.conn
        .execute(
            "INSERT INTO transaction_summaries(account_id, year, month, balance) VALUES (?1, 2023, 12, 500000)",
            params![fx.account],
        )
        .unwrap();

    let entries = ledger::account_ledger(&fx.conn, &fx.owner, fx.account, d("2024-01-01")).unwrap();
    assert_eq!(balances(&entries), vec![(later.id, dec!(5050))]);
}

#[test]
fn final_balance_survives_any_cutoff_and_rebuilt_checkpoints() {
    let fx = fixture();
    let rows = [
        (dec!(-45.10), "2023-02-10", Some("2023-02-12")),
        (dec!(1200.00), "2023-05-31", Some("2023-06-01")),
        (dec!(-19.99), "2023-11-15", Some("2023-11-15")),
        (dec!(-80.00), "2024-01-20", Some("2024-02-03")),
        (dec!(-7.25), "2023-01-01", None),
        (dec!(-12.00), "2024-03-01", None),
    ];
    for (amount, date, cleared) in rows {
        fx.add_tx(amount, date, cleared, None);
    }
    let expected = dec!(1000) + rows.iter().map(|r| r.0).sum::<Decimal>();
    let cutoffs = ["2022-01-01", "2023-03-01", "2023-09-01", "2024-02-01", "2024-06-01"];

    for cutoff in cutoffs {
        let entries = ledger::account_ledger(&fx.conn, &fx.owner, fx.account, d(cutoff)).unwrap();
        assert_eq!(entries.last().unwrap().balance, Some(expected), "cutoff {}", cutoff);
    }

    summaries::rebuild(&fx.conn, &fx.owner, fx.account, YearMonth::new(2024, 3).unwrap()).unwrap();
    for cutoff in cutoffs {
        let entries = ledger::account_ledger(&fx.conn, &fx.owner, fx.account, d(cutoff)).unwrap();
        assert_eq!(entries.last().unwrap().balance, Some(expected), "cutoff {}", cutoff);
        for pair in entries.windows(2) {
            assert_eq!(
                pair[1].balance.unwrap(),
                pair[0].balance.unwrap() + pair[1].transaction.amount
            );
        }
    }
    assert_eq!(
        ledger::account_balance(&fx.conn, &fx.owner, fx.account, d("2023-09-01")).unwrap(),
        expected
    );
}

#[test]
fn uncleared_ties_keep_insertion_order() {
    let fx = fixture();
    let ids: Vec<i64> = (0..4)
        .map(|_| fx.add_tx(dec!(-1), "2024-02-02", None, None).id)
        .collect();
    for _ in 0..3 {
        let got: Vec<i64> = ledger::account_ledger(&fx.conn, &fx.owner, fx.account, d("2024-01-01"))
            .unwrap()
            .into_iter()
            .map(|e| e.transaction.id)
            .collect();
        assert_eq!(got, ids);
    }
}

#[test]
fn foreign_account_looks_missing() {
    let fx = fixture();
    let foreign = ledger::account_ledger(&fx.conn, &fx.stranger, fx.account, d("2024-01-01")).unwrap_err();
    let missing = ledger::account_ledger(&fx.conn, &fx.owner, 9999, d("2024-01-01")).unwrap_err();
    assert!(matches!(foreign, QuantumError::NotFound("account")));
    assert_eq!(foreign.to_string(), missing.to_string());
}

#[test]
fn tx_list_limit_keeps_newest_rows() {
    let fx = fixture();
    fx.add_tx(dec!(-1), "2025-01-01", Some("2025-01-01"), None);
    fx.add_tx(dec!(-2), "2025-01-02", Some("2025-01-02"), None);
    let newest = fx.add_tx(dec!(-3), "2025-01-03", None, None);

    let session = fx.session("2025-01-20");
    let account = fx.account.to_string();
    let matches = cli::build_cli().get_matches_from([
        "quantum", "tx", "list", "--account", &account, "--limit", "2",
    ]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    let Some(("list", list_m)) = tx_m.subcommand() else {
        panic!("no list subcommand");
    };
    let rows = transactions::ledger_rows(&fx.conn, &session, list_m).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].transaction.id, newest.id);
    assert_eq!(rows[1].balance, Some(dec!(994)));
}
