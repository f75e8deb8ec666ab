// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use clap::ArgMatches;
use common::{d, fixture, Fixture};
use quantum::commands::Session;
use quantum::error::QuantumError;
use quantum::models::{
    NewScheduledTransaction, RepeatUnit, ScheduledTransaction, ScheduledTransactionPatch,
};
use quantum::schedule::{self, PREVIEW_TRANSACTION_ID};
use quantum::store::scheduled;
use quantum::{cli, commands::scheduled as schedule_commands};
use rust_decimal_macros::dec;

fn option_id(fx: &Fixture, name: &str) -> i64 {
    scheduled::list_repeat_options(&fx.conn)
        .unwrap()
        .into_iter()
        .find(|o| o.name == name)
        .unwrap()
        .id
}

fn schedule(fx: &Fixture, new: NewScheduledTransaction) -> ScheduledTransaction {
    scheduled::create_scheduled(&fx.conn, &fx.owner, &new).unwrap()
}

#[test]
fn month_end_rent_previews_and_materializes() {
    let fx = fixture();
    let rent = schedule(
        &fx,
        NewScheduledTransaction {
            account_id: fx.account,
            fixed_amount: Some(dec!(-1200)),
            start_date: d("2024-01-31"),
            repeat_option_id: option_id(&fx, "Monthly"),
            notes: Some("rent".into()),
            ..Default::default()
        },
    );

    let entry = schedule::preview(&fx.conn, &fx.owner, rent.id, d("2024-02-10"))
        .unwrap()
        .unwrap();
    assert_eq!(entry.transaction.id, PREVIEW_TRANSACTION_ID);
    assert_eq!(entry.transaction.transaction_date, d("2024-02-29"));
    assert_eq!(entry.transaction.amount, dec!(-1200));
    assert_eq!(entry.transaction.clear_date, None);
    assert_eq!(entry.balance, None);

    let written = schedule::materialize(&fx.conn, &fx.owner, rent.id, d("2024-02-10"))
        .unwrap()
        .unwrap();
    assert_ne!(written.id, PREVIEW_TRANSACTION_ID);
    assert_eq!(written.transaction_date, d("2024-02-29"));
    assert_eq!(written.notes.as_deref(), Some("rent"));

    let next = schedule::preview(&fx.conn, &fx.owner, rent.id, d("2024-02-10"))
        .unwrap()
        .unwrap();
    assert_eq!(next.transaction.transaction_date, d("2024-03-31"));
}

#[test]
fn estimate_averages_latest_matching_amounts() {
    let fx = fixture();
    fx.add_tx(dec!(-99.00), "2024-01-01", None, Some(fx.category));
    fx.add_tx(dec!(-20.00), "2024-02-01", None, Some(fx.category));
    fx.add_tx(dec!(-31.00), "2024-03-01", None, Some(fx.category));
    fx.add_tx(dec!(-500.00), "2024-03-02", None, None);

    let groceries = schedule(
        &fx,
        NewScheduledTransaction {
            account_id: fx.account,
            category_id: Some(fx.category),
            estimate_occurrences: Some(2),
            start_date: d("2024-01-01"),
            repeat_option_id: option_id(&fx, "Weekly"),
            ..Default::default()
        },
    );
    assert_eq!(
        schedule::estimate_amount(&fx.conn, &groceries).unwrap(),
        dec!(-25.50)
    );

    let entry = schedule::preview(&fx.conn, &fx.owner, groceries.id, d("2024-03-05"))
        .unwrap()
        .unwrap();
    assert_eq!(entry.transaction.transaction_date, d("2024-03-11"));
    assert_eq!(entry.transaction.amount, dec!(-25.50));
}

#[test]
fn estimate_without_history_is_zero() {
    let fx = fixture();
    let s = schedule(
        &fx,
        NewScheduledTransaction {
            account_id: fx.account,
            category_id: Some(fx.category),
            estimate_occurrences: Some(3),
            start_date: d("2024-01-01"),
            repeat_option_id: option_id(&fx, "Monthly"),
            ..Default::default()
        },
    );
    assert_eq!(schedule::estimate_amount(&fx.conn, &s).unwrap(), dec!(0));
}

#[test]
fn limit_exhausts_the_schedule() {
    let fx = fixture();
    let s = schedule(
        &fx,
        NewScheduledTransaction {
            account_id: fx.account,
            fixed_amount: Some(dec!(-10)),
            start_date: d("2024-01-01"),
            limit_occurrences: Some(2),
            repeat_option_id: option_id(&fx, "Monthly"),
            ..Default::default()
        },
    );
    let first = schedule::materialize(&fx.conn, &fx.owner, s.id, d("2023-12-01")).unwrap();
    let second = schedule::materialize(&fx.conn, &fx.owner, s.id, d("2023-12-01")).unwrap();
    assert_eq!(first.unwrap().transaction_date, d("2024-01-01"));
    assert_eq!(second.unwrap().transaction_date, d("2024-02-01"));
    assert!(schedule::preview(&fx.conn, &fx.owner, s.id, d("2023-12-01")).unwrap().is_none());
    assert!(schedule::materialize(&fx.conn, &fx.owner, s.id, d("2023-12-01")).unwrap().is_none());
}

#[test]
fn end_date_is_inclusive() {
    let fx = fixture();
    let s = schedule(
        &fx,
        NewScheduledTransaction {
            account_id: fx.account,
            fixed_amount: Some(dec!(-1)),
            start_date: d("2024-01-01"),
            end_date: Some(d("2024-01-15")),
            repeat_option_id: option_id(&fx, "Weekly"),
            ..Default::default()
        },
    );
    let on_end = schedule::preview(&fx.conn, &fx.owner, s.id, d("2024-01-15")).unwrap();
    assert_eq!(on_end.unwrap().transaction.transaction_date, d("2024-01-15"));
    assert!(schedule::preview(&fx.conn, &fx.owner, s.id, d("2024-01-16")).unwrap().is_none());
}

#[test]
fn schedule_needs_an_amount_source() {
    let fx = fixture();
    let err = scheduled::create_scheduled(
        &fx.conn,
        &fx.owner,
        &NewScheduledTransaction {
            account_id: fx.account,
            start_date: d("2024-01-01"),
            repeat_option_id: option_id(&fx, "Monthly"),
            ..Default::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, QuantumError::Validation(_)));
}

#[test]
fn foreign_schedule_is_not_found() {
    let fx = fixture();
    let s = schedule(
        &fx,
        NewScheduledTransaction {
            account_id: fx.account,
            fixed_amount: Some(dec!(-1)),
            start_date: d("2024-01-01"),
            repeat_option_id: option_id(&fx, "Monthly"),
            ..Default::default()
        },
    );
    let err = schedule::preview(&fx.conn, &fx.stranger, s.id, d("2024-01-01")).unwrap_err();
    assert!(matches!(err, QuantumError::NotFound(_)));
}

#[test]
fn schedule_next_lists_several_occurrences() {
    let fx = fixture();
    let s = schedule(
        &fx,
        NewScheduledTransaction {
            account_id: fx.account,
            fixed_amount: Some(dec!(-5)),
            start_date: d("2024-01-10"),
            repeat_option_id: option_id(&fx, "Semi-Monthly"),
            ..Default::default()
        },
    );
    let session = fx.session("2024-01-10");
    let id = s.id.to_string();
    let matches = cli::build_cli().get_matches_from([
        "quantum", "schedule", "next", "--id", &id, "--count", "3",
    ]);
    let Some(("schedule", schedule_m)) = matches.subcommand() else {
        panic!("no schedule subcommand");
    };
    let Some(("next", next_m)) = schedule_m.subcommand() else {
        panic!("no next subcommand");
    };
    let dates: Vec<_> = schedule_commands::upcoming(&fx.conn, &session, next_m)
        .unwrap()
        .into_iter()
        .map(|e| e.transaction.transaction_date)
        .collect();
    assert_eq!(dates, vec![d("2024-01-16"), d("2024-02-01"), d("2024-02-16")]);
}

#[test]
fn failed_bookkeeping_rolls_back_the_materialized_row() {
    let fx = fixture();
    let s = schedule(
        &fx,
        NewScheduledTransaction {
            account_id: fx.account,
            fixed_amount: Some(dec!(-15)),
            start_date: d("2024-01-01"),
            repeat_option_id: option_id(&fx, "Monthly"),
            ..Default::default()
        },
    );
    fx.conn
        .execute_batch(
            "CREATE TRIGGER block_mark BEFORE UPDATE OF last_materialized_date ON scheduled_transactions
             BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
        )
        .unwrap();

    assert!(schedule::materialize(&fx.conn, &fx.owner, s.id, d("2023-12-01")).is_err());
    let written: i64 = fx
        .conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(written, 0);
    let unchanged = scheduled::get_scheduled(&fx.conn, &fx.owner, s.id).unwrap();
    assert_eq!(unchanged.last_materialized_date, None);

    fx.conn.execute_batch("DROP TRIGGER block_mark;").unwrap();
    let first = schedule::materialize(&fx.conn, &fx.owner, s.id, d("2023-12-01"))
        .unwrap()
        .unwrap();
    assert_eq!(first.transaction_date, d("2024-01-01"));
}

fn schedule_matches(args: &[&str]) -> ArgMatches {
    let mut argv = vec!["quantum", "schedule"];
    argv.extend_from_slice(args);
    match cli::build_cli().get_matches_from(argv).subcommand() {
        Some(("schedule", m)) => m.clone(),
        _ => panic!("no schedule subcommand"),
    }
}

fn monthly_rent(fx: &Fixture) -> ScheduledTransaction {
    schedule(
        fx,
        NewScheduledTransaction {
            account_id: fx.account,
            fixed_amount: Some(dec!(-10)),
            start_date: d("2024-01-01"),
            end_date: Some(d("2024-12-31")),
            repeat_option_id: option_id(fx, "Monthly"),
            ..Default::default()
        },
    )
}

#[test]
fn update_switches_to_estimating_and_keeps_the_mark() {
    let fx = fixture();
    let s = monthly_rent(&fx);
    schedule::materialize(&fx.conn, &fx.owner, s.id, d("2023-12-01")).unwrap();

    let updated = scheduled::update_scheduled(
        &fx.conn,
        &fx.owner,
        s.id,
        &ScheduledTransactionPatch {
            fixed_amount: Some(None),
            estimate_occurrences: Some(Some(3)),
            category_id: Some(Some(fx.category)),
            end_date: Some(None),
            repeat_option_id: Some(option_id(&fx, "Weekly")),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(updated.fixed_amount, None);
    assert_eq!(updated.estimate_occurrences, Some(3));
    assert_eq!(updated.category_id, Some(fx.category));
    assert_eq!(updated.end_date, None);
    assert_eq!(updated.start_date, d("2024-01-01"));
    assert_eq!(updated.last_materialized_date, Some(d("2024-01-01")));

    let next = schedule::preview(&fx.conn, &fx.owner, s.id, d("2023-12-01"))
        .unwrap()
        .unwrap();
    assert_eq!(next.transaction.transaction_date, d("2024-01-08"));
}

#[test]
fn update_rechecks_every_rule() {
    let fx = fixture();
    let s = monthly_rent(&fx);
    let bad = |patch: ScheduledTransactionPatch| {
        scheduled::update_scheduled(&fx.conn, &fx.owner, s.id, &patch).unwrap_err()
    };
    assert!(matches!(
        bad(ScheduledTransactionPatch {
            fixed_amount: Some(None),
            ..Default::default()
        }),
        QuantumError::Validation(_)
    ));
    assert!(matches!(
        bad(ScheduledTransactionPatch {
            start_date: Some(d("2025-02-01")),
            ..Default::default()
        }),
        QuantumError::Validation(_)
    ));
    assert!(matches!(
        bad(ScheduledTransactionPatch {
            repeat_option_id: Some(9999),
            ..Default::default()
        }),
        QuantumError::NotFound("repeat option")
    ));

    let elsewhere = quantum::store::portfolios::list_portfolios(&fx.conn, &fx.stranger)
        .unwrap()
        .remove(0)
        .id;
    let foreign = quantum::store::categories::create_category(
        &fx.conn,
        &fx.stranger,
        elsewhere,
        "Theirs",
        None,
    )
    .unwrap()
    .id;
    assert!(matches!(
        bad(ScheduledTransactionPatch {
            category_id: Some(Some(foreign)),
            ..Default::default()
        }),
        QuantumError::NotFound(_)
    ));
    assert!(matches!(
        scheduled::update_scheduled(
            &fx.conn,
            &fx.stranger,
            s.id,
            &ScheduledTransactionPatch::default()
        ),
        Err(QuantumError::NotFound(_))
    ));
    assert_eq!(scheduled::get_scheduled(&fx.conn, &fx.owner, s.id).unwrap(), s);
}

#[test]
fn schedule_edit_and_show_through_the_cli() {
    let fx = fixture();
    let s = monthly_rent(&fx);
    let id = s.id.to_string();
    let session = fx.session("2024-01-01");

    let edit = schedule_matches(&[
        "edit", "--id", &id, "--estimate", "2", "--end", "none", "--limit", "6", "--notes", "utilities",
    ]);
    schedule_commands::handle(&fx.conn, &session, &edit).unwrap();
    let edited = scheduled::get_scheduled(&fx.conn, &fx.owner, s.id).unwrap();
    assert_eq!(edited.fixed_amount, None);
    assert_eq!(edited.estimate_occurrences, Some(2));
    assert_eq!(edited.end_date, None);
    assert_eq!(edited.limit_occurrences, Some(6));
    assert_eq!(edited.notes.as_deref(), Some("utilities"));

    let amount = schedule_matches(&["edit", "--id", &id, "--amount", "-12.50", "--limit", "none"]);
    schedule_commands::handle(&fx.conn, &session, &amount).unwrap();
    let edited = scheduled::get_scheduled(&fx.conn, &fx.owner, s.id).unwrap();
    assert_eq!(edited.fixed_amount, Some(dec!(-12.50)));
    assert_eq!(edited.estimate_occurrences, None);
    assert_eq!(edited.limit_occurrences, None);

    let show = schedule_matches(&["show", "--id", &id, "--json"]);
    schedule_commands::handle(&fx.conn, &session, &show).unwrap();
    let stranger = Session::for_caller(fx.stranger.clone(), d("2024-01-01"));
    let err = schedule_commands::handle(&fx.conn, &stranger, &show).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<QuantumError>(),
        Some(QuantumError::NotFound(_))
    ));
}

#[test]
fn repeat_option_needs_a_known_unit_row() {
    let fx = fixture();
    fx.conn
        .execute_batch("PRAGMA foreign_keys=OFF; DELETE FROM repeat_units WHERE name='day';")
        .unwrap();
    let before = scheduled::list_repeat_options(&fx.conn).unwrap().len();
    let err = scheduled::create_repeat_option(&fx.conn, "Every third day", 3, RepeatUnit::Day)
        .unwrap_err();
    assert!(matches!(err, QuantumError::NotFound("repeat unit")));

    let made = scheduled::create_repeat_option(&fx.conn, "Fortnightly", 2, RepeatUnit::Week).unwrap();
    assert_eq!(made.name, "Fortnightly");
    assert_eq!(made.repeat_unit, RepeatUnit::Week);
    assert_eq!(scheduled::list_repeat_options(&fx.conn).unwrap().len(), before + 1);
}
