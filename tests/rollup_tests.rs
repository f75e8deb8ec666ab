// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{d, fixture};
use quantum::error::QuantumError;
use quantum::rollup::{self, MonthAmount};
use quantum::store::{budgets, categories};
use quantum::{cli, commands::budgets as budget_commands};
use rusqlite::params;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn same_month_amounts_are_summed() {
    let fx = fixture();
    fx.add_tx(dec!(300), "2024-03-15", Some("2024-03-15"), Some(fx.category));
    fx.add_tx(dec!(-100), "2024-03-15", Some("2024-03-15"), Some(fx.category));
    let budget = budgets::create_budget(&fx.conn, &fx.owner, fx.portfolio, fx.category, "Food", dec!(400))
        .unwrap();

    for cutoff in ["2023-04-01", "2024-03-16", "2024-06-01"] {
        let data = rollup::budget_data(&fx.conn, &fx.owner, budget.id, d(cutoff)).unwrap();
        assert_eq!(
            data,
            vec![MonthAmount {
                report_month: "2024-03".parse().unwrap(),
                amount: dec!(200),
            }],
            "cutoff {}",
            cutoff
        );
    }
}

#[test]
fn recent_rows_fall_back_to_transaction_month() {
    let fx = fixture();
    fx.add_tx(dec!(-10), "2024-04-28", Some("2024-05-02"), Some(fx.category));
    fx.add_tx(dec!(-20), "2024-04-30", None, Some(fx.category));
    fx.add_tx(dec!(-99), "2024-04-30", None, None);

    let rows = rollup::all_budget_data(&fx.conn, &fx.owner, d("2024-01-01")).unwrap();
    let view: Vec<_> = rows
        .iter()
        .map(|r| (r.category_id, r.report_month.to_string(), r.amount))
        .collect();
    assert_eq!(
        view,
        vec![
            (fx.category, "2024-04".to_string(), dec!(-20)),
            (fx.category, "2024-05".to_string(), dec!(-10)),
        ]
    );
}

#[test]
fn nothing_is_lost_or_doubled_across_the_split() {
    let fx = fixture();
    let other = categories::create_category(&fx.conn, &fx.owner, fx.portfolio, "Fuel", None)
        .unwrap()
        .id;
    let rows = [
        (dec!(-12.34), "2023-01-05", Some("2023-01-06"), fx.category),
        (dec!(-50.00), "2023-06-30", Some("2023-07-01"), fx.category),
        (dec!(5.55), "2023-12-31", Some("2024-01-01"), fx.category),
        (dec!(-8.80), "2022-11-11", None, fx.category),
        (dec!(-60.00), "2023-08-15", Some("2023-08-16"), other),
        (dec!(-61.50), "2024-02-01", None, other),
    ];
    for (amount, date, cleared, category) in rows {
        fx.add_tx(amount, date, cleared, Some(category));
    }

    for cutoff in ["2020-01-01", "2023-07-01", "2024-01-01", "2030-01-01"] {
        let out = rollup::all_budget_data(&fx.conn, &fx.owner, d(cutoff)).unwrap();
        for category in [fx.category, other] {
            let rolled: Decimal = out
                .iter()
                .filter(|r| r.category_id == category)
                .map(|r| r.amount)
                .sum();
            let direct: Decimal = rows.iter().filter(|r| r.3 == category).map(|r| r.0).sum();
            assert_eq!(rolled, direct, "cutoff {} category {}", cutoff, category);
        }
    }
}

#[test]
fn caller_without_data_gets_an_empty_report() {
    let fx = fixture();
    fx.add_tx(dec!(-5), "2024-03-01", Some("2024-03-01"), Some(fx.category));
    assert!(
        rollup::all_budget_data(&fx.conn, &fx.stranger, d("2023-01-01"))
            .unwrap()
            .is_empty()
    );
}

#[test]
fn foreign_budget_is_not_found() {
    let fx = fixture();
    let budget = budgets::create_budget(&fx.conn, &fx.owner, fx.portfolio, fx.category, "Food", dec!(1))
        .unwrap();
    let err = rollup::budget_data(&fx.conn, &fx.stranger, budget.id, d("2024-01-01")).unwrap_err();
    assert!(matches!(err, QuantumError::NotFound("budget")));
}

#[test]
fn vanished_category_is_an_integrity_violation() {
    let fx = fixture();
    let budget = budgets::create_budget(&fx.conn, &fx.owner, fx.portfolio, fx.category, "Food", dec!(1))
        .unwrap();
    fx.conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    fx.conn
        .execute("DELETE FROM categories WHERE id=?1", params![fx.category])
        .unwrap();
    let err = rollup::budget_data(&fx.conn, &fx.owner, budget.id, d("2024-01-01")).unwrap_err();
    assert!(matches!(err, QuantumError::IntegrityViolation(_)));
}

#[test]
fn budgets_carry_their_category_data() {
    let fx = fixture();
    let fuel = categories::create_category(&fx.conn, &fx.owner, fx.portfolio, "Fuel", None)
        .unwrap()
        .id;
    let food = budgets::create_budget(&fx.conn, &fx.owner, fx.portfolio, fx.category, "Food", dec!(300))
        .unwrap();
    let car = budgets::create_budget(&fx.conn, &fx.owner, fx.portfolio, fuel, "Car", dec!(100)).unwrap();
    fx.add_tx(dec!(-42.10), "2024-05-03", Some("2024-05-04"), Some(fx.category));

    let all = rollup::budgets_with_data(&fx.conn, &fx.owner, d("2024-01-01")).unwrap();
    let food_data = &all.iter().find(|b| b.budget.id == food.id).unwrap().data;
    let car_data = &all.iter().find(|b| b.budget.id == car.id).unwrap().data;
    assert_eq!(food_data.len(), 1);
    assert_eq!(food_data[0].amount, dec!(-42.10));
    assert!(car_data.is_empty());

    let json = serde_json::to_value(&all).unwrap();
    let food_json = json
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["id"] == food.id)
        .unwrap();
    assert_eq!(food_json["data"][0]["report_month"], "2024-05");
    assert_eq!(food_json["data"][0]["amount"].to_string(), "-42.10");
}

#[test]
fn budget_show_uses_cli_cutoff() {
    let fx = fixture();
    let budget = budgets::create_budget(&fx.conn, &fx.owner, fx.portfolio, fx.category, "Food", dec!(1))
        .unwrap();
    fx.add_tx(dec!(-3), "2021-02-01", Some("2021-02-01"), Some(fx.category));

    let session = fx.session("2024-06-15");
    let id = budget.id.to_string();
    let matches = cli::build_cli().get_matches_from(["quantum", "budget", "show", "--id", &id]);
    let Some(("budget", budget_m)) = matches.subcommand() else {
        panic!("no budget subcommand");
    };
    let Some(("show", show_m)) = budget_m.subcommand() else {
        panic!("no show subcommand");
    };
    let view = budget_commands::budget_view(&fx.conn, &session, show_m).unwrap();
    assert_eq!(view.data.len(), 1);
    assert_eq!(view.data[0].report_month.to_string(), "2021-02");
}
