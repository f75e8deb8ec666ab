// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod category_tree;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod money;
pub mod month;
pub mod permissions;
pub mod queries;
pub mod rollup;
pub mod schedule;
pub mod store;
pub mod summaries;
pub mod utils;
