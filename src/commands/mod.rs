// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod exporter;
pub mod portfolios;
pub mod references;
pub mod scheduled;
pub mod settings;
pub mod summaries;
pub mod transactions;
pub mod users;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use clap::ArgMatches;
use rusqlite::Connection;

use crate::config::{Settings, USER_ENV};
use crate::permissions::{Caller, Operation, Resource};
use crate::store::users as user_store;
use crate::utils::{optional_date, parse_date};

/// Who is acting, with which settings, on which day.
#[derive(Debug, Clone)]
pub struct Session {
    pub caller: Caller,
    pub settings: Settings,
    pub today: NaiveDate,
}

impl Session {
    /// Resolves the acting user by email. Without one, a database with a
    /// single user acts as that user.
    pub fn open(conn: &Connection, user: Option<&str>, today: NaiveDate) -> Result<Self> {
        let user = match user {
            Some(email) => user_store::find_user_by_email(conn, email)
                .with_context(|| format!("Unknown user '{}'", email))?,
            None => {
                let mut users = user_store::list_users(conn)?;
                if users.len() != 1 {
                    return Err(anyhow!(
                        "No acting user: pass --user <EMAIL> or set {}",
                        USER_ENV
                    ));
                }
                users.remove(0)
            }
        };
        let settings = Settings::load(conn)?;
        tracing::debug!(user_id = user.id, role = %user.role, %today, "session opened");
        Ok(Self {
            caller: user.into(),
            settings,
            today,
        })
    }

    /// Session for tests and embedding, with default settings.
    pub fn for_caller(caller: Caller, today: NaiveDate) -> Self {
        Self {
            caller,
            settings: Settings::default(),
            today,
        }
    }

    pub fn authorize(&self, resource: Resource, operation: Operation) -> Result<()> {
        Ok(self.caller.authorize(resource, operation)?)
    }

    /// `--cutoff` when given, else the ledger window from settings.
    pub fn ledger_cutoff(&self, m: &ArgMatches) -> Result<NaiveDate> {
        Ok(optional_date(m, "cutoff")?.unwrap_or_else(|| self.settings.ledger_cutoff(self.today)))
    }

    /// `--cutoff` when given, else the rollup window from settings.
    pub fn rollup_cutoff(&self, m: &ArgMatches) -> Result<NaiveDate> {
        Ok(optional_date(m, "cutoff")?.unwrap_or_else(|| self.settings.rollup_cutoff(self.today)))
    }
}

/// `--as-of` or the local calendar date.
pub fn today(m: &ArgMatches) -> Result<NaiveDate> {
    match m.get_one::<String>("as-of") {
        Some(s) => parse_date(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

/// Parses an optional reference argument where the literal `none` clears it.
pub(crate) fn reference_patch(m: &ArgMatches, name: &str) -> Result<Option<Option<i64>>> {
    match m.get_one::<String>(name).map(|s| s.trim()) {
        None => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("none") => Ok(Some(None)),
        Some(s) => Ok(Some(Some(crate::utils::parse_id(s)?))),
    }
}
