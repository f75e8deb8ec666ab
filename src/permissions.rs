// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Role checks run by command handlers before any store or engine call.
//! Tenancy is a separate concern: store queries only ever see rows reachable
//! through the caller's portfolio memberships.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{QuantumError, QuantumResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperUser,
    Administrator,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperUser => "super_user",
            Role::Administrator => "administrator",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = QuantumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "super_user" | "superuser" => Ok(Role::SuperUser),
            "administrator" | "admin" => Ok(Role::Administrator),
            "user" => Ok(Role::User),
            other => Err(QuantumError::validation(format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    User,
    Portfolio,
    Membership,
    Account,
    Category,
    Payee,
    TransactionType,
    Transaction,
    ScheduledTransaction,
    RepeatOption,
    Budget,
    Summary,
    Setting,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resource::User => "users",
            Resource::Portfolio => "portfolios",
            Resource::Membership => "portfolio memberships",
            Resource::Account => "accounts",
            Resource::Category => "categories",
            Resource::Payee => "payees",
            Resource::TransactionType => "transaction types",
            Resource::Transaction => "transactions",
            Resource::ScheduledTransaction => "scheduled transactions",
            Resource::RepeatOption => "repeat options",
            Resource::Budget => "budgets",
            Resource::Summary => "transaction summaries",
            Resource::Setting => "settings",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(s)
    }
}

const ANYONE: &[Role] = &[Role::SuperUser, Role::Administrator, Role::User];
const ADMINS: &[Role] = &[Role::SuperUser, Role::Administrator];
const SUPER: &[Role] = &[Role::SuperUser];

pub fn required_roles(resource: Resource, operation: Operation) -> &'static [Role] {
    use Operation::*;
    use Resource::*;

    match (resource, operation) {
        (_, Read) => ANYONE,
        (User, _) | (Setting, _) => ADMINS,
        (Portfolio, Delete) => ADMINS,
        (RepeatOption, _) => SUPER,
        _ => ANYONE,
    }
}

/// The authenticated user on whose behalf a command runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl Caller {
    pub fn authorize(&self, resource: Resource, operation: Operation) -> QuantumResult<()> {
        authorize(self.role, resource, operation)
    }
}

pub fn authorize(role: Role, resource: Resource, operation: Operation) -> QuantumResult<()> {
    if required_roles(resource, operation).contains(&role) {
        Ok(())
    } else {
        tracing::warn!(%role, %resource, %operation, "operation rejected");
        Err(QuantumError::Forbidden {
            role,
            resource,
            operation,
        })
    }
}
