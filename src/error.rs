// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

use crate::permissions::{Operation, Resource, Role};

/// Result alias for library operations.
pub type QuantumResult<T> = Result<T, QuantumError>;

/// Errors surfaced by the store, the engines and the permission layer.
#[derive(Debug, Error)]
pub enum QuantumError {
    /// The entity does not exist, or exists outside the caller's portfolios.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("role {role} may not {operation} {resource}")]
    Forbidden {
        role: Role,
        resource: Resource,
        operation: Operation,
    },

    #[error("invalid input: {0}")]
    Validation(String),

    /// A row the computation depends on disappeared between queries.
    #[error("data integrity violated: {0}")]
    IntegrityViolation(String),

    #[error("category {category} cannot be moved under {parent}: it would become its own ancestor")]
    CategoryCycle { category: i64, parent: i64 },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl QuantumError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
