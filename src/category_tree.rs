// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Categories of one portfolio held in an id-keyed arena. Parents are plain
//! ids, never owning links, and a re-parent that would close a loop is
//! rejected.

use std::collections::{BTreeMap, HashSet};

use crate::error::{QuantumError, QuantumResult};
use crate::models::Category;

#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: BTreeMap<i64, Category>,
}

impl CategoryTree {
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        Self {
            nodes: categories.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn get(&self, id: i64) -> Option<&Category> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parent chain of `id`, nearest first. Stops at a repeated id so rows
    /// that already loop cannot hang the walk.
    pub fn ancestors(&self, id: i64) -> Vec<i64> {
        let mut seen = HashSet::from([id]);
        let mut chain = Vec::new();
        let mut cursor = self.nodes.get(&id).and_then(|c| c.parent_category_id);
        while let Some(parent) = cursor {
            if !seen.insert(parent) {
                break;
            }
            chain.push(parent);
            cursor = self.nodes.get(&parent).and_then(|c| c.parent_category_id);
        }
        chain
    }

    pub fn would_create_cycle(&self, category: i64, new_parent: i64) -> bool {
        category == new_parent || self.ancestors(new_parent).contains(&category)
    }

    /// Validates a re-parent. `None` detaches the category to the top level.
    pub fn check_parent(&self, category: i64, new_parent: Option<i64>) -> QuantumResult<()> {
        if !self.nodes.contains_key(&category) {
            return Err(QuantumError::NotFound("category"));
        }
        let Some(parent) = new_parent else {
            return Ok(());
        };
        if !self.nodes.contains_key(&parent) {
            return Err(QuantumError::NotFound("parent category"));
        }
        if self.would_create_cycle(category, parent) {
            return Err(QuantumError::CategoryCycle { category, parent });
        }
        Ok(())
    }

    pub fn children(&self, id: i64) -> Vec<&Category> {
        let mut kids: Vec<&Category> = self
            .nodes
            .values()
            .filter(|c| c.parent_category_id == Some(id) && c.id != id)
            .collect();
        kids.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        kids
    }

    /// Categories with no parent, or whose parent is not in this tree.
    pub fn roots(&self) -> Vec<&Category> {
        let mut roots: Vec<&Category> = self
            .nodes
            .values()
            .filter(|c| match c.parent_category_id {
                None => true,
                Some(p) => !self.nodes.contains_key(&p),
            })
            .collect();
        roots.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        roots
    }

    /// Depth-first listing as (depth, category), roots first.
    pub fn walk(&self) -> Vec<(usize, &Category)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        let mut stack: Vec<(usize, &Category)> =
            self.roots().into_iter().rev().map(|c| (0, c)).collect();
        while let Some((depth, node)) = stack.pop() {
            if !visited.insert(node.id) {
                continue;
            }
            out.push((depth, node));
            for child in self.children(node.id).into_iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}
