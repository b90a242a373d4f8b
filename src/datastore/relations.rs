// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Weighted relations between elements of two store arrays.
//!
//! A relation array is keyed by its `(from, to)` entry pair and carries a name that
//! follows the `<from>To<to>` convention. Its durability is the shorter-lived of its
//! endpoints, so event relations are dropped together with event entries.

use crate::datastore::{Durability, EntryId};
use std::collections::HashMap;

/// Which end of a relation a query starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSide {
    From,
    To,
    Both,
}

/// Identifies a declared relation array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId(pub(crate) usize);

/// One directed edge between two array elements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationEdge {
    pub from: EntryId,
    pub from_index: usize,
    pub to: EntryId,
    pub to_index: usize,
    pub weight: f64,
}

impl RelationEdge {
    /// Negative weights mark provisional or reassigned edges.
    pub fn is_provisional(&self) -> bool {
        self.weight < 0.0
    }
}

/// Default relation name for two array entries.
pub fn relation_name(from: &str, to: &str) -> String {
    format!("{}To{}", from, to)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RelationElement {
    pub from_index: usize,
    pub to_index: usize,
    pub weight: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct RelationArray {
    pub name: String,
    pub from: EntryId,
    pub to: EntryId,
    pub durability: Durability,
    pub transient: bool,
    pub elements: Vec<RelationElement>,
}

impl RelationArray {
    fn edge(&self, element: &RelationElement) -> RelationEdge {
        RelationEdge {
            from: self.from,
            from_index: element.from_index,
            to: self.to,
            to_index: element.to_index,
            weight: element.weight,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RelationTable {
    arrays: Vec<RelationArray>,
    by_endpoints: HashMap<(EntryId, EntryId), RelationId>,
    by_name: HashMap<String, RelationId>,
}

impl RelationTable {
    /// Returns the existing id when the pair is already declared; `None` when the
    /// name is taken by a different pair.
    pub fn declare(
        &mut self,
        name: String,
        from: EntryId,
        to: EntryId,
        durability: Durability,
        transient: bool,
    ) -> Option<RelationId> {
        if let Some(&id) = self.by_endpoints.get(&(from, to)) {
            return Some(id);
        }
        if self.by_name.contains_key(&name) {
            return None;
        }
        let id = RelationId(self.arrays.len());
        self.by_endpoints.insert((from, to), id);
        self.by_name.insert(name.clone(), id);
        self.arrays.push(RelationArray {
            name,
            from,
            to,
            durability,
            transient,
            elements: Vec::new(),
        });
        Some(id)
    }

    pub fn find(&self, from: EntryId, to: EntryId) -> Option<RelationId> {
        self.by_endpoints.get(&(from, to)).copied()
    }

    pub fn find_by_name(&self, name: &str) -> Option<RelationId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: RelationId) -> Option<&RelationArray> {
        self.arrays.get(id.0)
    }

    pub fn get_mut(&mut self, id: RelationId) -> Option<&mut RelationArray> {
        self.arrays.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelationArray> {
        self.arrays.iter()
    }

    pub fn edges(&self, entry: EntryId, index: usize, side: RelationSide) -> Vec<RelationEdge> {
        let mut edges = Vec::new();
        for array in &self.arrays {
            let from_side = matches!(side, RelationSide::From | RelationSide::Both) && array.from == entry;
            let to_side = matches!(side, RelationSide::To | RelationSide::Both) && array.to == entry;
            if !from_side && !to_side {
                continue;
            }
            for element in &array.elements {
                if (from_side && element.from_index == index) || (to_side && element.to_index == index) {
                    edges.push(array.edge(element));
                }
            }
        }
        edges
    }

    /// Merges elements with identical endpoints, summing their weights. Returns how
    /// many elements were folded away.
    pub fn consolidate(&mut self, id: RelationId) -> usize {
        let Some(array) = self.arrays.get_mut(id.0) else {
            return 0;
        };
        let before = array.elements.len();
        let mut merged: Vec<RelationElement> = Vec::with_capacity(before);
        let mut positions: HashMap<(usize, usize), usize> = HashMap::new();
        for element in array.elements.drain(..) {
            match positions.get(&(element.from_index, element.to_index)) {
                Some(&position) => merged[position].weight += element.weight,
                None => {
                    positions.insert((element.from_index, element.to_index), merged.len());
                    merged.push(element);
                }
            }
        }
        array.elements = merged;
        before - array.elements.len()
    }

    pub fn clear(&mut self, durability: Durability) {
        for array in self.arrays.iter_mut().filter(|a| a.durability == durability) {
            array.elements.clear();
        }
    }

    pub fn clear_all(&mut self) {
        for array in &mut self.arrays {
            array.elements.clear();
        }
    }
}
