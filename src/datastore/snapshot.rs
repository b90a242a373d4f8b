// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Serialized form of one event as it travels between execution contexts.
//!
//! A snapshot holds the event metadata plus every non-transient event-durability
//! entry and relation. Entries the receiving context never declared are kept as
//! opaque JSON and forwarded unchanged with the next snapshot.

use crate::datastore::{Durability, EventMetaData};
use crate::errors::StoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub metadata: Option<EventMetaData>,
    pub entries: Vec<SnapshotEntry>,
    pub relations: Vec<SnapshotRelation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub name: String,
    pub array: bool,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRelation {
    pub name: String,
    pub from: String,
    pub from_durability: Durability,
    pub to: String,
    pub to_durability: Durability,
    /// `(from_index, to_index, weight)`
    pub elements: Vec<(usize, usize, f64)>,
}

impl EventSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(self).map_err(|e| StoreError::Serialization {
            name: "event".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization {
            name: "event".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn entry(&self, name: &str) -> Option<&SnapshotEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}
