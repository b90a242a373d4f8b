// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Data Store
//!
//! Every execution context owns exactly one [`DataStore`]: the registry of named,
//! typed entries that modules use to exchange data. An entry is identified by
//! `(name, durability)`:
//!
//! - **event** entries are cleared at every event boundary
//! - **persistent** entries live until the context terminates
//!
//! Entries must be declared during `initialize`. After that, a module may only
//! create and fill what was declared. Array entries can be linked with weighted
//! relations; see [`relations`].
//!
//! ## Moving events between contexts
//!
//! In parallel mode an event crosses context boundaries as an [`EventSnapshot`]:
//!
//! ```text
//! input ctx                 worker ctx                   output ctx
//! snapshot_event() ──bytes──▶ restore_event()
//!                            ... modules run ...
//!                            snapshot_event() ──bytes──▶ restore_event()
//! ```
//!
//! Transient entries never leave their context. Entries the receiving context did
//! not declare are carried along untouched.

mod handles;
mod metadata;
pub mod relations;
mod snapshot;
mod store;

pub use handles::{StoreArray, StoreObjPtr};
pub use metadata::{EventMetaData, RunKey, EVENT_METADATA};
pub use relations::{relation_name, RelationEdge, RelationId, RelationSide};
pub use snapshot::{EventSnapshot, SnapshotEntry, SnapshotRelation};
pub use store::{
    DataStore, Durability, EntryId, EntryInfo, StoreObject, StorePhase, RESERVED_NAME,
};
