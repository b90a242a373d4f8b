// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by the [`DataStore`](crate::datastore::DataStore).
//!
//! `Undeclared` and `Conflict` are programming errors and surface as configuration
//! failures when they happen during initialize. An entry that is declared but not
//! created is not an error at all: accessors report it as `Ok(None)`.

use crate::datastore::Durability;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("'{name}' ({durability}) was never declared")]
    Undeclared { name: String, durability: Durability },

    #[error("'{name}' ({durability}) is declared as {existing}, cannot redeclare it as {requested}")]
    Conflict {
        name: String,
        durability: Durability,
        existing: String,
        requested: String,
    },

    #[error("'{name}' is not a valid entry name")]
    ReservedName { name: String },

    #[error("'{name}' cannot be declared after initialize")]
    DeclarationClosed { name: String },

    #[error("'{name}' was already created")]
    AlreadyExists { name: String },

    #[error("'{name}' has not been created")]
    NotCreated { name: String },

    #[error("event entry '{name}' can only be created while an event is processed")]
    OutsideEvent { name: String },

    #[error("'{name}' is not an array")]
    NotAnArray { name: String },

    #[error("'{name}' is an array, not a single object")]
    NotAnObject { name: String },

    #[error("'{name}' holds {expected}, accessed as {requested}")]
    TypeMismatch {
        name: String,
        expected: String,
        requested: String,
    },

    #[error("relation '{name}' was never declared")]
    UndeclaredRelation { name: String },

    #[error("relation '{name}' already connects different arrays")]
    RelationConflict { name: String },

    #[error("relation endpoint {name}[{index}] does not exist")]
    DanglingEndpoint { name: String, index: usize },

    #[error("cannot serialize '{name}': {reason}")]
    Serialization { name: String, reason: String },

    #[error("unknown store entry #{0}")]
    UnknownEntry(usize),
}
