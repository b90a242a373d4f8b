// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for data store declarations.

use crate::datastore::Durability;
use crate::errors::StoreError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A store entry was declared.
///
/// # Log Level
/// `debug!` - Happens once per entry and module during initialize
pub struct EntryDeclared<'a> {
    pub name: &'a str,
    pub durability: Durability,
    pub type_name: &'a str,
    pub array: bool,
    pub module: Option<&'a str>,
}

impl Display for EntryDeclared<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let shape = if self.array { "array" } else { "object" };
        write!(
            f,
            "Declared {} {} '{}' of {} by {}",
            self.durability,
            shape,
            self.name,
            self.type_name,
            self.module.unwrap_or("the framework")
        )
    }
}

impl StructuredLog for EntryDeclared<'_> {
    fn log(&self) {
        tracing::debug!(
            entry = self.name,
            durability = %self.durability,
            type_name = self.type_name,
            array = self.array,
            module = self.module.unwrap_or(""),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "store_declaration",
            span_name = name,
            entry = self.name,
            durability = %self.durability,
        )
    }
}

/// A declaration clashed with an existing one.
///
/// # Log Level
/// `warn!` - The module's initialize will fail with this error
pub struct DeclarationRejected<'a> {
    pub name: &'a str,
    pub module: Option<&'a str>,
    pub error: &'a StoreError,
}

impl Display for DeclarationRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Declaration of '{}' by {} rejected: {}",
            self.name,
            self.module.unwrap_or("the framework"),
            self.error
        )
    }
}

impl StructuredLog for DeclarationRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            entry = self.name,
            module = self.module.unwrap_or(""),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "store_declaration",
            span_name = name,
            entry = self.name,
        )
    }
}

/// A relation between two arrays was declared.
///
/// # Log Level
/// `debug!` - Happens once per relation during initialize
pub struct RelationDeclared<'a> {
    pub name: &'a str,
    pub durability: Durability,
    pub module: Option<&'a str>,
}

impl Display for RelationDeclared<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Declared {} relation '{}' by {}",
            self.durability,
            self.name,
            self.module.unwrap_or("the framework")
        )
    }
}

impl StructuredLog for RelationDeclared<'_> {
    fn log(&self) {
        tracing::debug!(
            relation = self.name,
            durability = %self.durability,
            module = self.module.unwrap_or(""),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("store_relation", span_name = name, relation = self.name)
    }
}
