// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic the engine emits is a message struct with a `Display`
//! implementation and a [`StructuredLog`](messages::StructuredLog) implementation
//! that attaches the message's fields to the `tracing` event. Call sites never
//! format log strings themselves.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - job, context, run and shutdown events
//! * `messages::module` - module registration and callback outcomes
//! * `messages::store` - data store declarations
//! * `messages::validation` - steering file validation
//!
//! # Usage
//!
//! ```rust
//! use the_pathway::observability::messages::{engine::DrainRequested, StructuredLog};
//!
//! DrainRequested { reason: "interrupt" }.log();
//! ```

pub mod messages;
