// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // built-in and test modules
pub mod config;     // steering files + runtime builder
pub mod datastore;  // per-context event store
pub mod engine;     // single and parallel executors
pub mod errors;     // error handling
pub mod module;     // module instances, params, conditions
pub mod observability;
pub mod path;       // module paths
pub mod registry;   // module types by name
pub mod traits;     // unified abstractions
