// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod module;
mod path;
mod registry;
mod ring_buffer;
mod store;

pub use config::ValidationError;
pub use execution::{EventLabel, ExecutionError, ExitStatus};
pub use module::{FailureKind, ModuleError, ModuleResult, ParamError};
pub use path::PathError;
pub use registry::RegistryError;
pub use ring_buffer::RingBufferError;
pub use store::StoreError;
