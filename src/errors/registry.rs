// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ParamError;
use thiserror::Error;

/// Errors raised while registering, creating or replicating modules.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("module type '{type_name}' is registered twice")]
    DuplicateType { type_name: String },

    #[error("unknown module type '{type_name}'")]
    UnknownType { type_name: String },

    #[error("module type '{type_name}' declares invalid parameters: {source}")]
    Declaration {
        type_name: String,
        #[source]
        source: ParamError,
    },

    #[error("module '{instance}': {source}")]
    Parameter {
        instance: String,
        #[source]
        source: ParamError,
    },

    #[error("module '{instance}' of type '{type_name}' was not created through the registry and cannot be replicated")]
    NotReplicable { instance: String, type_name: String },
}
