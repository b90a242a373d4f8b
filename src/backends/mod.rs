// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod builtin;
#[cfg(test)]
pub mod testing;

pub use builtin::providers;
