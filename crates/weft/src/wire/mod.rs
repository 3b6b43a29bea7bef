// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Wire-format decoding
//!
//! This module turns a captured message (byte buffer plus handle table) into
//! a structured value:
//! - Types: runtime descriptors built from schema declarations
//! - Decoder: bounds-checked cursor collecting diagnostics instead of failing
//! - Value: the decoded tree, traversed through a visitor trait
//! - Printer/Export: human-readable and JSON renderings of a value

pub mod decoder;
pub mod export;
pub mod printer;
pub mod types;
pub mod value;

#[cfg(test)]
mod tests;
