// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Schema catalog
//!
//! This module turns JSON schema documents emitted by the interface compiler
//! into an in-memory catalog:
//! - Loader: reads documents, indexes libraries by name and methods by ordinal
//! - Library: one document's declarations (structs, tables, unions, enums, ...)
//! - Interface: protocol declarations with per-method request/response payloads
//!
//! Declarations are parsed shallowly at load time; member types resolve on
//! first use so mutually recursive declarations work without a separate
//! dependency pass.

pub mod interface;
pub mod library;
pub mod loader;

pub use interface::{Interface, InterfaceMethod};
pub use library::Library;
pub use loader::{LibraryLoader, LoadError};
