// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! # weft - schema-driven IPC wire-format decoding
//!
//! Decodes raw IPC messages (byte buffer plus handle table) into structured
//! values using type information loaded at runtime from JSON schema documents,
//! with no generated bindings involved. Built for observability tools that
//! must make sense of traffic for interfaces they have never been compiled
//! against.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use weft::{LibraryLoader, MessageDecoder, MessageHeader};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut loader = LibraryLoader::new();
//!     loader.add_content(&std::fs::read_to_string("echo.weft.json")?)?;
//!     loader.decode_all()?;
//!
//!     let bytes: Vec<u8> = capture_message();
//!     let header = MessageHeader::parse(&bytes)?;
//!     let method = loader
//!         .get_by_ordinal(header.ordinal)
//!         .first()
//!         .ok_or("unknown ordinal")?
//!         .clone();
//!
//!     if let Some(request) = method.request(&loader) {
//!         let mut decoder = MessageDecoder::new(&bytes[16..], &[]);
//!         let value = decoder.decode_message(request);
//!         println!(
//!             "{} = {}",
//!             method.fully_qualified_name(),
//!             weft::pretty_print(&value, &weft::NO_COLORS, 100)
//!         );
//!     }
//!     Ok(())
//! }
//! # fn capture_message() -> Vec<u8> { Vec::new() }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! schema documents (JSON)
//!        |
//!        v
//!   LibraryLoader -> Library -> declarations (lazy member resolution)
//!        |                          |
//!        v                          v
//!   ordinal index              Type descriptors
//!                                   |
//! message bytes + handles           v
//!        +----------------> MessageDecoder -> Value tree + diagnostics
//!                                                  |
//!                                    +-------------+------------+
//!                                    v                          v
//!                              PrettyPrinter              JSON exporter
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`LibraryLoader`] | Catalog of schema libraries, indexed by name and method ordinal |
//! | [`Type`] | Runtime type descriptor driving the decode of one value |
//! | [`MessageDecoder`] | Cursor over one message; collects diagnostics instead of failing |
//! | [`Value`] | Decoded output tree, traversed through the [`Visitor`] trait |
//!
//! Decoding is total: malformed input yields a partial [`Value`] tree plus
//! human-readable diagnostics, never a panic or an early exit.

pub mod header;
pub mod schema;
pub mod wire;

pub use header::{Direction, HeaderError, MessageHeader, HEADER_SIZE, MAGIC_CURRENT};
pub use schema::interface::{Interface, InterfaceMethod};
pub use schema::library::Library;
pub use schema::loader::{LibraryLoader, LoadError};
pub use wire::decoder::{HandleInfo, MessageDecoder};
pub use wire::export::export;
pub use wire::printer::{pretty_print, Colors, PrettyPrinter, DEFAULT_LINE_WIDTH, NO_COLORS, WITH_COLORS};
pub use wire::types::{Primitive, Type};
pub use wire::value::{ObjectValue, TableValue, UnionValue, Value, Visitor};
