// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Schema catalog: loads JSON documents and indexes what they declare.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::schema::interface::InterfaceMethod;
use crate::schema::library::Library;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Document-level load failures. Field-level schema problems never surface
/// here; they degrade to placeholders and set the owning library's error
/// flag instead.
#[derive(Debug)]
pub enum LoadError {
    /// A schema file could not be read.
    Io(String),
    /// A document is not valid JSON.
    Parse(String),
    /// A document has no top-level library name.
    MissingName,
    /// `decode_all` found degraded declarations; lists the affected
    /// libraries.
    Schema(Vec<String>),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(msg) => write!(f, "I/O error: {}", msg),
            LoadError::Parse(msg) => write!(f, "invalid schema document: {}", msg),
            LoadError::MissingName => write!(f, "schema document has no library name"),
            LoadError::Schema(names) => {
                write!(f, "schema errors in: {}", names.join(", "))
            }
        }
    }
}

impl Error for LoadError {}

// ---------------------------------------------------------------------------
// LibraryLoader
// ---------------------------------------------------------------------------

/// Catalog of loaded schema libraries.
///
/// Indexes libraries by name and methods by transaction ordinal. Loading is
/// cheap (declarations stay shallow); member types resolve on first use or
/// all at once through [`LibraryLoader::decode_all`].
#[derive(Default)]
pub struct LibraryLoader {
    libraries: HashMap<String, Arc<Library>>,
    ordinal_index: HashMap<u64, Vec<Arc<InterfaceMethod>>>,
}

impl LibraryLoader {
    pub fn new() -> LibraryLoader {
        LibraryLoader::default()
    }

    /// Read and register schema documents. Files are loaded in reverse list
    /// order: under last-wins replacement the first-listed document ends up
    /// authoritative for its library name.
    pub fn load_paths(&mut self, paths: &[PathBuf]) -> Result<(), LoadError> {
        for path in paths.iter().rev() {
            let content = fs::read_to_string(path)
                .map_err(|err| LoadError::Io(format!("{}: {}", path.display(), err)))?;
            self.add_content(&content)?;
        }
        Ok(())
    }

    /// Parse one schema document and register its library. A library name
    /// seen before is replaced wholesale.
    pub fn add_content(&mut self, content: &str) -> Result<(), LoadError> {
        let document: Json = serde_json::from_str(content).map_err(|err| LoadError::Parse(err.to_string()))?;
        let library = Library::new(&document)?;
        let name = library.name().to_string();
        if self.libraries.insert(name.clone(), Arc::new(library)).is_some() {
            log::warn!("library {} loaded twice, replacing the previous definition", name);
        }
        log::debug!("loaded library {}", name);
        self.rebuild_ordinal_index();
        Ok(())
    }

    fn rebuild_ordinal_index(&mut self) {
        self.ordinal_index.clear();
        for library in self.libraries.values() {
            for interface in library.interfaces() {
                for method in interface.methods() {
                    self.ordinal_index
                        .entry(method.ordinal())
                        .or_default()
                        .push(method.clone());
                }
            }
        }
        // Composed copies of a method share its ordinal; concrete
        // declarations sort first so `get_by_ordinal(..).first()` lands on
        // the defining protocol.
        for methods in self.ordinal_index.values_mut() {
            methods.sort_by_key(|method| method.is_composed());
        }
    }

    pub fn get_library_from_name(&self, name: &str) -> Option<&Arc<Library>> {
        self.libraries.get(name)
    }

    /// Loaded libraries in name order.
    pub fn libraries(&self) -> Vec<&Arc<Library>> {
        let mut libraries: Vec<&Arc<Library>> = self.libraries.values().collect();
        libraries.sort_by(|a, b| a.name().cmp(b.name()));
        libraries
    }

    /// Every method registered under `ordinal`, concrete declarations first.
    pub fn get_by_ordinal(&self, ordinal: u64) -> &[Arc<InterfaceMethod>] {
        self.ordinal_index
            .get(&ordinal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Force member resolution everywhere. Call this once after loading when
    /// the catalog is shared across threads; afterwards all lookups are
    /// read-only.
    pub fn decode_all(&self) -> Result<(), LoadError> {
        for library in self.libraries.values() {
            library.decode_all(self);
        }
        let mut degraded: Vec<String> = self
            .libraries
            .values()
            .filter(|library| library.has_errors())
            .map(|library| library.name().to_string())
            .collect();
        if degraded.is_empty() {
            Ok(())
        } else {
            degraded.sort();
            Err(LoadError::Schema(degraded))
        }
    }
}
