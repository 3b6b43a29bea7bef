// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! One schema library: the declarations parsed from a single JSON document.
//!
//! Declarations are created shallowly when the document is loaded (name and
//! layout sizes only); member types resolve on first use through
//! `decode_types`, which lets mutually recursive declarations terminate
//! without a separate dependency-ordering pass.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use serde_json::Value as Json;

use crate::schema::interface::Interface;
use crate::schema::loader::{LibraryLoader, LoadError};
use crate::wire::types::{Primitive, Type};

// ---------------------------------------------------------------------------
// Lazy member resolution
// ---------------------------------------------------------------------------

const UNRESOLVED: u8 = 0;
const RESOLVING: u8 = 1;
const RESOLVED: u8 = 2;

/// Resolve-once slot guarding a declaration's member list.
///
/// Resolving a member type can reach back into the declaration it started
/// from (mutually recursive structs, self-referential unions). The explicit
/// resolving state turns that re-entry into a no-op: the inner call sees
/// `RESOLVING` and returns, the outermost call stores the members and flips
/// the state to `RESOLVED`. Until then `get` reports nothing.
pub(crate) struct DecodeOnce<T> {
    state: AtomicU8,
    slot: OnceLock<T>,
}

impl<T> DecodeOnce<T> {
    pub(crate) fn new() -> DecodeOnce<T> {
        DecodeOnce {
            state: AtomicU8::new(UNRESOLVED),
            slot: OnceLock::new(),
        }
    }

    /// Run `build` exactly once; concurrent or re-entrant calls return
    /// without building.
    pub(crate) fn resolve(&self, build: impl FnOnce() -> T) {
        if self
            .state
            .compare_exchange(UNRESOLVED, RESOLVING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let value = build();
        let _ = self.slot.set(value);
        self.state.store(RESOLVED, Ordering::Release);
    }

    pub(crate) fn get(&self) -> Option<&T> {
        self.slot.get()
    }
}

/// Error flag shared by a library and every declaration parsed from it.
///
/// Field-level schema problems degrade to placeholders instead of aborting
/// the load; the flag records that the library is not pristine so
/// `LibraryLoader::decode_all` can report it.
#[derive(Default)]
pub(crate) struct ErrorFlag(AtomicBool);

impl ErrorFlag {
    pub(crate) fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub(crate) fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// JSON field access
// ---------------------------------------------------------------------------

/// Numeric schema fields are decimal token strings ("16"); plain unsigned
/// JSON integers from older compiler output are accepted as well.
pub(crate) fn token_u64(json: &Json) -> Option<u64> {
    match json {
        Json::String(text) => text.parse().ok(),
        Json::Number(number) => number.as_u64(),
        _ => None,
    }
}

/// Signed variant of [`token_u64`]: (absolute value, negative).
pub(crate) fn token_integer(json: &Json) -> Option<(u64, bool)> {
    match json {
        Json::String(text) => match text.strip_prefix('-') {
            Some(rest) => rest.parse().ok().map(|value| (value, true)),
            None => text.parse().ok().map(|value| (value, false)),
        },
        Json::Number(number) => {
            if let Some(value) = number.as_u64() {
                Some((value, false))
            } else {
                number.as_i64().map(|value| (value.unsigned_abs(), value < 0))
            }
        }
        _ => None,
    }
}

pub(crate) fn field_str<'a>(json: &'a Json, ctx: &str, key: &str, errors: &ErrorFlag) -> Option<&'a str> {
    match json.get(key).and_then(Json::as_str) {
        Some(text) => Some(text),
        None => {
            log::warn!("{}: missing or non-string field '{}'", ctx, key);
            errors.set();
            None
        }
    }
}

pub(crate) fn field_u64(json: &Json, ctx: &str, key: &str, errors: &ErrorFlag) -> Option<u64> {
    match json.get(key).and_then(token_u64) {
        Some(value) => Some(value),
        None => {
            log::warn!("{}: missing or non-numeric field '{}'", ctx, key);
            errors.set();
            None
        }
    }
}

pub(crate) fn field_array<'a>(json: &'a Json, ctx: &str, key: &str, errors: &ErrorFlag) -> Option<&'a Vec<Json>> {
    match json.get(key).and_then(Json::as_array) {
        Some(array) => Some(array),
        None => {
            log::warn!("{}: missing or non-array field '{}'", ctx, key);
            errors.set();
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Struct declarations
// ---------------------------------------------------------------------------

pub struct StructMember {
    name: String,
    ty: Type,
    offset: u64,
}

impl StructMember {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Byte offset within the struct's inline block.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// A struct declaration: fixed-layout record with per-member offsets.
pub struct StructDecl {
    name: String,
    size: u64,
    members_json: Vec<Json>,
    members: DecodeOnce<Vec<StructMember>>,
    errors: Arc<ErrorFlag>,
}

impl StructDecl {
    pub(crate) fn new(json: &Json, errors: &Arc<ErrorFlag>) -> Option<Arc<StructDecl>> {
        let name = field_str(json, "struct", "name", errors)?.to_string();
        let ctx = format!("struct {}", name);
        let size = field_u64(json, &ctx, "size", errors)?;
        let members_json = field_array(json, &ctx, "members", errors)?.clone();
        Some(Arc::new(StructDecl {
            name,
            size,
            members_json,
            members: DecodeOnce::new(),
            errors: errors.clone(),
        }))
    }

    /// Anonymous payload struct for a method request or response. Member
    /// objects carry the same shape as named struct members.
    pub(crate) fn anonymous(name: String, size: u64, members_json: Vec<Json>, errors: &Arc<ErrorFlag>) -> Arc<StructDecl> {
        Arc::new(StructDecl {
            name,
            size,
            members_json,
            members: DecodeOnce::new(),
            errors: errors.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared inline size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Members in declaration order; empty until `decode_types` has run.
    pub fn members(&self) -> &[StructMember] {
        self.members.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn decode_types(&self, loader: &LibraryLoader) {
        self.members.resolve(|| {
            let mut members = Vec::with_capacity(self.members_json.len());
            for member in &self.members_json {
                let ctx = format!("struct {} member", self.name);
                let Some(name) = field_str(member, &ctx, "name", &self.errors) else {
                    continue;
                };
                let ctx = format!("struct {}.{}", self.name, name);
                let Some(offset) = field_u64(member, &ctx, "offset", &self.errors) else {
                    continue;
                };
                let size = field_u64(member, &ctx, "size", &self.errors).unwrap_or(0);
                let ty = member_type(loader, member, &ctx, size, &self.errors);
                members.push(StructMember {
                    name: name.to_string(),
                    ty,
                    offset,
                });
            }
            members
        });
    }
}

/// Parse a member's `type` field, falling back to an opaque blob of `size`
/// bytes when it is missing or unresolvable.
fn member_type(loader: &LibraryLoader, member: &Json, ctx: &str, size: u64, errors: &ErrorFlag) -> Type {
    match member.get("type") {
        Some(type_ref) => Type::from_json(loader, type_ref, size, errors),
        None => {
            log::warn!("{}: missing field 'type'", ctx);
            errors.set();
            Type::Raw { inline_size: size }
        }
    }
}

// ---------------------------------------------------------------------------
// Table declarations
// ---------------------------------------------------------------------------

pub struct TableMember {
    ordinal: u64,
    name: String,
    ty: Option<Type>,
}

impl TableMember {
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` marks a reserved ordinal: the slot exists but carries no type.
    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    pub fn reserved(&self) -> bool {
        self.ty.is_none()
    }
}

/// A table declaration: sparse, ordinal-addressed, forward-compatible record.
pub struct TableDecl {
    name: String,
    size: u64,
    members_json: Vec<Json>,
    members: DecodeOnce<Vec<TableMember>>,
    errors: Arc<ErrorFlag>,
}

impl TableDecl {
    pub(crate) fn new(json: &Json, errors: &Arc<ErrorFlag>) -> Option<Arc<TableDecl>> {
        let name = field_str(json, "table", "name", errors)?.to_string();
        let ctx = format!("table {}", name);
        let size = field_u64(json, &ctx, "size", errors)?;
        let members_json = field_array(json, &ctx, "members", errors)?.clone();
        Some(Arc::new(TableDecl {
            name,
            size,
            members_json,
            members: DecodeOnce::new(),
            errors: errors.clone(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn members(&self) -> &[TableMember] {
        self.members.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn member_from_ordinal(&self, ordinal: u64) -> Option<&TableMember> {
        self.members().iter().find(|member| member.ordinal == ordinal)
    }

    pub fn decode_types(&self, loader: &LibraryLoader) {
        self.members.resolve(|| {
            let mut members = Vec::with_capacity(self.members_json.len());
            for member in &self.members_json {
                let ctx = format!("table {} member", self.name);
                let Some(ordinal) = field_u64(member, &ctx, "ordinal", &self.errors) else {
                    continue;
                };
                if member.get("reserved").and_then(Json::as_bool).unwrap_or(false) {
                    members.push(TableMember {
                        ordinal,
                        name: String::new(),
                        ty: None,
                    });
                    continue;
                }
                let Some(name) = field_str(member, &ctx, "name", &self.errors) else {
                    continue;
                };
                let ctx = format!("table {}.{}", self.name, name);
                let size = field_u64(member, &ctx, "size", &self.errors).unwrap_or(0);
                let ty = member_type(loader, member, &ctx, size, &self.errors);
                members.push(TableMember {
                    ordinal,
                    name: name.to_string(),
                    ty: Some(ty),
                });
            }
            members
        });
    }
}

// ---------------------------------------------------------------------------
// Union declarations (tagged)
// ---------------------------------------------------------------------------

pub struct UnionMember {
    name: String,
    ty: Option<Type>,
    offset: u64,
}

impl UnionMember {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` marks a reserved tag slot.
    pub fn ty(&self) -> Option<&Type> {
        self.ty.as_ref()
    }

    /// Payload offset from the start of the union (past tag and padding).
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// A static union: u32 tag indexing a dense member list, fixed total size.
pub struct UnionDecl {
    name: String,
    size: u64,
    members_json: Vec<Json>,
    members: DecodeOnce<Vec<UnionMember>>,
    errors: Arc<ErrorFlag>,
}

impl UnionDecl {
    pub(crate) fn new(json: &Json, errors: &Arc<ErrorFlag>) -> Option<Arc<UnionDecl>> {
        let name = field_str(json, "union", "name", errors)?.to_string();
        let ctx = format!("union {}", name);
        let size = field_u64(json, &ctx, "size", errors)?;
        let members_json = field_array(json, &ctx, "members", errors)?.clone();
        Some(Arc::new(UnionDecl {
            name,
            size,
            members_json,
            members: DecodeOnce::new(),
            errors: errors.clone(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared total size, tag and padding included.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn members(&self) -> &[UnionMember] {
        self.members.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// The wire tag is the member's position in the declaration order,
    /// reserved slots included.
    pub fn member_with_tag(&self, tag: u32) -> Option<&UnionMember> {
        self.members().get(tag as usize)
    }

    pub fn decode_types(&self, loader: &LibraryLoader) {
        self.members.resolve(|| {
            let mut members = Vec::with_capacity(self.members_json.len());
            for member in &self.members_json {
                if member.get("reserved").and_then(Json::as_bool).unwrap_or(false) {
                    members.push(UnionMember {
                        name: String::new(),
                        ty: None,
                        offset: 0,
                    });
                    continue;
                }
                let ctx = format!("union {} member", self.name);
                let Some(name) = field_str(member, &ctx, "name", &self.errors) else {
                    continue;
                };
                let ctx = format!("union {}.{}", self.name, name);
                let Some(offset) = field_u64(member, &ctx, "offset", &self.errors) else {
                    continue;
                };
                let size = field_u64(member, &ctx, "size", &self.errors).unwrap_or(0);
                let ty = member_type(loader, member, &ctx, size, &self.errors);
                members.push(UnionMember {
                    name: name.to_string(),
                    ty: Some(ty),
                    offset,
                });
            }
            members
        });
    }
}

// ---------------------------------------------------------------------------
// Extensible union declarations
// ---------------------------------------------------------------------------

pub struct XUnionMember {
    ordinal: u64,
    name: String,
    ty: Type,
}

impl XUnionMember {
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }
}

/// An extensible union: sparse u64 ordinal selecting an envelope payload.
pub struct XUnionDecl {
    name: String,
    members_json: Vec<Json>,
    members: DecodeOnce<Vec<XUnionMember>>,
    errors: Arc<ErrorFlag>,
}

impl XUnionDecl {
    pub(crate) fn new(json: &Json, errors: &Arc<ErrorFlag>) -> Option<Arc<XUnionDecl>> {
        let name = field_str(json, "extensible union", "name", errors)?.to_string();
        let ctx = format!("extensible union {}", name);
        let members_json = field_array(json, &ctx, "members", errors)?.clone();
        Some(Arc::new(XUnionDecl {
            name,
            members_json,
            members: DecodeOnce::new(),
            errors: errors.clone(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[XUnionMember] {
        self.members.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn member_with_ordinal(&self, ordinal: u64) -> Option<&XUnionMember> {
        self.members().iter().find(|member| member.ordinal == ordinal)
    }

    pub fn decode_types(&self, loader: &LibraryLoader) {
        self.members.resolve(|| {
            let mut members = Vec::with_capacity(self.members_json.len());
            for member in &self.members_json {
                // Reserved ordinals have no wire representation; a message
                // carrying one is handled through the unknown-member path.
                if member.get("reserved").and_then(Json::as_bool).unwrap_or(false) {
                    continue;
                }
                let ctx = format!("extensible union {} member", self.name);
                let Some(ordinal) = field_u64(member, &ctx, "ordinal", &self.errors) else {
                    continue;
                };
                let Some(name) = field_str(member, &ctx, "name", &self.errors) else {
                    continue;
                };
                let ctx = format!("extensible union {}.{}", self.name, name);
                let size = field_u64(member, &ctx, "size", &self.errors).unwrap_or(0);
                let ty = member_type(loader, member, &ctx, size, &self.errors);
                members.push(XUnionMember {
                    ordinal,
                    name: name.to_string(),
                    ty,
                });
            }
            members
        });
    }
}

// ---------------------------------------------------------------------------
// Enum and bits declarations
// ---------------------------------------------------------------------------

pub struct EnumOrBitsMember {
    name: String,
    absolute_value: u64,
    negative: bool,
}

impl EnumOrBitsMember {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn absolute_value(&self) -> u64 {
        self.absolute_value
    }

    pub fn negative(&self) -> bool {
        self.negative
    }
}

fn enum_or_bits_members(kind: &str, name: &str, members_json: &[Json], errors: &ErrorFlag) -> Vec<EnumOrBitsMember> {
    let mut members = Vec::with_capacity(members_json.len());
    for member in members_json {
        let ctx = format!("{} {} member", kind, name);
        let Some(member_name) = field_str(member, &ctx, "name", errors) else {
            continue;
        };
        let ctx = format!("{} {}.{}", kind, name, member_name);
        let value = match member.get("value").and_then(token_integer) {
            Some(value) => value,
            None => {
                log::warn!("{}: missing or non-numeric field 'value'", ctx);
                errors.set();
                continue;
            }
        };
        members.push(EnumOrBitsMember {
            name: member_name.to_string(),
            absolute_value: value.0,
            negative: value.1,
        });
    }
    members
}

/// Parse an underlying scalar subtype, defaulting to u32 on any problem.
fn underlying_primitive(subtype: Option<&str>, ctx: &str, errors: &ErrorFlag) -> Primitive {
    match subtype {
        Some(subtype) => match Primitive::from_subtype(subtype) {
            Some(primitive) => primitive,
            None => {
                log::warn!("{}: unknown subtype '{}'", ctx, subtype);
                errors.set();
                Primitive::Uint32
            }
        },
        None => Primitive::Uint32,
    }
}

/// An enum declaration: named values over a fixed-width scalar.
pub struct EnumDecl {
    name: String,
    underlying: Primitive,
    members_json: Vec<Json>,
    members: DecodeOnce<Vec<EnumOrBitsMember>>,
    errors: Arc<ErrorFlag>,
}

impl EnumDecl {
    pub(crate) fn new(json: &Json, errors: &Arc<ErrorFlag>) -> Option<Arc<EnumDecl>> {
        let name = field_str(json, "enum", "name", errors)?.to_string();
        let ctx = format!("enum {}", name);
        // Legacy quirk: an enum's 'type' is the bare subtype string, not a
        // type object.
        let underlying = underlying_primitive(field_str(json, &ctx, "type", errors), &ctx, errors);
        let members_json = field_array(json, &ctx, "members", errors)?.clone();
        Some(Arc::new(EnumDecl {
            name,
            underlying,
            members_json,
            members: DecodeOnce::new(),
            errors: errors.clone(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn underlying(&self) -> Primitive {
        self.underlying
    }

    pub fn size(&self) -> u64 {
        self.underlying.inline_size()
    }

    pub fn members(&self) -> &[EnumOrBitsMember] {
        self.members.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Symbolic name for a decoded scalar, if it matches a declared member.
    pub fn name_of(&self, absolute_value: u64, negative: bool) -> Option<&str> {
        self.members()
            .iter()
            .find(|member| member.absolute_value == absolute_value && member.negative == negative)
            .map(|member| member.name.as_str())
    }

    pub fn decode_types(&self, _loader: &LibraryLoader) {
        self.members
            .resolve(|| enum_or_bits_members("enum", &self.name, &self.members_json, &self.errors));
    }
}

/// A bits declaration: named single-bit flags over an unsigned scalar.
pub struct BitsDecl {
    name: String,
    underlying: Primitive,
    members_json: Vec<Json>,
    members: DecodeOnce<Vec<EnumOrBitsMember>>,
    errors: Arc<ErrorFlag>,
}

impl BitsDecl {
    pub(crate) fn new(json: &Json, errors: &Arc<ErrorFlag>) -> Option<Arc<BitsDecl>> {
        let name = field_str(json, "bits", "name", errors)?.to_string();
        let ctx = format!("bits {}", name);
        let subtype = json
            .get("type")
            .and_then(|type_ref| type_ref.get("subtype"))
            .and_then(Json::as_str);
        if subtype.is_none() {
            log::warn!("{}: missing primitive 'type'", ctx);
            errors.set();
        }
        let underlying = underlying_primitive(subtype, &ctx, errors);
        let members_json = field_array(json, &ctx, "members", errors)?.clone();
        Some(Arc::new(BitsDecl {
            name,
            underlying,
            members_json,
            members: DecodeOnce::new(),
            errors: errors.clone(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn underlying(&self) -> Primitive {
        self.underlying
    }

    pub fn size(&self) -> u64 {
        self.underlying.inline_size()
    }

    pub fn members(&self) -> &[EnumOrBitsMember] {
        self.members.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pipe-joined member names covering every set bit, `"0"` for the empty
    /// set, `None` when bits remain that no declared member covers.
    pub fn name_of(&self, absolute_value: u64, negative: bool) -> Option<String> {
        if negative {
            return None;
        }
        if absolute_value == 0 {
            return Some(String::from("0"));
        }
        let mut names: Vec<&str> = Vec::new();
        let mut remaining = absolute_value;
        for member in self.members() {
            if member.negative || member.absolute_value == 0 {
                continue;
            }
            if absolute_value & member.absolute_value == member.absolute_value {
                names.push(&member.name);
                remaining &= !member.absolute_value;
            }
        }
        if remaining != 0 || names.is_empty() {
            return None;
        }
        Some(names.join("|"))
    }

    pub fn decode_types(&self, _loader: &LibraryLoader) {
        self.members
            .resolve(|| enum_or_bits_members("bits", &self.name, &self.members_json, &self.errors));
    }
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

/// All declarations from one schema document, keyed by fully qualified name
/// (`library/Decl`).
pub struct Library {
    name: String,
    structs: HashMap<String, Arc<StructDecl>>,
    tables: HashMap<String, Arc<TableDecl>>,
    unions: HashMap<String, Arc<UnionDecl>>,
    xunions: HashMap<String, Arc<XUnionDecl>>,
    enums: HashMap<String, Arc<EnumDecl>>,
    bits: HashMap<String, Arc<BitsDecl>>,
    interfaces: Vec<Arc<Interface>>,
    errors: Arc<ErrorFlag>,
}

impl Library {
    pub(crate) fn new(document: &Json) -> Result<Library, LoadError> {
        let name = document
            .get("name")
            .and_then(Json::as_str)
            .ok_or(LoadError::MissingName)?
            .to_string();
        let errors = Arc::new(ErrorFlag::default());
        let mut library = Library {
            name,
            structs: HashMap::new(),
            tables: HashMap::new(),
            unions: HashMap::new(),
            xunions: HashMap::new(),
            enums: HashMap::new(),
            bits: HashMap::new(),
            interfaces: Vec::new(),
            errors,
        };
        library.parse_declarations(document);
        Ok(library)
    }

    fn parse_declarations(&mut self, document: &Json) {
        for decl in decl_array(document, "struct_declarations") {
            if let Some(parsed) = StructDecl::new(decl, &self.errors) {
                self.structs.insert(parsed.name().to_string(), parsed);
            }
        }
        for decl in decl_array(document, "table_declarations") {
            if let Some(parsed) = TableDecl::new(decl, &self.errors) {
                self.tables.insert(parsed.name().to_string(), parsed);
            }
        }
        for decl in decl_array(document, "union_declarations") {
            if let Some(parsed) = UnionDecl::new(decl, &self.errors) {
                self.unions.insert(parsed.name().to_string(), parsed);
            }
        }
        for decl in decl_array(document, "xunion_declarations") {
            if let Some(parsed) = XUnionDecl::new(decl, &self.errors) {
                self.xunions.insert(parsed.name().to_string(), parsed);
            }
        }
        for decl in decl_array(document, "enum_declarations") {
            if let Some(parsed) = EnumDecl::new(decl, &self.errors) {
                self.enums.insert(parsed.name().to_string(), parsed);
            }
        }
        for decl in decl_array(document, "bits_declarations") {
            if let Some(parsed) = BitsDecl::new(decl, &self.errors) {
                self.bits.insert(parsed.name().to_string(), parsed);
            }
        }
        for decl in decl_array(document, "interface_declarations") {
            if let Some(parsed) = Interface::new(decl, &self.errors) {
                self.interfaces.push(Arc::new(parsed));
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if any declaration in this library degraded during parse or
    /// member resolution.
    pub fn has_errors(&self) -> bool {
        self.errors.get()
    }

    pub fn interfaces(&self) -> &[Arc<Interface>] {
        &self.interfaces
    }

    /// Direct struct lookup by fully qualified name. Members resolve through
    /// `decode_types` (or `LibraryLoader::decode_all`), not here.
    pub fn struct_from_name(&self, name: &str) -> Option<&Arc<StructDecl>> {
        self.structs.get(name)
    }

    /// Force member resolution for every declaration in this library.
    pub fn decode_all(&self, loader: &LibraryLoader) {
        for decl in self.structs.values() {
            decl.decode_types(loader);
        }
        for decl in self.tables.values() {
            decl.decode_types(loader);
        }
        for decl in self.unions.values() {
            decl.decode_types(loader);
        }
        for decl in self.xunions.values() {
            decl.decode_types(loader);
        }
        for decl in self.enums.values() {
            decl.decode_types(loader);
        }
        for decl in self.bits.values() {
            decl.decode_types(loader);
        }
        for interface in &self.interfaces {
            for method in interface.methods() {
                method.decode_types(loader);
            }
        }
    }

    /// Resolve a fully qualified identifier declared in this library into a
    /// type descriptor, triggering the target's own member resolution.
    pub fn type_from_identifier(&self, loader: &LibraryLoader, nullable: bool, identifier: &str, inline_size: u64) -> Type {
        if let Some(decl) = self.enums.get(identifier) {
            decl.decode_types(loader);
            return Type::Enum { decl: decl.clone() };
        }
        if let Some(decl) = self.bits.get(identifier) {
            decl.decode_types(loader);
            return Type::Bits { decl: decl.clone() };
        }
        if let Some(decl) = self.structs.get(identifier) {
            decl.decode_types(loader);
            return Type::Struct {
                decl: decl.clone(),
                nullable,
            };
        }
        if let Some(decl) = self.tables.get(identifier) {
            decl.decode_types(loader);
            return Type::Table { decl: decl.clone() };
        }
        if let Some(decl) = self.unions.get(identifier) {
            decl.decode_types(loader);
            return Type::Union {
                decl: decl.clone(),
                nullable,
            };
        }
        if let Some(decl) = self.xunions.get(identifier) {
            decl.decode_types(loader);
            return Type::XUnion {
                decl: decl.clone(),
                nullable,
            };
        }
        log::warn!("library {}: unknown identifier '{}'", self.name, identifier);
        self.errors.set();
        Type::Raw { inline_size }
    }
}

fn decl_array<'a>(document: &'a Json, key: &str) -> impl Iterator<Item = &'a Json> {
    document
        .get(key)
        .and_then(Json::as_array)
        .map(|array| array.iter())
        .into_iter()
        .flatten()
}
