// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Runtime type descriptors.
//!
//! A `Type` knows its inline footprint and how to decode one value of itself
//! at a given offset. Descriptors are built from schema type references when
//! a declaration resolves its members; declaration-backed variants share the
//! declaration through `Arc`.

use std::fmt;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::schema::library::{token_u64, BitsDecl, EnumDecl, ErrorFlag, StructDecl, TableDecl, UnionDecl, XUnionDecl};
use crate::schema::loader::LibraryLoader;
use crate::wire::decoder::{HandleInfo, MessageDecoder, Presence, ENVELOPE_SIZE, HANDLE_ABSENT, HANDLE_PRESENT};
use crate::wire::value::{BitsValue, EnumValue, TableValue, UnionValue, Value};

// ---------------------------------------------------------------------------
// Primitive
// ---------------------------------------------------------------------------

/// Fixed-width scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
}

impl Primitive {
    pub(crate) fn from_subtype(subtype: &str) -> Option<Primitive> {
        match subtype {
            "bool" => Some(Self::Bool),
            "int8" => Some(Self::Int8),
            "int16" => Some(Self::Int16),
            "int32" => Some(Self::Int32),
            "int64" => Some(Self::Int64),
            "uint8" => Some(Self::Uint8),
            "uint16" => Some(Self::Uint16),
            "uint32" => Some(Self::Uint32),
            "uint64" => Some(Self::Uint64),
            "float32" => Some(Self::Float32),
            "float64" => Some(Self::Float64),
            _ => None,
        }
    }

    pub fn inline_size(self) -> u64 {
        match self {
            Self::Bool | Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Int64 | Self::Uint64 | Self::Float64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    fn decode(self, decoder: &mut MessageDecoder<'_>, offset: u64) -> Value {
        match self {
            // Any non-zero byte reads as true.
            Self::Bool => decoder.u8_at(offset).map(|value| Value::Bool(value != 0)).unwrap_or(Value::Invalid),
            Self::Int8 => decoder.i8_at(offset).map(Value::I8).unwrap_or(Value::Invalid),
            Self::Int16 => decoder.i16_at(offset).map(Value::I16).unwrap_or(Value::Invalid),
            Self::Int32 => decoder.i32_at(offset).map(Value::I32).unwrap_or(Value::Invalid),
            Self::Int64 => decoder.i64_at(offset).map(Value::I64).unwrap_or(Value::Invalid),
            Self::Uint8 => decoder.u8_at(offset).map(Value::U8).unwrap_or(Value::Invalid),
            Self::Uint16 => decoder.u16_at(offset).map(Value::U16).unwrap_or(Value::Invalid),
            Self::Uint32 => decoder.u32_at(offset).map(Value::U32).unwrap_or(Value::Invalid),
            Self::Uint64 => decoder.u64_at(offset).map(Value::U64).unwrap_or(Value::Invalid),
            Self::Float32 => decoder.f32_at(offset).map(Value::F32).unwrap_or(Value::Invalid),
            Self::Float64 => decoder.f64_at(offset).map(Value::F64).unwrap_or(Value::Invalid),
        }
    }
}

// ---------------------------------------------------------------------------
// Type
// ---------------------------------------------------------------------------

/// Runtime description of one wire type.
#[derive(Clone)]
pub enum Type {
    /// Fallback for unresolvable references: an opaque inline blob.
    Raw { inline_size: u64 },
    Primitive(Primitive),
    String { nullable: bool },
    Array { element: Box<Type>, count: u64 },
    Vector { element: Box<Type>, nullable: bool },
    Handle { nullable: bool },
    Struct { decl: Arc<StructDecl>, nullable: bool },
    Table { decl: Arc<TableDecl> },
    Union { decl: Arc<UnionDecl>, nullable: bool },
    XUnion { decl: Arc<XUnionDecl>, nullable: bool },
    Enum { decl: Arc<EnumDecl> },
    Bits { decl: Arc<BitsDecl> },
}

impl Type {
    /// Build a descriptor from a schema type reference. Unknown or broken
    /// references degrade to [`Type::Raw`] and set the owning library's
    /// error flag.
    pub(crate) fn from_json(loader: &LibraryLoader, type_ref: &Json, inline_size: u64, errors: &ErrorFlag) -> Type {
        let Some(kind) = type_ref.get("kind").and_then(Json::as_str) else {
            log::warn!("type reference without 'kind': {}", type_ref);
            errors.set();
            return Type::Raw { inline_size };
        };
        match kind {
            "string" => Type::String {
                nullable: nullable_of(type_ref),
            },
            // A request endpoint travels as a plain handle.
            "handle" | "request" => Type::Handle {
                nullable: nullable_of(type_ref),
            },
            "array" => {
                let count = match type_ref.get("element_count").and_then(token_u64) {
                    Some(count) => count,
                    None => {
                        log::warn!("array type without 'element_count'");
                        errors.set();
                        0
                    }
                };
                Type::Array {
                    element: Box::new(element_type(loader, type_ref, errors)),
                    count,
                }
            }
            "vector" => Type::Vector {
                element: Box::new(element_type(loader, type_ref, errors)),
                nullable: nullable_of(type_ref),
            },
            "primitive" => {
                let subtype = type_ref.get("subtype").and_then(Json::as_str);
                match subtype.and_then(Primitive::from_subtype) {
                    Some(primitive) => Type::Primitive(primitive),
                    None => {
                        log::warn!("unknown primitive subtype '{}'", subtype.unwrap_or("<missing>"));
                        errors.set();
                        Type::Raw { inline_size }
                    }
                }
            }
            "identifier" => Self::from_identifier(loader, type_ref, inline_size, errors),
            other => {
                log::warn!("unknown type kind '{}'", other);
                errors.set();
                Type::Raw { inline_size }
            }
        }
    }

    fn from_identifier(loader: &LibraryLoader, type_ref: &Json, inline_size: u64, errors: &ErrorFlag) -> Type {
        let Some(identifier) = type_ref.get("identifier").and_then(Json::as_str) else {
            log::warn!("identifier type without 'identifier'");
            errors.set();
            return Type::Raw { inline_size };
        };
        let library_name = identifier.split_once('/').map(|(library, _)| library).unwrap_or(identifier);
        let Some(library) = loader.get_library_from_name(library_name) else {
            log::warn!("identifier '{}' references unknown library '{}'", identifier, library_name);
            errors.set();
            return Type::Raw { inline_size };
        };
        library.type_from_identifier(loader, nullable_of(type_ref), identifier, inline_size)
    }

    /// Bytes this type occupies inline, in its container or as the primary
    /// object. Out-of-line content is not counted.
    pub fn inline_size(&self) -> u64 {
        match self {
            Type::Raw { inline_size } => *inline_size,
            Type::Primitive(primitive) => primitive.inline_size(),
            // Element count word plus presence word.
            Type::String { .. } | Type::Vector { .. } => 16,
            Type::Array { element, count } => element.inline_size().saturating_mul(*count),
            Type::Handle { .. } => 4,
            Type::Struct { decl, nullable } => {
                if *nullable {
                    8
                } else {
                    decl.size()
                }
            }
            Type::Table { decl } => decl.size(),
            Type::Union { decl, nullable } => {
                if *nullable {
                    8
                } else {
                    decl.size()
                }
            }
            // Ordinal word plus envelope, nullable or not.
            Type::XUnion { .. } => 24,
            Type::Enum { decl } => decl.size(),
            Type::Bits { decl } => decl.size(),
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            Type::Raw { .. } => true,
            Type::String { nullable }
            | Type::Vector { nullable, .. }
            | Type::Handle { nullable }
            | Type::Struct { nullable, .. }
            | Type::Union { nullable, .. }
            | Type::XUnion { nullable, .. } => *nullable,
            _ => false,
        }
    }

    /// Display name, e.g. `vector<int32>` or the declaration's qualified
    /// name.
    pub fn name(&self) -> String {
        match self {
            Type::Raw { .. } => String::from("unknown"),
            Type::Primitive(primitive) => primitive.name().to_string(),
            Type::String { .. } => String::from("string"),
            Type::Array { element, .. } => format!("array<{}>", element.name()),
            Type::Vector { element, .. } => format!("vector<{}>", element.name()),
            Type::Handle { .. } => String::from("handle"),
            Type::Struct { decl, .. } => decl.name().to_string(),
            Type::Table { decl } => decl.name().to_string(),
            Type::Union { decl, .. } => decl.name().to_string(),
            Type::XUnion { decl, .. } => decl.name().to_string(),
            Type::Enum { decl } => decl.name().to_string(),
            Type::Bits { decl } => decl.name().to_string(),
        }
    }

    /// Decode one value of this type at `offset`. Anomalies are recorded on
    /// the decoder and yield placeholder values; this never fails.
    pub fn decode(&self, decoder: &mut MessageDecoder<'_>, offset: u64) -> Value {
        if !decoder.enter_nested(offset) {
            return Value::Invalid;
        }
        let value = self.decode_inner(decoder, offset);
        decoder.leave_nested();
        value
    }

    fn decode_inner(&self, decoder: &mut MessageDecoder<'_>, offset: u64) -> Value {
        match self {
            Type::Raw { inline_size } => match decoder.get_address(offset, *inline_size) {
                Some(bytes) => Value::Raw(bytes.to_vec()),
                None => Value::Invalid,
            },
            Type::Primitive(primitive) => primitive.decode(decoder, offset),
            Type::String { .. } => decode_string(decoder, offset),
            Type::Array { element, count } => decode_array(decoder, element, *count, offset),
            Type::Vector { element, .. } => decode_vector(decoder, element, offset),
            Type::Handle { .. } => decode_handle(decoder, offset),
            Type::Struct { decl, nullable } => {
                if *nullable {
                    match decoder.decode_nullable_header(offset, decl.size()) {
                        Some(Presence::Present(payload)) => decoder.decode_struct(decl, payload),
                        Some(Presence::Absent) => Value::Null,
                        None => Value::Invalid,
                    }
                } else {
                    decoder.decode_struct(decl, offset)
                }
            }
            Type::Table { decl } => decode_table(decoder, decl, offset),
            Type::Union { decl, nullable } => decode_union(decoder, decl, *nullable, offset),
            Type::XUnion { decl, nullable } => decode_xunion(decoder, decl, *nullable, offset),
            Type::Enum { decl } => {
                let scalar = decl.underlying().decode(decoder, offset);
                Value::Enum(EnumValue::new(decl.clone(), scalar))
            }
            Type::Bits { decl } => {
                let scalar = decl.underlying().decode(decoder, offset);
                Value::Bits(BitsValue::new(decl.clone(), scalar))
            }
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.name())
    }
}

/// Identity comparison: declaration-backed variants are equal when they share
/// the same declaration object.
impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Raw { inline_size: a }, Type::Raw { inline_size: b }) => a == b,
            (Type::Primitive(a), Type::Primitive(b)) => a == b,
            (Type::String { nullable: a }, Type::String { nullable: b }) => a == b,
            (
                Type::Array {
                    element: element_a,
                    count: count_a,
                },
                Type::Array {
                    element: element_b,
                    count: count_b,
                },
            ) => count_a == count_b && element_a == element_b,
            (
                Type::Vector {
                    element: element_a,
                    nullable: nullable_a,
                },
                Type::Vector {
                    element: element_b,
                    nullable: nullable_b,
                },
            ) => nullable_a == nullable_b && element_a == element_b,
            (Type::Handle { nullable: a }, Type::Handle { nullable: b }) => a == b,
            (
                Type::Struct {
                    decl: decl_a,
                    nullable: nullable_a,
                },
                Type::Struct {
                    decl: decl_b,
                    nullable: nullable_b,
                },
            ) => nullable_a == nullable_b && Arc::ptr_eq(decl_a, decl_b),
            (Type::Table { decl: decl_a }, Type::Table { decl: decl_b }) => Arc::ptr_eq(decl_a, decl_b),
            (
                Type::Union {
                    decl: decl_a,
                    nullable: nullable_a,
                },
                Type::Union {
                    decl: decl_b,
                    nullable: nullable_b,
                },
            ) => nullable_a == nullable_b && Arc::ptr_eq(decl_a, decl_b),
            (
                Type::XUnion {
                    decl: decl_a,
                    nullable: nullable_a,
                },
                Type::XUnion {
                    decl: decl_b,
                    nullable: nullable_b,
                },
            ) => nullable_a == nullable_b && Arc::ptr_eq(decl_a, decl_b),
            (Type::Enum { decl: decl_a }, Type::Enum { decl: decl_b }) => Arc::ptr_eq(decl_a, decl_b),
            (Type::Bits { decl: decl_a }, Type::Bits { decl: decl_b }) => Arc::ptr_eq(decl_a, decl_b),
            _ => false,
        }
    }
}

fn nullable_of(type_ref: &Json) -> bool {
    type_ref.get("nullable").and_then(Json::as_bool).unwrap_or(false)
}

fn element_type(loader: &LibraryLoader, type_ref: &Json, errors: &ErrorFlag) -> Type {
    match type_ref.get("element_type") {
        Some(element) => Type::from_json(loader, element, 0, errors),
        None => {
            log::warn!("container type without 'element_type'");
            errors.set();
            Type::Raw { inline_size: 0 }
        }
    }
}

// ---------------------------------------------------------------------------
// Per-shape decoding
// ---------------------------------------------------------------------------

fn decode_string(decoder: &mut MessageDecoder<'_>, offset: u64) -> Value {
    let Some(length) = decoder.u64_at(offset) else {
        return Value::Invalid;
    };
    match decoder.decode_nullable_header(offset + 8, length) {
        Some(Presence::Present(payload)) => match decoder.get_address(payload, length) {
            // Tolerate broken encoders: replace invalid UTF-8 instead of
            // dropping the whole string.
            Some(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            None => Value::Invalid,
        },
        Some(Presence::Absent) => Value::Null,
        None => Value::Invalid,
    }
}

fn decode_array(decoder: &mut MessageDecoder<'_>, element: &Type, count: u64, offset: u64) -> Value {
    let element_size = element.inline_size();
    let mut values = Vec::new();
    let mut element_offset = offset;
    for _ in 0..count {
        // Zero-sized elements cannot advance; stop instead of spinning.
        if element_size == 0 || element_offset.saturating_add(element_size) > decoder.num_bytes() {
            break;
        }
        values.push(element.decode(decoder, element_offset));
        element_offset += element_size;
    }
    Value::Array(values)
}

fn decode_vector(decoder: &mut MessageDecoder<'_>, element: &Type, offset: u64) -> Value {
    let Some(element_count) = decoder.u64_at(offset) else {
        return Value::Invalid;
    };
    let element_size = element.inline_size();
    match decoder.decode_nullable_header(offset + 8, element_count.saturating_mul(element_size)) {
        Some(Presence::Present(payload)) => {
            let mut values = Vec::new();
            let mut element_offset = payload;
            for _ in 0..element_count {
                // The reservation was clamped if the declared content did
                // not fit; decode only what the buffer really holds.
                if element_size == 0 || element_offset.saturating_add(element_size) > decoder.num_bytes() {
                    break;
                }
                values.push(element.decode(decoder, element_offset));
                element_offset += element_size;
            }
            Value::Vector(values)
        }
        Some(Presence::Absent) => Value::Null,
        None => Value::Invalid,
    }
}

fn decode_table(decoder: &mut MessageDecoder<'_>, decl: &Arc<TableDecl>, offset: u64) -> Value {
    let Some(member_count) = decoder.u64_at(offset) else {
        return Value::Invalid;
    };
    match decoder.decode_nullable_header(offset + 8, member_count.saturating_mul(ENVELOPE_SIZE)) {
        Some(Presence::Present(payload)) => {
            let mut table = TableValue::new();
            let mut envelope_offset = payload;
            for ordinal in 1..=member_count {
                if envelope_offset.saturating_add(ENVELOPE_SIZE) > decoder.num_bytes() {
                    break;
                }
                match decl.member_from_ordinal(ordinal).map(|member| (member.name(), member.ty())) {
                    Some((name, Some(ty))) => {
                        let value = decoder.decode_envelope(envelope_offset, ty);
                        // Absent envelopes do not produce entries.
                        if !value.is_null() {
                            table.push(ordinal, name.to_string(), value);
                        }
                    }
                    Some((_, None)) => decoder.skip_envelope(envelope_offset),
                    None => {
                        let value = decoder.decode_unknown_envelope(envelope_offset);
                        if !value.is_null() {
                            table.push(ordinal, format!("unknown${}", ordinal), value);
                        }
                    }
                }
                envelope_offset += ENVELOPE_SIZE;
            }
            Value::Table(table)
        }
        Some(Presence::Absent) => {
            decoder.add_error(format!(
                "{:08x}: tables are not nullable",
                decoder.absolute_offset(offset)
            ));
            Value::Invalid
        }
        None => Value::Invalid,
    }
}

fn decode_union(decoder: &mut MessageDecoder<'_>, decl: &Arc<UnionDecl>, nullable: bool, offset: u64) -> Value {
    let mut union_offset = offset;
    if nullable {
        match decoder.decode_nullable_header(offset, decl.size()) {
            Some(Presence::Present(payload)) => union_offset = payload,
            Some(Presence::Absent) => return Value::Null,
            None => return Value::Invalid,
        }
    }
    let Some(tag) = decoder.u32_at(union_offset) else {
        return Value::Invalid;
    };
    match decl.member_with_tag(tag) {
        Some(member) => match member.ty() {
            Some(ty) => {
                let value = ty.decode(decoder, union_offset.saturating_add(member.offset()));
                Value::Union(UnionValue::new(member.name().to_string(), value))
            }
            None => {
                decoder.add_error(format!(
                    "{:08x}: union {} selects reserved tag {}",
                    decoder.absolute_offset(union_offset),
                    decl.name(),
                    tag
                ));
                Value::Invalid
            }
        },
        None => {
            decoder.add_error(format!(
                "{:08x}: union {} has no member with tag {}",
                decoder.absolute_offset(union_offset),
                decl.name(),
                tag
            ));
            Value::Invalid
        }
    }
}

fn decode_xunion(decoder: &mut MessageDecoder<'_>, decl: &Arc<XUnionDecl>, nullable: bool, offset: u64) -> Value {
    let Some(ordinal) = decoder.u64_at(offset) else {
        return Value::Invalid;
    };
    let envelope_offset = offset + 8;
    if ordinal == 0 {
        if !nullable {
            decoder.add_error(format!(
                "{:08x}: null envelope for non-nullable extensible union {}",
                decoder.absolute_offset(offset),
                decl.name()
            ));
        }
        if !decoder.check_null_envelope(envelope_offset) {
            return Value::Invalid;
        }
        return Value::Null;
    }
    match decl.member_with_ordinal(ordinal) {
        Some(member) => {
            let value = decoder.decode_envelope(envelope_offset, member.ty());
            Value::Union(UnionValue::new(member.name().to_string(), value))
        }
        None => {
            let value = decoder.decode_unknown_envelope(envelope_offset);
            Value::Union(UnionValue::new(format!("unknown${}", ordinal), value))
        }
    }
}

fn decode_handle(decoder: &mut MessageDecoder<'_>, offset: u64) -> Value {
    let Some(marker) = decoder.u32_at(offset) else {
        return Value::Invalid;
    };
    match marker {
        HANDLE_ABSENT => Value::Handle(HandleInfo::default()),
        HANDLE_PRESENT => Value::Handle(decoder.next_handle()),
        other => {
            decoder.add_error(format!(
                "{:08x}: invalid value {:08x} for handle",
                decoder.absolute_offset(offset),
                other
            ));
            Value::Handle(HandleInfo::default())
        }
    }
}
