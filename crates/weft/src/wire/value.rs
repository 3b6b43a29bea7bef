// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Decoded value tree.
//!
//! Every decode produces a `Value`, even a failed one: anomalies surface as
//! `Invalid` leaves (plus decoder diagnostics), never as a missing tree.
//! Consumers walk the tree through the [`Visitor`] trait; the pretty printer
//! and the JSON exporter are the two visitors shipped in-crate.

use std::fmt;
use std::sync::Arc;

use crate::schema::library::{BitsDecl, EnumDecl};
use crate::wire::decoder::HandleInfo;

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Special
    Null,
    /// Placeholder for data that could not be decoded.
    Invalid,

    // Scalars
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),

    // Composites
    /// Fixed-length inline sequence.
    Array(Vec<Value>),
    /// Variable-length out-of-line sequence.
    Vector(Vec<Value>),
    Object(ObjectValue),
    Table(TableValue),
    /// Selected member of a union or extensible union.
    Union(UnionValue),
    Enum(EnumValue),
    Bits(BitsValue),

    // Out-of-band
    Handle(HandleInfo),
    /// Bytes kept verbatim: unknown members and unresolvable types.
    Raw(Vec<u8>),
}

impl Value {
    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u8.
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Self::U8(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u32.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as a sequence (array or vector).
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) | Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as an object.
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as a table.
    pub fn as_table(&self) -> Option<&TableValue> {
        match self {
            Self::Table(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as a union selection.
    pub fn as_union(&self) -> Option<&UnionValue> {
        match self {
            Self::Union(v) => Some(v),
            _ => None,
        }
    }

    /// Any integer scalar as (absolute value, negative); the shape used to
    /// match enum and bits members.
    pub fn integer(&self) -> Option<(u64, bool)> {
        match self {
            Self::I8(v) => Some((u64::from(v.unsigned_abs()), *v < 0)),
            Self::I16(v) => Some((u64::from(v.unsigned_abs()), *v < 0)),
            Self::I32(v) => Some((u64::from(v.unsigned_abs()), *v < 0)),
            Self::I64(v) => Some((v.unsigned_abs(), *v < 0)),
            Self::U8(v) => Some((u64::from(*v), false)),
            Self::U16(v) => Some((u64::from(*v), false)),
            Self::U32(v) => Some((u64::from(*v), false)),
            Self::U64(v) => Some((*v, false)),
            _ => None,
        }
    }

    /// Double dispatch into a visitor.
    pub fn accept(&self, visitor: &mut dyn Visitor) {
        match self {
            Self::Null => visitor.visit_null(),
            Self::Invalid => visitor.visit_invalid(),
            Self::Bool(value) => visitor.visit_bool(*value),
            Self::I8(value) => visitor.visit_i8(*value),
            Self::I16(value) => visitor.visit_i16(*value),
            Self::I32(value) => visitor.visit_i32(*value),
            Self::I64(value) => visitor.visit_i64(*value),
            Self::U8(value) => visitor.visit_u8(*value),
            Self::U16(value) => visitor.visit_u16(*value),
            Self::U32(value) => visitor.visit_u32(*value),
            Self::U64(value) => visitor.visit_u64(*value),
            Self::F32(value) => visitor.visit_f32(*value),
            Self::F64(value) => visitor.visit_f64(*value),
            Self::String(text) => visitor.visit_string(text),
            Self::Array(elements) => visitor.visit_array(elements),
            Self::Vector(elements) => visitor.visit_vector(elements),
            Self::Object(object) => visitor.visit_object(object),
            Self::Table(table) => visitor.visit_table(table),
            Self::Union(value) => visitor.visit_union(value),
            Self::Enum(value) => visitor.visit_enum(value),
            Self::Bits(value) => visitor.visit_bits(value),
            Self::Handle(handle) => visitor.visit_handle(handle),
            Self::Raw(bytes) => visitor.visit_raw(bytes),
        }
    }
}

// ---------------------------------------------------------------------------
// Composite values
// ---------------------------------------------------------------------------

/// A decoded struct: name/value fields in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectValue {
    fields: Vec<(String, Value)>,
}

impl ObjectValue {
    pub fn new() -> ObjectValue {
        ObjectValue::default()
    }

    pub fn push(&mut self, name: String, value: Value) {
        self.fields.push((name, value));
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field_name, _)| field_name == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One present table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    pub ordinal: u64,
    /// Member name, or `unknown$<ordinal>` for entries past the schema.
    pub name: String,
    pub value: Value,
}

/// A decoded table: present entries in ordinal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableValue {
    entries: Vec<TableEntry>,
}

impl TableValue {
    pub fn new() -> TableValue {
        TableValue::default()
    }

    pub fn push(&mut self, ordinal: u64, name: String, value: Value) {
        self.entries.push(TableEntry { ordinal, name, value });
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The selected member of a union or extensible union.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionValue {
    member: String,
    value: Box<Value>,
}

impl UnionValue {
    pub fn new(member: String, value: Value) -> UnionValue {
        UnionValue {
            member,
            value: Box::new(value),
        }
    }

    /// Member name, or `unknown$<ordinal>` for an unrecognized ordinal.
    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// A decoded enum: the raw scalar plus its declaration for name lookup.
#[derive(Clone)]
pub struct EnumValue {
    decl: Arc<EnumDecl>,
    value: Box<Value>,
}

impl EnumValue {
    pub fn new(decl: Arc<EnumDecl>, value: Value) -> EnumValue {
        EnumValue {
            decl,
            value: Box::new(value),
        }
    }

    /// Symbolic member name, if the scalar matches a declared member.
    pub fn name(&self) -> Option<String> {
        let (absolute_value, negative) = self.value.integer()?;
        self.decl.name_of(absolute_value, negative).map(str::to_string)
    }

    /// The underlying scalar as decoded.
    pub fn raw(&self) -> &Value {
        &self.value
    }
}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumValue")
            .field("decl", &self.decl.name())
            .field("value", &self.value)
            .finish()
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &EnumValue) -> bool {
        Arc::ptr_eq(&self.decl, &other.decl) && self.value == other.value
    }
}

/// A decoded bits value: the raw scalar plus its declaration for name
/// lookup.
#[derive(Clone)]
pub struct BitsValue {
    decl: Arc<BitsDecl>,
    value: Box<Value>,
}

impl BitsValue {
    pub fn new(decl: Arc<BitsDecl>, value: Value) -> BitsValue {
        BitsValue {
            decl,
            value: Box::new(value),
        }
    }

    /// Pipe-joined member names, if every set bit is declared.
    pub fn name(&self) -> Option<String> {
        let (absolute_value, negative) = self.value.integer()?;
        self.decl.name_of(absolute_value, negative)
    }

    /// The underlying scalar as decoded.
    pub fn raw(&self) -> &Value {
        &self.value
    }
}

impl fmt::Debug for BitsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitsValue")
            .field("decl", &self.decl.name())
            .field("value", &self.value)
            .finish()
    }
}

impl PartialEq for BitsValue {
    fn eq(&self, other: &BitsValue) -> bool {
        Arc::ptr_eq(&self.decl, &other.decl) && self.value == other.value
    }
}

// Conversion traits
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Self::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Self::I8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::I16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Space-separated hex pairs, the display form of raw bytes.
pub fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (index, byte) in bytes.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

// ---------------------------------------------------------------------------
// Visitor
// ---------------------------------------------------------------------------

/// Double-dispatch walk over a value tree.
///
/// Every method defaults to a no-op, so a visitor implements only the
/// variants it cares about. Recursion into composites is the visitor's own
/// business.
pub trait Visitor {
    fn visit_null(&mut self) {}
    fn visit_invalid(&mut self) {}
    fn visit_bool(&mut self, _value: bool) {}
    fn visit_i8(&mut self, _value: i8) {}
    fn visit_i16(&mut self, _value: i16) {}
    fn visit_i32(&mut self, _value: i32) {}
    fn visit_i64(&mut self, _value: i64) {}
    fn visit_u8(&mut self, _value: u8) {}
    fn visit_u16(&mut self, _value: u16) {}
    fn visit_u32(&mut self, _value: u32) {}
    fn visit_u64(&mut self, _value: u64) {}
    fn visit_f32(&mut self, _value: f32) {}
    fn visit_f64(&mut self, _value: f64) {}
    fn visit_string(&mut self, _text: &str) {}
    fn visit_array(&mut self, _elements: &[Value]) {}
    fn visit_vector(&mut self, _elements: &[Value]) {}
    fn visit_object(&mut self, _object: &ObjectValue) {}
    fn visit_table(&mut self, _table: &TableValue) {}
    fn visit_union(&mut self, _value: &UnionValue) {}
    fn visit_enum(&mut self, _value: &EnumValue) {}
    fn visit_bits(&mut self, _value: &BitsValue) {}
    fn visit_handle(&mut self, _handle: &HandleInfo) {}
    fn visit_raw(&mut self, _bytes: &[u8]) {}
}
