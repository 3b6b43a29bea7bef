// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Pretty printer for decoded values.
//!
//! Composite values render on a single line when an upper-bound size
//! estimate fits the remaining line budget, and expand one field per line
//! otherwise. Colors are optional: scalars and symbolic names print blue,
//! strings and anomaly sentinels print red.

use crate::wire::decoder::HandleInfo;
use crate::wire::value::{hex_string, BitsValue, EnumValue, ObjectValue, TableValue, UnionValue, Value, Visitor};

/// ANSI escape set used by the printer.
pub struct Colors {
    pub reset: &'static str,
    pub red: &'static str,
    pub blue: &'static str,
}

/// No escape codes at all; the right choice for non-terminal output.
pub const NO_COLORS: Colors = Colors {
    reset: "",
    red: "",
    blue: "",
};

/// Standard ANSI escape codes.
pub const WITH_COLORS: Colors = Colors {
    reset: "\u{1b}[0m",
    red: "\u{1b}[31m",
    blue: "\u{1b}[34m",
};

/// Default line budget for terminal output.
pub const DEFAULT_LINE_WIDTH: usize = 100;

const TAB_SIZE: usize = 2;

// ---------------------------------------------------------------------------
// Display size estimation
// ---------------------------------------------------------------------------

/// Cheap upper bound on the printed width of `value`, abandoned as soon as
/// it exceeds `limit`. Integer widths are worst-case constants. Floats are
/// measured: their decimal rendering never uses exponent form and can run
/// to hundreds of characters.
pub(crate) fn display_size(value: &Value, limit: usize) -> usize {
    match value {
        Value::Null => 4,
        Value::Invalid => 7,
        Value::Bool(_) => 5,
        Value::I8(_) => 4,
        Value::I16(_) => 6,
        Value::I32(_) => 11,
        Value::I64(_) => 20,
        Value::U8(_) => 3,
        Value::U16(_) => 5,
        Value::U32(_) => 10,
        Value::U64(_) => 20,
        Value::F32(value) => value.to_string().len(),
        Value::F64(value) => value.to_string().len(),
        Value::String(text) => text.len().saturating_add(2),
        Value::Array(elements) | Value::Vector(elements) => sequence_display_size(elements, limit),
        Value::Object(object) => object_display_size(object, limit),
        Value::Table(table) => table_display_size(table, limit),
        Value::Union(value) => union_display_size(value, limit),
        Value::Enum(value) => value.name().map(|name| name.len()).unwrap_or(9),
        Value::Bits(value) => value.name().map(|name| name.len()).unwrap_or(9),
        Value::Handle(handle) => {
            if handle.handle == 0 {
                4
            } else {
                10
            }
        }
        Value::Raw(bytes) => bytes.len().saturating_mul(3),
    }
}

fn sequence_display_size(elements: &[Value], limit: usize) -> usize {
    if elements.is_empty() {
        return 2;
    }
    let mut size = 4usize;
    for (index, element) in elements.iter().enumerate() {
        if index > 0 {
            size = size.saturating_add(2);
        }
        size = size.saturating_add(display_size(element, limit.saturating_sub(size)));
        if size > limit {
            return size;
        }
    }
    size
}

fn object_display_size(object: &ObjectValue, limit: usize) -> usize {
    if object.is_empty() {
        return 2;
    }
    let mut size = 4usize;
    for (index, (name, value)) in object.fields().iter().enumerate() {
        if index > 0 {
            size = size.saturating_add(2);
        }
        size = size.saturating_add(name.len()).saturating_add(2);
        size = size.saturating_add(display_size(value, limit.saturating_sub(size)));
        if size > limit {
            return size;
        }
    }
    size
}

fn table_display_size(table: &TableValue, limit: usize) -> usize {
    if table.is_empty() {
        return 2;
    }
    let mut size = 4usize;
    for (index, entry) in table.entries().iter().enumerate() {
        if index > 0 {
            size = size.saturating_add(2);
        }
        size = size.saturating_add(entry.name.len()).saturating_add(2);
        size = size.saturating_add(display_size(&entry.value, limit.saturating_sub(size)));
        if size > limit {
            return size;
        }
    }
    size
}

fn union_display_size(value: &UnionValue, limit: usize) -> usize {
    let size = 4usize.saturating_add(value.member().len()).saturating_add(2);
    size.saturating_add(display_size(value.value(), limit.saturating_sub(size)))
}

// ---------------------------------------------------------------------------
// PrettyPrinter
// ---------------------------------------------------------------------------

/// Renders a value tree into a string, tracking the visible column so color
/// escapes never count against the line budget.
pub struct PrettyPrinter<'a> {
    out: &'a mut String,
    colors: &'a Colors,
    max_line_width: usize,
    indent: usize,
    column: usize,
}

impl<'a> PrettyPrinter<'a> {
    pub fn new(out: &'a mut String, colors: &'a Colors, max_line_width: usize) -> PrettyPrinter<'a> {
        PrettyPrinter {
            out,
            colors,
            max_line_width,
            indent: 0,
            column: 0,
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
        self.column += text.len();
    }

    fn push_colored(&mut self, color: &'static str, text: &str) {
        self.out.push_str(color);
        self.push(text);
        self.out.push_str(self.colors.reset);
    }

    fn remaining(&self) -> usize {
        self.max_line_width.saturating_sub(self.column)
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.column = 0;
        self.push(&" ".repeat(self.indent * TAB_SIZE));
    }

    fn print_named_fields<'v>(&mut self, fields: impl Iterator<Item = (&'v str, &'v Value)>, fits: bool) {
        if fits {
            self.push("{ ");
            for (index, (name, value)) in fields.enumerate() {
                if index > 0 {
                    self.push(", ");
                }
                self.push(name);
                self.push(": ");
                value.accept(self);
            }
            self.push(" }");
        } else {
            self.push("{");
            self.indent += 1;
            for (name, value) in fields {
                self.newline();
                self.push(name);
                self.push(": ");
                value.accept(self);
            }
            self.indent -= 1;
            self.newline();
            self.push("}");
        }
    }

    fn print_sequence(&mut self, elements: &[Value]) {
        if elements.is_empty() {
            self.push("[]");
            return;
        }
        let limit = self.remaining();
        if sequence_display_size(elements, limit) <= limit {
            self.push("[ ");
            for (index, element) in elements.iter().enumerate() {
                if index > 0 {
                    self.push(", ");
                }
                element.accept(self);
            }
            self.push(" ]");
        } else {
            self.push("[");
            self.indent += 1;
            for element in elements {
                self.newline();
                element.accept(self);
            }
            self.indent -= 1;
            self.newline();
            self.push("]");
        }
    }
}

impl Visitor for PrettyPrinter<'_> {
    fn visit_null(&mut self) {
        self.push_colored(self.colors.red, "null");
    }

    fn visit_invalid(&mut self) {
        self.push_colored(self.colors.red, "invalid");
    }

    fn visit_bool(&mut self, value: bool) {
        self.push_colored(self.colors.blue, if value { "true" } else { "false" });
    }

    fn visit_i8(&mut self, value: i8) {
        self.push_colored(self.colors.blue, &value.to_string());
    }

    fn visit_i16(&mut self, value: i16) {
        self.push_colored(self.colors.blue, &value.to_string());
    }

    fn visit_i32(&mut self, value: i32) {
        self.push_colored(self.colors.blue, &value.to_string());
    }

    fn visit_i64(&mut self, value: i64) {
        self.push_colored(self.colors.blue, &value.to_string());
    }

    fn visit_u8(&mut self, value: u8) {
        self.push_colored(self.colors.blue, &value.to_string());
    }

    fn visit_u16(&mut self, value: u16) {
        self.push_colored(self.colors.blue, &value.to_string());
    }

    fn visit_u32(&mut self, value: u32) {
        self.push_colored(self.colors.blue, &value.to_string());
    }

    fn visit_u64(&mut self, value: u64) {
        self.push_colored(self.colors.blue, &value.to_string());
    }

    fn visit_f32(&mut self, value: f32) {
        self.push_colored(self.colors.blue, &value.to_string());
    }

    fn visit_f64(&mut self, value: f64) {
        self.push_colored(self.colors.blue, &value.to_string());
    }

    fn visit_string(&mut self, text: &str) {
        self.push_colored(self.colors.red, &format!("\"{}\"", text));
    }

    fn visit_array(&mut self, elements: &[Value]) {
        self.print_sequence(elements);
    }

    fn visit_vector(&mut self, elements: &[Value]) {
        self.print_sequence(elements);
    }

    fn visit_object(&mut self, object: &ObjectValue) {
        if object.is_empty() {
            self.push("{}");
            return;
        }
        let limit = self.remaining();
        let fits = object_display_size(object, limit) <= limit;
        self.print_named_fields(
            object.fields().iter().map(|(name, value)| (name.as_str(), value)),
            fits,
        );
    }

    fn visit_table(&mut self, table: &TableValue) {
        if table.is_empty() {
            self.push("{}");
            return;
        }
        let limit = self.remaining();
        let fits = table_display_size(table, limit) <= limit;
        self.print_named_fields(
            table.entries().iter().map(|entry| (entry.name.as_str(), &entry.value)),
            fits,
        );
    }

    fn visit_union(&mut self, value: &UnionValue) {
        let limit = self.remaining();
        let fits = union_display_size(value, limit) <= limit;
        self.print_named_fields(std::iter::once((value.member(), value.value())), fits);
    }

    fn visit_enum(&mut self, value: &EnumValue) {
        match value.name() {
            Some(name) => self.push_colored(self.colors.blue, &name),
            None => self.push_colored(self.colors.red, "(unknown)"),
        }
    }

    fn visit_bits(&mut self, value: &BitsValue) {
        match value.name() {
            Some(name) => self.push_colored(self.colors.blue, &name),
            None => self.push_colored(self.colors.red, "(unknown)"),
        }
    }

    fn visit_handle(&mut self, handle: &HandleInfo) {
        if handle.handle == 0 {
            self.push_colored(self.colors.red, "null");
        } else {
            self.push_colored(self.colors.red, &handle.handle.to_string());
        }
    }

    fn visit_raw(&mut self, bytes: &[u8]) {
        self.push(&hex_string(bytes));
    }
}

/// Render `value` into a fresh string under the given color set and line
/// budget.
pub fn pretty_print(value: &Value, colors: &Colors, max_line_width: usize) -> String {
    let mut out = String::new();
    let mut printer = PrettyPrinter::new(&mut out, colors, max_line_width);
    value.accept(&mut printer);
    out
}
