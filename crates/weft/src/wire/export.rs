// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Structured JSON export of decoded values.

use serde_json::{Map, Number, Value as Json};

use crate::wire::decoder::HandleInfo;
use crate::wire::value::{
    hex_string, BitsValue, EnumValue, ObjectValue, TableValue, UnionValue, Value, Visitor,
};

/// Convert a decoded value into a `serde_json::Value`.
///
/// Maps keep insertion order, so exported objects read in declaration order.
/// The lossy spots are explicit: invalid data and unrecognized enum or bits
/// patterns export as the string `"(invalid)"`, non-finite floats as null,
/// raw bytes as the space-separated hex-pair string.
pub fn export(value: &Value) -> Json {
    JsonExporter::run(value)
}

#[derive(Default)]
struct JsonExporter {
    result: Json,
}

impl JsonExporter {
    fn run(value: &Value) -> Json {
        let mut exporter = JsonExporter::default();
        value.accept(&mut exporter);
        exporter.result
    }
}

impl Visitor for JsonExporter {
    fn visit_null(&mut self) {
        self.result = Json::Null;
    }

    fn visit_invalid(&mut self) {
        self.result = Json::String(String::from("(invalid)"));
    }

    fn visit_bool(&mut self, value: bool) {
        self.result = Json::Bool(value);
    }

    fn visit_i8(&mut self, value: i8) {
        self.result = Json::Number(Number::from(value));
    }

    fn visit_i16(&mut self, value: i16) {
        self.result = Json::Number(Number::from(value));
    }

    fn visit_i32(&mut self, value: i32) {
        self.result = Json::Number(Number::from(value));
    }

    fn visit_i64(&mut self, value: i64) {
        self.result = Json::Number(Number::from(value));
    }

    fn visit_u8(&mut self, value: u8) {
        self.result = Json::Number(Number::from(value));
    }

    fn visit_u16(&mut self, value: u16) {
        self.result = Json::Number(Number::from(value));
    }

    fn visit_u32(&mut self, value: u32) {
        self.result = Json::Number(Number::from(value));
    }

    fn visit_u64(&mut self, value: u64) {
        self.result = Json::Number(Number::from(value));
    }

    fn visit_f32(&mut self, value: f32) {
        self.result = Number::from_f64(f64::from(value))
            .map(Json::Number)
            .unwrap_or(Json::Null);
    }

    fn visit_f64(&mut self, value: f64) {
        self.result = Number::from_f64(value).map(Json::Number).unwrap_or(Json::Null);
    }

    fn visit_string(&mut self, text: &str) {
        self.result = Json::String(text.to_string());
    }

    fn visit_array(&mut self, elements: &[Value]) {
        self.result = Json::Array(elements.iter().map(JsonExporter::run).collect());
    }

    fn visit_vector(&mut self, elements: &[Value]) {
        self.result = Json::Array(elements.iter().map(JsonExporter::run).collect());
    }

    fn visit_object(&mut self, object: &ObjectValue) {
        let mut map = Map::new();
        for (name, value) in object.fields() {
            map.insert(name.clone(), JsonExporter::run(value));
        }
        self.result = Json::Object(map);
    }

    fn visit_table(&mut self, table: &TableValue) {
        let mut map = Map::new();
        for entry in table.entries() {
            map.insert(entry.name.clone(), JsonExporter::run(&entry.value));
        }
        self.result = Json::Object(map);
    }

    fn visit_union(&mut self, value: &UnionValue) {
        let mut map = Map::new();
        map.insert(value.member().to_string(), JsonExporter::run(value.value()));
        self.result = Json::Object(map);
    }

    fn visit_enum(&mut self, value: &EnumValue) {
        self.result = match value.name() {
            Some(name) => Json::String(name),
            None => Json::String(String::from("(invalid)")),
        };
    }

    fn visit_bits(&mut self, value: &BitsValue) {
        self.result = match value.name() {
            Some(name) => Json::String(name),
            None => Json::String(String::from("(invalid)")),
        };
    }

    fn visit_handle(&mut self, handle: &HandleInfo) {
        self.result = Json::Number(Number::from(handle.handle));
    }

    fn visit_raw(&mut self, bytes: &[u8]) {
        self.result = Json::String(hex_string(bytes));
    }
}
