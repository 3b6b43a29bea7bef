// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Wire-level decode scenarios running the full schema-to-value pipeline.

use std::sync::Arc;

use serde_json::json;

use crate::schema::library::StructDecl;
use crate::schema::loader::LibraryLoader;
use crate::wire::decoder::{HandleInfo, MessageDecoder};
use crate::wire::export::export;
use crate::wire::printer::{pretty_print, DEFAULT_LINE_WIDTH, NO_COLORS};
use crate::wire::types::Type;
use crate::wire::value::Value;

const WIRE_SCHEMA: &str = r#"{
    "version": "0.0.1",
    "name": "test.wire",
    "enum_declarations": [
        {
            "name": "test.wire/Color",
            "type": "uint32",
            "members": [
                { "name": "RED", "value": "1" },
                { "name": "BLUE", "value": "2" }
            ]
        }
    ],
    "bits_declarations": [
        {
            "name": "test.wire/Perms",
            "type": { "kind": "primitive", "subtype": "uint8" },
            "members": [
                { "name": "READ", "value": "1" },
                { "name": "WRITE", "value": "2" }
            ]
        }
    ],
    "struct_declarations": [
        {
            "name": "test.wire/Primitives",
            "size": "8",
            "members": [
                { "name": "b", "type": { "kind": "primitive", "subtype": "bool" }, "offset": "0", "size": "1" },
                { "name": "i", "type": { "kind": "primitive", "subtype": "int32" }, "offset": "4", "size": "4" }
            ]
        },
        {
            "name": "test.wire/Shuffled",
            "size": "8",
            "members": [
                { "name": "i", "type": { "kind": "primitive", "subtype": "int32" }, "offset": "4", "size": "4" },
                { "name": "b", "type": { "kind": "primitive", "subtype": "bool" }, "offset": "0", "size": "1" }
            ]
        },
        {
            "name": "test.wire/Vectors",
            "size": "32",
            "members": [
                { "name": "absent", "type": { "kind": "vector", "element_type": { "kind": "primitive", "subtype": "uint8" }, "nullable": true }, "offset": "0", "size": "16" },
                { "name": "empty", "type": { "kind": "vector", "element_type": { "kind": "primitive", "subtype": "uint8" } }, "offset": "16", "size": "16" }
            ]
        },
        {
            "name": "test.wire/Name",
            "size": "16",
            "members": [
                { "name": "name", "type": { "kind": "string" }, "offset": "0", "size": "16" }
            ]
        },
        {
            "name": "test.wire/TwoStrings",
            "size": "32",
            "members": [
                { "name": "first", "type": { "kind": "string" }, "offset": "0", "size": "16" },
                { "name": "second", "type": { "kind": "string" }, "offset": "16", "size": "16" }
            ]
        },
        {
            "name": "test.wire/Inner",
            "size": "4",
            "members": [
                { "name": "x", "type": { "kind": "primitive", "subtype": "uint32" }, "offset": "0", "size": "4" }
            ]
        },
        {
            "name": "test.wire/Outer",
            "size": "8",
            "members": [
                { "name": "inner", "type": { "kind": "identifier", "identifier": "test.wire/Inner", "nullable": true }, "offset": "0", "size": "8" }
            ]
        },
        {
            "name": "test.wire/Fixed",
            "size": "8",
            "members": [
                { "name": "a", "type": { "kind": "array", "element_type": { "kind": "primitive", "subtype": "uint16" }, "element_count": "3" }, "offset": "0", "size": "6" }
            ]
        },
        {
            "name": "test.wire/NameList",
            "size": "16",
            "members": [
                { "name": "names", "type": { "kind": "vector", "element_type": { "kind": "string" } }, "offset": "0", "size": "16" }
            ]
        },
        {
            "name": "test.wire/Holder",
            "size": "16",
            "members": [
                { "name": "t", "type": { "kind": "identifier", "identifier": "test.wire/Settings" }, "offset": "0", "size": "16" }
            ]
        },
        {
            "name": "test.wire/EitherHolder",
            "size": "8",
            "members": [
                { "name": "u", "type": { "kind": "identifier", "identifier": "test.wire/Either" }, "offset": "0", "size": "8" }
            ]
        },
        {
            "name": "test.wire/SparseHolder",
            "size": "8",
            "members": [
                { "name": "u", "type": { "kind": "identifier", "identifier": "test.wire/Sparse" }, "offset": "0", "size": "8" }
            ]
        },
        {
            "name": "test.wire/EventHolder",
            "size": "24",
            "members": [
                { "name": "e", "type": { "kind": "identifier", "identifier": "test.wire/Event" }, "offset": "0", "size": "24" }
            ]
        },
        {
            "name": "test.wire/EventOption",
            "size": "24",
            "members": [
                { "name": "e", "type": { "kind": "identifier", "identifier": "test.wire/Event", "nullable": true }, "offset": "0", "size": "24" }
            ]
        },
        {
            "name": "test.wire/Flags",
            "size": "8",
            "members": [
                { "name": "color", "type": { "kind": "identifier", "identifier": "test.wire/Color" }, "offset": "0", "size": "4" },
                { "name": "perms", "type": { "kind": "identifier", "identifier": "test.wire/Perms" }, "offset": "4", "size": "1" }
            ]
        },
        {
            "name": "test.wire/Channels",
            "size": "8",
            "members": [
                { "name": "h", "type": { "kind": "handle", "subtype": "channel" }, "offset": "0", "size": "4" },
                { "name": "opt", "type": { "kind": "handle", "subtype": "channel", "nullable": true }, "offset": "4", "size": "4" }
            ]
        },
        {
            "name": "test.wire/LinkA",
            "size": "8",
            "members": [
                { "name": "next", "type": { "kind": "identifier", "identifier": "test.wire/LinkB", "nullable": true }, "offset": "0", "size": "8" }
            ]
        },
        {
            "name": "test.wire/LinkB",
            "size": "8",
            "members": [
                { "name": "prev", "type": { "kind": "identifier", "identifier": "test.wire/LinkA", "nullable": true }, "offset": "0", "size": "8" }
            ]
        }
    ],
    "table_declarations": [
        {
            "name": "test.wire/Settings",
            "size": "16",
            "members": [
                { "ordinal": "1", "name": "count", "type": { "kind": "primitive", "subtype": "uint8" }, "size": "1" }
            ]
        }
    ],
    "union_declarations": [
        {
            "name": "test.wire/Either",
            "size": "8",
            "members": [
                { "name": "left", "type": { "kind": "primitive", "subtype": "int32" }, "offset": "4", "size": "4" },
                { "name": "right", "type": { "kind": "primitive", "subtype": "bool" }, "offset": "4", "size": "1" }
            ]
        },
        {
            "name": "test.wire/Sparse",
            "size": "8",
            "members": [
                { "reserved": true },
                { "name": "val", "type": { "kind": "primitive", "subtype": "uint8" }, "offset": "4", "size": "1" }
            ]
        }
    ],
    "xunion_declarations": [
        {
            "name": "test.wire/Event",
            "members": [
                { "ordinal": "5", "name": "code", "type": { "kind": "primitive", "subtype": "uint32" }, "size": "4" }
            ]
        }
    ]
}"#;

fn catalog() -> LibraryLoader {
    let mut loader = LibraryLoader::new();
    loader.add_content(WIRE_SCHEMA).expect("schema should load");
    loader.decode_all().expect("schema should resolve cleanly");
    loader
}

fn payload_struct<'l>(loader: &'l LibraryLoader, name: &str) -> &'l Arc<StructDecl> {
    loader
        .get_library_from_name("test.wire")
        .expect("library test.wire")
        .struct_from_name(name)
        .expect("struct declaration")
}

fn decode(loader: &LibraryLoader, name: &str, bytes: &[u8], handles: &[HandleInfo]) -> (Value, Vec<String>) {
    let decl = payload_struct(loader, name);
    let mut decoder = MessageDecoder::new(bytes, handles);
    let value = decoder.decode_message(decl);
    (value, decoder.errors().to_vec())
}

#[test]
fn primitive_struct_decodes_inline() {
    let loader = catalog();
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x2a, 0xff, 0xff, 0xff];
    let (value, errors) = decode(&loader, "test.wire/Primitives", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let object = value.as_object().expect("object");
    assert_eq!(object.field("b").and_then(Value::as_bool), Some(true));
    assert_eq!(object.field("i").and_then(Value::as_i32), Some(-214));
}

#[test]
fn member_offsets_govern_regardless_of_declaration_order() {
    let loader = catalog();
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x2a, 0xff, 0xff, 0xff];
    let (value, errors) = decode(&loader, "test.wire/Shuffled", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    // Reads land on the declared offsets; the tree keeps declaration order.
    assert_eq!(pretty_print(&value, &NO_COLORS, DEFAULT_LINE_WIDTH), "{ i: -214, b: true }");
}

#[test]
fn leftover_bytes_and_handles_are_diagnosed() {
    let loader = catalog();
    let handles = [HandleInfo {
        handle: 1,
        object_type: 0,
        rights: 0,
    }];
    let (value, errors) = decode(&loader, "test.wire/Primitives", &[0u8; 16], &handles);
    assert!(value.as_object().is_some());
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("8 bytes used out of 16"));
    assert!(errors[1].contains("0 handles used out of 1"));
}

#[test]
fn truncated_message_yields_partial_tree() {
    let loader = catalog();
    let (value, errors) = decode(&loader, "test.wire/Primitives", &[0x01, 0x00, 0x00, 0x00], &[]);
    let object = value.as_object().expect("object");
    // The field before the cut decodes; the one after it degrades.
    assert_eq!(object.field("b").and_then(Value::as_bool), Some(true));
    assert_eq!(object.field("i"), Some(&Value::Invalid));
    assert_eq!(errors.len(), 2);
    assert!(errors[1].starts_with("00000004:"));
}

#[test]
fn oversized_length_words_clamp_to_the_buffer() {
    let loader = catalog();
    // A string length word of u64::MAX under a present marker.
    let (value, errors) = decode(&loader, "test.wire/Name", &[0xff; 16], &[]);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("bytes needed for the next object"));
    assert!(errors[1].contains("past the end of the buffer"));
    assert_eq!(value.as_object().and_then(|object| object.field("name")), Some(&Value::Invalid));

    // A vector count reserving nearly the whole address space.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0x0fff_ffff_ffff_ffffu64.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    let (value, errors) = decode(&loader, "test.wire/NameList", &bytes, &[]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("bytes needed for the next object"));
    let Some(Value::Vector(names)) = value.as_object().and_then(|object| object.field("names")) else {
        panic!("names should decode as a clamped vector");
    };
    assert!(names.is_empty());
}

#[test]
fn presence_chains_stop_at_the_nesting_bound() {
    let loader = catalog();
    // A linked chain closed by an absent marker decodes cleanly.
    let mut bytes = vec![0xffu8; 80];
    bytes.extend_from_slice(&[0u8; 8]);
    let (value, errors) = decode(&loader, "test.wire/LinkA", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    assert!(value.as_object().is_some());

    // A chain that keeps promising another node is cut off instead of
    // following every marker.
    let bytes = vec![0xffu8; 808];
    let (value, errors) = decode(&loader, "test.wire/LinkA", &bytes, &[]);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("nests deeper than"));
    assert!(errors[1].contains("not fully decoded"));
    assert!(value.as_object().is_some());
}

#[test]
fn member_offsets_past_the_buffer_are_diagnosed() {
    const FAR_SCHEMA: &str = r#"{
        "version": "0.0.1",
        "name": "test.far",
        "struct_declarations": [
            {
                "name": "test.far/Far",
                "size": "8",
                "members": [
                    { "name": "x", "type": { "kind": "primitive", "subtype": "uint8" }, "offset": "18446744073709551615", "size": "1" }
                ]
            }
        ]
    }"#;
    let mut loader = LibraryLoader::new();
    loader.add_content(FAR_SCHEMA).expect("schema should load");
    loader.decode_all().expect("schema should resolve cleanly");
    let decl = loader
        .get_library_from_name("test.far")
        .expect("library test.far")
        .struct_from_name("test.far/Far")
        .expect("struct declaration");

    let mut decoder = MessageDecoder::new(&[0u8; 8], &[]);
    let value = decoder.decode_message(decl);
    assert_eq!(decoder.errors().len(), 1);
    assert!(decoder.errors()[0].contains("past the end of the buffer"));
    assert_eq!(value.as_object().and_then(|object| object.field("x")), Some(&Value::Invalid));
}

#[test]
fn null_and_empty_vectors_are_distinct() {
    let loader = catalog();
    let mut bytes = vec![0u8; 24];
    bytes.extend_from_slice(&[0xff; 8]);
    let (value, errors) = decode(&loader, "test.wire/Vectors", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let object = value.as_object().expect("object");
    assert_eq!(object.field("absent"), Some(&Value::Null));
    assert_eq!(object.field("empty"), Some(&Value::Vector(Vec::new())));
}

#[test]
fn strings_decode_with_lossy_utf8() {
    let loader = catalog();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&5u64.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    bytes.extend_from_slice(b"hello");
    bytes.extend_from_slice(&[0u8; 3]);
    let (value, errors) = decode(&loader, "test.wire/Name", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let object = value.as_object().expect("object");
    assert_eq!(object.field("name").and_then(Value::as_str), Some("hello"));

    // Invalid UTF-8 is replaced, not rejected.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2u64.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    bytes.extend_from_slice(&[0xff, 0xfe]);
    bytes.extend_from_slice(&[0u8; 6]);
    let (value, errors) = decode(&loader, "test.wire/Name", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let object = value.as_object().expect("object");
    assert_eq!(
        object.field("name").and_then(Value::as_str),
        Some("\u{fffd}\u{fffd}")
    );
}

#[test]
fn out_of_line_objects_follow_declaration_order() {
    let loader = catalog();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    bytes.push(b'a');
    bytes.extend_from_slice(&[0u8; 7]);
    bytes.push(b'b');
    bytes.extend_from_slice(&[0u8; 7]);
    let (value, errors) = decode(&loader, "test.wire/TwoStrings", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let object = value.as_object().expect("object");
    assert_eq!(object.field("first").and_then(Value::as_str), Some("a"));
    assert_eq!(object.field("second").and_then(Value::as_str), Some("b"));
}

#[test]
fn nullable_struct_present_and_absent() {
    let loader = catalog();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&[0xff; 8]);
    bytes.extend_from_slice(&7u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 4]);
    let (value, errors) = decode(&loader, "test.wire/Outer", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let inner = value
        .as_object()
        .and_then(|object| object.field("inner"))
        .and_then(Value::as_object)
        .expect("inner object");
    assert_eq!(inner.field("x").and_then(Value::as_u32), Some(7));

    let (value, errors) = decode(&loader, "test.wire/Outer", &[0u8; 8], &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let object = value.as_object().expect("object");
    assert_eq!(object.field("inner"), Some(&Value::Null));
}

#[test]
fn fixed_arrays_decode_inline() {
    let loader = catalog();
    let bytes = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
    let (value, errors) = decode(&loader, "test.wire/Fixed", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let object = value.as_object().expect("object");
    assert_eq!(
        object.field("a").and_then(Value::as_sequence),
        Some(&[Value::U16(1), Value::U16(2), Value::U16(3)][..])
    );
}

#[test]
fn vector_of_strings_nests_out_of_line() {
    let loader = catalog();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2u64.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    // Element headers first, then both string payloads.
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    bytes.extend_from_slice(&2u64.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    bytes.push(b'a');
    bytes.extend_from_slice(&[0u8; 7]);
    bytes.extend_from_slice(b"bc");
    bytes.extend_from_slice(&[0u8; 6]);
    let (value, errors) = decode(&loader, "test.wire/NameList", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let names = value
        .as_object()
        .and_then(|object| object.field("names"))
        .and_then(Value::as_sequence)
        .expect("names vector");
    assert_eq!(names, &[Value::from("a"), Value::from("bc")][..]);
}

fn table_message() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2u64.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    // Envelope for ordinal 1, then one for the unknown ordinal 2.
    for _ in 0..2 {
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&[0xff; 8]);
    }
    bytes.push(7);
    bytes.extend_from_slice(&[0u8; 7]);
    bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x00, 0x00, 0x00]);
    bytes
}

#[test]
fn tables_keep_unknown_ordinals() {
    let loader = catalog();
    let (value, errors) = decode(&loader, "test.wire/Holder", &table_message(), &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let table = value
        .as_object()
        .and_then(|object| object.field("t"))
        .and_then(Value::as_table)
        .expect("table");
    assert_eq!(table.len(), 2);
    assert_eq!(table.field("count").and_then(Value::as_u8), Some(7));
    assert_eq!(table.entries()[1].ordinal, 2);
    assert_eq!(table.entries()[1].name, "unknown$2");
    assert_eq!(
        table.entries()[1].value,
        Value::Raw(vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x00, 0x00, 0x00])
    );
}

#[test]
fn absent_table_is_an_error() {
    let loader = catalog();
    let (value, errors) = decode(&loader, "test.wire/Holder", &[0u8; 16], &[]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("tables are not nullable"));
    let object = value.as_object().expect("object");
    assert_eq!(object.field("t"), Some(&Value::Invalid));
}

#[test]
fn envelope_count_mismatch_is_diagnosed() {
    let loader = catalog();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1u64.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    // The envelope claims 16 bytes; a uint8 payload only uses 8.
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&[0xff; 8]);
    bytes.push(7);
    bytes.extend_from_slice(&[0u8; 15]);
    let (value, errors) = decode(&loader, "test.wire/Holder", &bytes, &[]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("declares 16 bytes, content used 8"));
    // The decoded entry survives alongside the diagnostic.
    let table = value
        .as_object()
        .and_then(|object| object.field("t"))
        .and_then(Value::as_table)
        .expect("table");
    assert_eq!(table.field("count").and_then(Value::as_u8), Some(7));
}

#[test]
fn unions_select_members_by_tag() {
    let loader = catalog();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&(-1i32).to_le_bytes());
    let (value, errors) = decode(&loader, "test.wire/EitherHolder", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let union = value
        .as_object()
        .and_then(|object| object.field("u"))
        .and_then(Value::as_union)
        .expect("union");
    assert_eq!(union.member(), "left");
    assert_eq!(union.value().as_i32(), Some(-1));

    // A tag past the member list is an anomaly.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&7u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 4]);
    let (value, errors) = decode(&loader, "test.wire/EitherHolder", &bytes, &[]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("no member with tag 7"));
    assert_eq!(value.as_object().and_then(|object| object.field("u")), Some(&Value::Invalid));

    // So is a tag landing on a reserved slot.
    let (value, errors) = decode(&loader, "test.wire/SparseHolder", &[0u8; 8], &[]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("reserved tag 0"));
    assert_eq!(value.as_object().and_then(|object| object.field("u")), Some(&Value::Invalid));

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.push(5);
    bytes.extend_from_slice(&[0u8; 3]);
    let (value, errors) = decode(&loader, "test.wire/SparseHolder", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let union = value
        .as_object()
        .and_then(|object| object.field("u"))
        .and_then(Value::as_union)
        .expect("union");
    assert_eq!(union.member(), "val");
    assert_eq!(union.value().as_u8(), Some(5));
}

fn xunion_message(ordinal: u64, payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&ordinal.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    if payload.is_empty() {
        bytes.extend_from_slice(&[0u8; 8]);
    } else {
        bytes.extend_from_slice(&[0xff; 8]);
    }
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn extensible_unions_cover_all_ordinal_paths() {
    let loader = catalog();

    let mut payload = Vec::new();
    payload.extend_from_slice(&42u32.to_le_bytes());
    payload.extend_from_slice(&[0u8; 4]);
    let (value, errors) = decode(&loader, "test.wire/EventHolder", &xunion_message(5, &payload), &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let union = value
        .as_object()
        .and_then(|object| object.field("e"))
        .and_then(Value::as_union)
        .expect("union");
    assert_eq!(union.member(), "code");
    assert_eq!(union.value().as_u32(), Some(42));

    // Unknown ordinals keep their payload raw, without diagnostics.
    let raw = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x00, 0x00, 0x00];
    let (value, errors) = decode(&loader, "test.wire/EventHolder", &xunion_message(9, &raw), &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let union = value
        .as_object()
        .and_then(|object| object.field("e"))
        .and_then(Value::as_union)
        .expect("union");
    assert_eq!(union.member(), "unknown$9");
    assert_eq!(union.value(), &Value::Raw(raw.to_vec()));

    // Ordinal zero reads as null, which a non-nullable field may not be.
    let (value, errors) = decode(&loader, "test.wire/EventHolder", &xunion_message(0, &[]), &[]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("non-nullable"));
    assert_eq!(value.as_object().and_then(|object| object.field("e")), Some(&Value::Null));

    let (value, errors) = decode(&loader, "test.wire/EventOption", &xunion_message(0, &[]), &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    assert_eq!(value.as_object().and_then(|object| object.field("e")), Some(&Value::Null));

    // Ordinal zero must not carry content. The stray payload also leaves the
    // message short of full consumption, so two diagnostics come back.
    let stray = xunion_message(0, &[1, 2, 3, 4, 5, 6, 7, 8]);
    let (value, errors) = decode(&loader, "test.wire/EventOption", &stray, &[]);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("null envelope carries content"));
    assert_eq!(value.as_object().and_then(|object| object.field("e")), Some(&Value::Invalid));
}

#[test]
fn enums_and_bits_resolve_names() {
    let loader = catalog();
    let bytes = [0x02, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00];
    let (value, errors) = decode(&loader, "test.wire/Flags", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let object = value.as_object().expect("object");
    let Some(Value::Enum(color)) = object.field("color") else {
        panic!("color should decode as an enum");
    };
    assert_eq!(color.name().as_deref(), Some("BLUE"));
    assert_eq!(color.raw().as_u32(), Some(2));
    let Some(Value::Bits(perms)) = object.field("perms") else {
        panic!("perms should decode as bits");
    };
    assert_eq!(perms.name().as_deref(), Some("READ|WRITE"));

    // A value no member covers keeps its bytes but loses the name.
    let bytes = [0x09, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    let (value, errors) = decode(&loader, "test.wire/Flags", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let Some(Value::Enum(color)) = value.as_object().and_then(|object| object.field("color")) else {
        panic!("color should decode as an enum");
    };
    assert_eq!(color.name(), None);
    assert_eq!(color.raw().as_u32(), Some(9));
}

#[test]
fn handles_pop_in_positional_order() {
    let loader = catalog();
    let transferred = HandleInfo {
        handle: 0x1234,
        object_type: 3,
        rights: 0x8000,
    };

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&[0xff; 4]);
    bytes.extend_from_slice(&[0u8; 4]);
    let (value, errors) = decode(&loader, "test.wire/Channels", &bytes, &[transferred]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let object = value.as_object().expect("object");
    assert_eq!(object.field("h"), Some(&Value::Handle(transferred)));
    assert_eq!(object.field("opt"), Some(&Value::Handle(HandleInfo::default())));

    // Anything but the two sentinels is an anomaly.
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&5u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 4]);
    let (value, errors) = decode(&loader, "test.wire/Channels", &bytes, &[]);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("invalid value 00000005 for handle"));
    let object = value.as_object().expect("object");
    assert_eq!(object.field("h"), Some(&Value::Handle(HandleInfo::default())));
}

#[test]
fn resolution_is_idempotent_and_shared() {
    let loader = catalog();
    // A second full resolution pass is a no-op.
    loader.decode_all().expect("second resolution");

    let a = payload_struct(&loader, "test.wire/LinkA");
    let b = payload_struct(&loader, "test.wire/LinkB");
    let Type::Struct { decl, nullable: true } = a.members()[0].ty() else {
        panic!("LinkA.next should be a nullable struct");
    };
    // The type graph shares declarations instead of copying them.
    assert!(Arc::ptr_eq(decl, b));
    a.decode_types(&loader);
    assert_eq!(a.members()[0].ty(), &Type::Struct { decl: b.clone(), nullable: true });

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&[0xff; 8]);
    bytes.extend_from_slice(&[0u8; 8]);
    let (value, errors) = decode(&loader, "test.wire/LinkA", &bytes, &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    let next = value
        .as_object()
        .and_then(|object| object.field("next"))
        .and_then(Value::as_object)
        .expect("linked node");
    assert_eq!(next.field("prev"), Some(&Value::Null));
}

#[test]
fn decoded_trees_print_and_export() {
    let loader = catalog();
    let (value, errors) = decode(&loader, "test.wire/Holder", &table_message(), &[]);
    assert!(errors.is_empty(), "diagnostics: {:?}", errors);
    assert_eq!(
        pretty_print(&value, &NO_COLORS, DEFAULT_LINE_WIDTH),
        "{ t: { count: 7, unknown$2: de ad be ef 00 00 00 00 } }"
    );
    assert_eq!(
        export(&value),
        json!({ "t": { "count": 7, "unknown$2": "de ad be ef 00 00 00 00" } })
    );
}
