// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

#![no_main]

use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;
use weft::{HandleInfo, LibraryLoader, MessageDecoder, MessageHeader};

// One struct touching every wire shape: scalars, strings, vectors, arrays,
// handles, tables, both union flavors, enums, bits, and a nullable struct.
const FUZZ_SCHEMA: &str = r#"{
    "version": "0.0.1",
    "name": "fuzz.wire",
    "enum_declarations": [
        {
            "name": "fuzz.wire/Color",
            "type": "uint8",
            "members": [
                { "name": "A", "value": "1" },
                { "name": "B", "value": "2" }
            ]
        }
    ],
    "bits_declarations": [
        {
            "name": "fuzz.wire/Mask",
            "type": { "kind": "primitive", "subtype": "uint16" },
            "members": [
                { "name": "X", "value": "1" },
                { "name": "Y", "value": "2" }
            ]
        }
    ],
    "struct_declarations": [
        {
            "name": "fuzz.wire/Point",
            "size": "8",
            "members": [
                { "name": "x", "type": { "kind": "primitive", "subtype": "int32" }, "offset": "0", "size": "4" },
                { "name": "y", "type": { "kind": "primitive", "subtype": "int32" }, "offset": "4", "size": "4" }
            ]
        },
        {
            "name": "fuzz.wire/Everything",
            "size": "120",
            "members": [
                { "name": "b", "type": { "kind": "primitive", "subtype": "bool" }, "offset": "0", "size": "1" },
                { "name": "i", "type": { "kind": "primitive", "subtype": "int64" }, "offset": "8", "size": "8" },
                { "name": "s", "type": { "kind": "string", "nullable": true }, "offset": "16", "size": "16" },
                { "name": "v", "type": { "kind": "vector", "element_type": { "kind": "primitive", "subtype": "uint32" } }, "offset": "32", "size": "16" },
                { "name": "a", "type": { "kind": "array", "element_type": { "kind": "primitive", "subtype": "uint8" }, "element_count": "4" }, "offset": "48", "size": "4" },
                { "name": "h", "type": { "kind": "handle", "subtype": "channel", "nullable": true }, "offset": "52", "size": "4" },
                { "name": "t", "type": { "kind": "identifier", "identifier": "fuzz.wire/Flags" }, "offset": "56", "size": "16" },
                { "name": "u", "type": { "kind": "identifier", "identifier": "fuzz.wire/Choice" }, "offset": "72", "size": "8" },
                { "name": "x", "type": { "kind": "identifier", "identifier": "fuzz.wire/Extra" }, "offset": "80", "size": "24" },
                { "name": "color", "type": { "kind": "identifier", "identifier": "fuzz.wire/Color" }, "offset": "104", "size": "1" },
                { "name": "perms", "type": { "kind": "identifier", "identifier": "fuzz.wire/Mask" }, "offset": "106", "size": "2" },
                { "name": "inner", "type": { "kind": "identifier", "identifier": "fuzz.wire/Point", "nullable": true }, "offset": "112", "size": "8" }
            ]
        }
    ],
    "table_declarations": [
        {
            "name": "fuzz.wire/Flags",
            "size": "16",
            "members": [
                { "ordinal": "1", "name": "on", "type": { "kind": "primitive", "subtype": "bool" }, "size": "1" },
                { "ordinal": "2", "reserved": true }
            ]
        }
    ],
    "union_declarations": [
        {
            "name": "fuzz.wire/Choice",
            "size": "8",
            "members": [
                { "name": "left", "type": { "kind": "primitive", "subtype": "int32" }, "offset": "4", "size": "4" },
                { "name": "right", "type": { "kind": "primitive", "subtype": "float32" }, "offset": "4", "size": "4" }
            ]
        }
    ],
    "xunion_declarations": [
        {
            "name": "fuzz.wire/Extra",
            "members": [
                { "ordinal": "1", "name": "label", "type": { "kind": "string" }, "size": "16" }
            ]
        }
    ]
}"#;

const HANDLES: [HandleInfo; 3] = [
    HandleInfo { handle: 0x101, object_type: 0, rights: 0 },
    HandleInfo { handle: 0x102, object_type: 0, rights: 0 },
    HandleInfo { handle: 0x103, object_type: 0, rights: 0 },
];

fn catalog() -> &'static LibraryLoader {
    static LOADER: OnceLock<LibraryLoader> = OnceLock::new();
    LOADER.get_or_init(|| {
        let mut loader = LibraryLoader::new();
        loader.add_content(FUZZ_SCHEMA).expect("fuzz schema loads");
        loader.decode_all().expect("fuzz schema resolves");
        loader
    })
}

fuzz_target!(|data: &[u8]| {
    let loader = catalog();
    let decl = loader
        .get_library_from_name("fuzz.wire")
        .and_then(|library| library.struct_from_name("fuzz.wire/Everything"))
        .expect("fuzz schema declares Everything");

    // Fuzz the header parser
    let _ = MessageHeader::parse(data);

    // First input byte steers how many handles ride along, so the handle
    // sentinel paths see both exhaustion and surplus.
    let take = data.first().map_or(0, |b| *b as usize % (HANDLES.len() + 1));

    // Fuzz payload decoding; arbitrary bytes must never panic, only
    // produce a partial tree plus diagnostics.
    let mut decoder = MessageDecoder::new(data, &HANDLES[..take]);
    let _ = decoder.decode_message(decl);
});
