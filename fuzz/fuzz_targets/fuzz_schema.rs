// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

#![no_main]

use libfuzzer_sys::fuzz_target;
use weft::LibraryLoader;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string (schemas are JSON text)
    if let Ok(text) = std::str::from_utf8(data) {
        // Fuzz schema ingestion
        let mut loader = LibraryLoader::new();
        if loader.add_content(text).is_ok() {
            // Fuzz type resolution over whatever declarations survived
            let _ = loader.decode_all();
        }
    }
});
