// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Interface declarations: protocols and their methods.
//!
//! Methods are parsed eagerly at load time because the ordinal index has to
//! answer lookups before anything is decoded; the request and response
//! payload structs they carry resolve lazily like every other declaration.

use std::sync::Arc;

use serde_json::Value as Json;

use crate::schema::library::{field_array, field_str, field_u64, ErrorFlag, StructDecl};
use crate::schema::loader::LibraryLoader;

/// A protocol declaration: a named set of methods.
pub struct Interface {
    name: String,
    methods: Vec<Arc<InterfaceMethod>>,
}

impl Interface {
    pub(crate) fn new(json: &Json, errors: &Arc<ErrorFlag>) -> Option<Interface> {
        let name = field_str(json, "interface", "name", errors)?.to_string();
        let ctx = format!("interface {}", name);
        let mut methods = Vec::new();
        if let Some(list) = field_array(json, &ctx, "methods", errors) {
            for method in list {
                if let Some(parsed) = InterfaceMethod::new(&name, method, errors) {
                    methods.push(Arc::new(parsed));
                }
            }
        }
        Some(Interface { name, methods })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[Arc<InterfaceMethod>] {
        &self.methods
    }
}

/// One method of an interface, with its transaction ordinal and optional
/// request/response payloads.
pub struct InterfaceMethod {
    interface_name: String,
    name: String,
    ordinal: u64,
    is_composed: bool,
    request: Option<Arc<StructDecl>>,
    response: Option<Arc<StructDecl>>,
}

impl InterfaceMethod {
    fn new(interface_name: &str, json: &Json, errors: &Arc<ErrorFlag>) -> Option<InterfaceMethod> {
        let ctx = format!("interface {} method", interface_name);
        let name = field_str(json, &ctx, "name", errors)?.to_string();
        let ctx = format!("method {}.{}", interface_name, name);
        let ordinal = field_u64(json, &ctx, "ordinal", errors)?;
        let is_composed = json.get("is_composed").and_then(Json::as_bool).unwrap_or(false);
        let request = payload(interface_name, &name, "request", json, errors);
        let response = payload(interface_name, &name, "response", json, errors);
        Some(InterfaceMethod {
            interface_name: interface_name.to_string(),
            name,
            ordinal,
            is_composed,
            request,
            response,
        })
    }

    pub fn interface_name(&self) -> &str {
        &self.interface_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fully_qualified_name(&self) -> String {
        format!("{}.{}", self.interface_name, self.name)
    }

    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// True for methods pulled in through protocol composition; the same
    /// ordinal then also appears on a concrete (non-composed) declaration.
    pub fn is_composed(&self) -> bool {
        self.is_composed
    }

    /// Request payload struct, member types resolved. `None` for
    /// response-only methods (events).
    pub fn request(&self, loader: &LibraryLoader) -> Option<&Arc<StructDecl>> {
        if let Some(decl) = &self.request {
            decl.decode_types(loader);
        }
        self.request.as_ref()
    }

    /// Response payload struct, member types resolved. `None` for one-way
    /// methods.
    pub fn response(&self, loader: &LibraryLoader) -> Option<&Arc<StructDecl>> {
        if let Some(decl) = &self.response {
            decl.decode_types(loader);
        }
        self.response.as_ref()
    }

    pub(crate) fn decode_types(&self, loader: &LibraryLoader) {
        if let Some(decl) = &self.request {
            decl.decode_types(loader);
        }
        if let Some(decl) = &self.response {
            decl.decode_types(loader);
        }
    }
}

/// Build the anonymous payload struct for one direction of a method.
/// Parameter objects have the struct-member shape; offsets are relative to
/// the first byte after the message header.
fn payload(interface_name: &str, method_name: &str, direction: &str, json: &Json, errors: &Arc<ErrorFlag>) -> Option<Arc<StructDecl>> {
    let (has_key, params_key, size_key) = match direction {
        "request" => ("has_request", "maybe_request", "maybe_request_size"),
        _ => ("has_response", "maybe_response", "maybe_response_size"),
    };
    if !json.get(has_key).and_then(Json::as_bool).unwrap_or(false) {
        return None;
    }
    let ctx = format!("method {}.{}", interface_name, method_name);
    let params = field_array(json, &ctx, params_key, errors)?.clone();
    let size = field_u64(json, &ctx, size_key, errors).unwrap_or(0);
    Some(StructDecl::anonymous(
        format!("{}.{} {}", interface_name, method_name, direction),
        size,
        params,
        errors,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_payloads_follow_direction_flags() {
        let errors = Arc::new(ErrorFlag::default());
        let interface = Interface::new(
            &json!({
                "name": "test/Echo",
                "methods": [
                    {
                        "ordinal": "12345",
                        "name": "EchoString",
                        "is_composed": false,
                        "has_request": true,
                        "maybe_request": [],
                        "maybe_request_size": "0",
                        "has_response": true,
                        "maybe_response": [],
                        "maybe_response_size": "0"
                    },
                    {
                        "ordinal": "778899",
                        "name": "OnTick",
                        "is_composed": false,
                        "has_request": false,
                        "has_response": true,
                        "maybe_response": [],
                        "maybe_response_size": "0"
                    }
                ]
            }),
            &errors,
        )
        .expect("interface should parse");

        let loader = LibraryLoader::new();
        assert_eq!(interface.name(), "test/Echo");
        assert_eq!(interface.methods().len(), 2);

        let echo = &interface.methods()[0];
        assert_eq!(echo.ordinal(), 12345);
        assert_eq!(echo.fully_qualified_name(), "test/Echo.EchoString");
        assert!(echo.request(&loader).is_some());
        assert!(echo.response(&loader).is_some());

        let event = &interface.methods()[1];
        assert!(event.request(&loader).is_none());
        assert!(event.response(&loader).is_some());
        assert!(!errors.get());
    }

    #[test]
    fn payload_struct_names_the_method() {
        let errors = Arc::new(ErrorFlag::default());
        let method = json!({
            "ordinal": "1",
            "name": "Send",
            "has_request": true,
            "maybe_request": [
                {"name": "v", "type": {"kind": "primitive", "subtype": "uint8"}, "offset": "0", "size": "1"}
            ],
            "maybe_request_size": "8"
        });
        let interface = Interface::new(
            &json!({"name": "test/Pipe", "methods": [method]}),
            &errors,
        )
        .expect("interface should parse");
        let loader = LibraryLoader::new();
        let request = interface.methods()[0].request(&loader).expect("request payload");
        assert_eq!(request.name(), "test/Pipe.Send request");
        assert_eq!(request.size(), 8);
        assert_eq!(request.members().len(), 1);
    }
}
