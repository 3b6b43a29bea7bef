// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 weft.dev

//! Message decoder: a bounds-checked cursor over one captured message.
//!
//! The decoder never fails and never panics. Out-of-range reads, bad
//! presence markers and count mismatches are recorded as diagnostics while
//! decoding continues with placeholder values, so a partial tree comes back
//! even for badly corrupted input. A decode is clean when `errors()` is
//! empty afterwards.

use std::sync::Arc;

use crate::schema::library::StructDecl;
use crate::wire::types::Type;
use crate::wire::value::{ObjectValue, Value};

/// Presence word of an out-of-line object that is present.
pub const ALLOC_PRESENT: u64 = u64::MAX;
/// Presence word of an absent out-of-line object.
pub const ALLOC_ABSENT: u64 = 0;
/// Inline marker of a transferred handle.
pub const HANDLE_PRESENT: u32 = u32::MAX;
/// Inline marker of an absent handle.
pub const HANDLE_ABSENT: u32 = 0;
/// Envelope header: u32 byte count, u32 handle count, u64 presence word.
pub const ENVELOPE_SIZE: u64 = 16;

/// Round `offset` up to the out-of-line object alignment boundary,
/// saturating near `u64::MAX` instead of wrapping.
pub fn align_to_eight(offset: u64) -> u64 {
    offset.saturating_add(7) & !7
}

/// Deepest value nesting the decoder will follow; deeper input is cut off
/// with a diagnostic.
const MAX_NESTING_DEPTH: usize = 64;

/// Numeric record of one transferred capability. The decoder only reports
/// identifiers; ownership of the capability stays with whoever captured the
/// message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandleInfo {
    pub handle: u32,
    pub object_type: u32,
    pub rights: u32,
}

/// Outcome of reading a presence word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    Absent,
    /// Present; carries the offset reserved for the out-of-line payload.
    Present(u64),
}

macro_rules! impl_value_at {
    ($name:ident, $type:ty, $size:expr) => {
        /// Little-endian read at an absolute offset. Reads past the end of
        /// the buffer record an error and return `None`.
        pub fn $name(&mut self, offset: u64) -> Option<$type> {
            let slice = self.get_address(offset, $size)?;
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(slice);
            Some(<$type>::from_le_bytes(bytes))
        }
    };
}

/// Decoder for one message buffer.
///
/// Inline data is addressed absolutely; out-of-line objects are placed by a
/// forward-only allocation counter in encounter order, which is exactly the
/// order a conforming encoder emits them. Envelopes run in a sub-decoder
/// bounded to their declared byte and handle counts, so a lying envelope
/// cannot pull the cursor off the rest of the message.
pub struct MessageDecoder<'a> {
    bytes: &'a [u8],
    handles: &'a [HandleInfo],
    /// Offset of this buffer within the outermost message; diagnostics are
    /// reported in absolute coordinates.
    base_offset: u64,
    next_object_offset: u64,
    handle_pos: usize,
    depth: usize,
    errors: Vec<String>,
}

impl<'a> MessageDecoder<'a> {
    /// Decoder over a message payload (header already stripped) and its
    /// handle table.
    pub fn new(bytes: &'a [u8], handles: &'a [HandleInfo]) -> MessageDecoder<'a> {
        MessageDecoder {
            bytes,
            handles,
            base_offset: 0,
            next_object_offset: 0,
            handle_pos: 0,
            depth: 0,
            errors: Vec::new(),
        }
    }

    /// Sub-decoder over one envelope's slice of bytes and handles.
    fn envelope_decoder(&self, payload_offset: u64, num_bytes: u64, num_handles: usize) -> MessageDecoder<'a> {
        let start = payload_offset.min(self.bytes.len() as u64) as usize;
        let end = payload_offset.saturating_add(num_bytes).min(self.bytes.len() as u64) as usize;
        let handle_start = self.handle_pos.min(self.handles.len());
        let handle_end = self.handle_pos.saturating_add(num_handles).min(self.handles.len());
        MessageDecoder {
            bytes: &self.bytes[start..end],
            handles: &self.handles[handle_start..handle_end],
            base_offset: self.base_offset + payload_offset,
            next_object_offset: 0,
            handle_pos: 0,
            // Nesting carries across envelope boundaries.
            depth: self.depth,
            errors: Vec::new(),
        }
    }

    pub fn num_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn num_handles(&self) -> usize {
        self.handles.len()
    }

    /// Diagnostics collected so far, in encounter order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// True when no diagnostic has been recorded.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn add_error(&mut self, message: String) {
        self.errors.push(message);
    }

    pub(crate) fn absolute_offset(&self, offset: u64) -> u64 {
        self.base_offset.saturating_add(offset)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Borrow `length` bytes at `offset`, or record an error and return
    /// `None` if the range leaves the buffer.
    pub fn get_address(&mut self, offset: u64, length: u64) -> Option<&'a [u8]> {
        let bytes = self.bytes;
        let end = offset.checked_add(length).filter(|end| *end <= bytes.len() as u64);
        let Some(end) = end else {
            self.add_error(format!(
                "{:08x}: {} bytes requested past the end of the buffer",
                self.absolute_offset(offset),
                length
            ));
            return None;
        };
        Some(&bytes[offset as usize..end as usize])
    }

    impl_value_at!(u8_at, u8, 1);
    impl_value_at!(i8_at, i8, 1);
    impl_value_at!(u16_at, u16, 2);
    impl_value_at!(i16_at, i16, 2);
    impl_value_at!(u32_at, u32, 4);
    impl_value_at!(i32_at, i32, 4);
    impl_value_at!(u64_at, u64, 8);
    impl_value_at!(i64_at, i64, 8);
    impl_value_at!(f32_at, f32, 4);
    impl_value_at!(f64_at, f64, 8);

    // -----------------------------------------------------------------------
    // Out-of-line bookkeeping
    // -----------------------------------------------------------------------

    /// Reserve `size` bytes (rounded up to alignment) at the next
    /// out-of-line slot. The counter only moves forward; a reservation past
    /// the end clamps to the buffer size and records an error.
    pub fn skip_object(&mut self, size: u64) {
        let new_offset = align_to_eight(self.next_object_offset.saturating_add(size));
        if new_offset > self.num_bytes() {
            self.add_error(format!(
                "{:08x}: {} bytes needed for the next object, only {} available",
                self.base_offset + self.next_object_offset,
                size,
                self.num_bytes() - self.next_object_offset
            ));
            self.next_object_offset = self.num_bytes();
            return;
        }
        self.next_object_offset = new_offset;
    }

    /// Read the presence word of a nullable object at `offset`; when
    /// present, reserve `size` bytes of out-of-line space for its payload.
    pub fn decode_nullable_header(&mut self, offset: u64, size: u64) -> Option<Presence> {
        let presence = self.u64_at(offset)?;
        match presence {
            ALLOC_ABSENT => Some(Presence::Absent),
            ALLOC_PRESENT => {
                let payload_offset = self.next_object_offset;
                self.skip_object(size);
                Some(Presence::Present(payload_offset))
            }
            other => {
                self.add_error(format!(
                    "{:08x}: invalid presence marker {:016x}",
                    self.base_offset + offset,
                    other
                ));
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Structured decoding
    // -----------------------------------------------------------------------

    /// Decode the primary object of a message. The partial tree always comes
    /// back; leftover bytes or handles at the end are diagnostics like any
    /// other anomaly.
    pub fn decode_message(&mut self, decl: &Arc<StructDecl>) -> Value {
        self.skip_object(decl.size());
        let value = self.decode_struct(decl, 0);
        if self.next_object_offset != self.num_bytes() {
            self.add_error(format!(
                "message not fully decoded ({} bytes used out of {})",
                self.next_object_offset,
                self.num_bytes()
            ));
        }
        if self.handle_pos != self.handles.len() {
            self.add_error(format!(
                "message not fully decoded ({} handles used out of {})",
                self.handle_pos,
                self.handles.len()
            ));
        }
        value
    }

    /// Decode a struct whose inline block starts at `offset`.
    pub fn decode_struct(&mut self, decl: &StructDecl, offset: u64) -> Value {
        let mut object = ObjectValue::new();
        for member in decl.members() {
            let value = member.ty().decode(self, offset.saturating_add(member.offset()));
            object.push(member.name().to_string(), value);
        }
        Value::Object(object)
    }

    /// Decode one standalone out-of-line value: reserve its inline block at
    /// the front of this buffer, then decode it there. Envelope sub-decoders
    /// enter through here.
    pub fn decode_value(&mut self, ty: &Type) -> Value {
        self.skip_object(ty.inline_size());
        ty.decode(self, 0)
    }

    /// Step into a nested value. Past the nesting bound this records a
    /// diagnostic and refuses; the caller substitutes a placeholder.
    pub(crate) fn enter_nested(&mut self, offset: u64) -> bool {
        if self.depth >= MAX_NESTING_DEPTH {
            self.add_error(format!(
                "{:08x}: message nests deeper than {} levels",
                self.absolute_offset(offset),
                MAX_NESTING_DEPTH
            ));
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave_nested(&mut self) {
        self.depth -= 1;
    }

    // -----------------------------------------------------------------------
    // Envelopes
    // -----------------------------------------------------------------------

    fn envelope_header(&mut self, offset: u64) -> Option<(u32, u32, u64)> {
        let num_bytes = self.u32_at(offset)?;
        let num_handles = self.u32_at(offset + 4)?;
        let presence = self.u64_at(offset + 8)?;
        Some((num_bytes, num_handles, presence))
    }

    /// Decode an envelope whose content type is known. The payload runs in a
    /// sub-decoder bounded to the declared counts; whatever happens inside,
    /// this decoder's cursors then advance by exactly those counts.
    pub fn decode_envelope(&mut self, offset: u64, ty: &Type) -> Value {
        let Some((num_bytes, num_handles, presence)) = self.envelope_header(offset) else {
            return Value::Invalid;
        };
        match presence {
            ALLOC_ABSENT => {
                if num_bytes != 0 || num_handles != 0 {
                    self.add_error(format!(
                        "{:08x}: absent envelope declares {} bytes and {} handles",
                        self.base_offset + offset,
                        num_bytes,
                        num_handles
                    ));
                }
                Value::Null
            }
            ALLOC_PRESENT => {
                let payload_offset = self.next_object_offset;
                let mut envelope_decoder = self.envelope_decoder(payload_offset, u64::from(num_bytes), num_handles as usize);
                let value = envelope_decoder.decode_value(ty);
                self.finish_envelope(envelope_decoder, offset, num_bytes, num_handles);
                value
            }
            other => {
                self.add_error(format!(
                    "{:08x}: invalid presence marker {:016x} in envelope",
                    self.base_offset + offset,
                    other
                ));
                Value::Invalid
            }
        }
    }

    fn finish_envelope(&mut self, envelope_decoder: MessageDecoder<'a>, offset: u64, num_bytes: u32, num_handles: u32) {
        if envelope_decoder.next_object_offset != envelope_decoder.num_bytes() {
            self.add_error(format!(
                "{:08x}: envelope declares {} bytes, content used {}",
                self.base_offset + offset,
                num_bytes,
                envelope_decoder.next_object_offset
            ));
        }
        if envelope_decoder.handle_pos != envelope_decoder.num_handles() {
            self.add_error(format!(
                "{:08x}: envelope declares {} handles, content used {}",
                self.base_offset + offset,
                num_handles,
                envelope_decoder.handle_pos
            ));
        }
        self.errors.extend(envelope_decoder.errors);
        self.skip_object(u64::from(num_bytes));
        self.consume_handles(num_handles as usize, offset);
    }

    /// Decode an envelope with no matching schema member: keep the payload
    /// bytes raw and consume the declared handles.
    pub fn decode_unknown_envelope(&mut self, offset: u64) -> Value {
        let Some((num_bytes, num_handles, presence)) = self.envelope_header(offset) else {
            return Value::Invalid;
        };
        match presence {
            ALLOC_ABSENT => {
                if num_bytes != 0 || num_handles != 0 {
                    self.add_error(format!(
                        "{:08x}: absent envelope declares {} bytes and {} handles",
                        self.base_offset + offset,
                        num_bytes,
                        num_handles
                    ));
                }
                Value::Null
            }
            ALLOC_PRESENT => {
                let payload_offset = self.next_object_offset;
                let value = match self.get_address(payload_offset, u64::from(num_bytes)) {
                    Some(bytes) => Value::Raw(bytes.to_vec()),
                    None => Value::Invalid,
                };
                self.skip_object(u64::from(num_bytes));
                self.consume_handles(num_handles as usize, offset);
                value
            }
            other => {
                self.add_error(format!(
                    "{:08x}: invalid presence marker {:016x} in envelope",
                    self.base_offset + offset,
                    other
                ));
                Value::Invalid
            }
        }
    }

    /// Skip over one envelope (reserved ordinals): shape is validated, the
    /// content is dropped.
    pub fn skip_envelope(&mut self, offset: u64) {
        let _ = self.decode_unknown_envelope(offset);
    }

    /// Check that an envelope at `offset` is fully empty. Used for the zero
    /// ordinal of extensible unions, which must not carry content.
    pub fn check_null_envelope(&mut self, offset: u64) -> bool {
        let Some((num_bytes, num_handles, presence)) = self.envelope_header(offset) else {
            return false;
        };
        if num_bytes != 0 || num_handles != 0 || presence != ALLOC_ABSENT {
            self.add_error(format!(
                "{:08x}: null envelope carries content ({} bytes, {} handles, presence {:016x})",
                self.base_offset + offset,
                num_bytes,
                num_handles,
                presence
            ));
            return false;
        }
        true
    }

    fn consume_handles(&mut self, count: usize, offset: u64) {
        let available = self.handles.len() - self.handle_pos;
        if count > available {
            self.add_error(format!(
                "{:08x}: envelope needs {} handles, only {} available",
                self.base_offset + offset,
                count,
                available
            ));
            self.handle_pos = self.handles.len();
            return;
        }
        self.handle_pos += count;
    }

    // -----------------------------------------------------------------------
    // Handles
    // -----------------------------------------------------------------------

    /// Pop the next entry from the handle table. Exhaustion records an error
    /// and yields the absent handle.
    pub fn next_handle(&mut self) -> HandleInfo {
        match self.handles.get(self.handle_pos) {
            Some(info) => {
                self.handle_pos += 1;
                *info
            }
            None => {
                self.add_error(String::from("used more handles than the message supplies"));
                HandleInfo::default()
            }
        }
    }
}
