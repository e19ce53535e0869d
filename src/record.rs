//! Versioned record codec
//!
//! Encoding and decoding of the stored record: a fixed-width version counter
//! followed by the opaque application payload.
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────────────┬─────────────────────────────┐
//! │ Version (8, LE)  │         Payload             │
//! └──────────────────┴─────────────────────────────┘
//! ```
//!
//! The payload has no length prefix; it is the remainder of the buffer.
//! Byte order is little-endian on both sides of the wire: the atomic
//! procedure encodes inside the store and batch reads decode client-side,
//! so the layout is a cross-component contract, not a per-call-site choice.

use bytes::Bytes;

use crate::error::{CasKvError, Result};

/// Width of the version prefix in bytes
pub const VERSION_PREFIX_LEN: usize = 8;

/// Stored versions at or beyond this boundary reset to 0 before the next
/// increment, so the counter stays in the positive range of a signed 32-bit
/// integer and never acquires a sign downstream.
pub const VERSION_RESET_THRESHOLD: u64 = i32::MAX as u64;

/// Encode a record: version prefix followed by the payload
pub fn encode(version: u64, payload: &[u8]) -> Vec<u8> {
    let mut record = Vec::with_capacity(VERSION_PREFIX_LEN + payload.len());
    record.extend_from_slice(&version.to_le_bytes());
    record.extend_from_slice(payload);
    record
}

/// Decode a record into its version and payload
///
/// The payload is a zero-copy slice of the input buffer. Fails with
/// `MalformedRecord` when the buffer is shorter than the version prefix.
pub fn decode(raw: &Bytes) -> Result<(u64, Bytes)> {
    if raw.len() < VERSION_PREFIX_LEN {
        return Err(CasKvError::MalformedRecord {
            expected: VERSION_PREFIX_LEN,
            actual: raw.len(),
        });
    }

    let mut prefix = [0u8; VERSION_PREFIX_LEN];
    prefix.copy_from_slice(&raw[..VERSION_PREFIX_LEN]);
    let version = u64::from_le_bytes(prefix);

    let payload = raw.slice(VERSION_PREFIX_LEN..);

    Ok((version, payload))
}

/// Compute the version an accepted write stores, given the current one
///
/// Normally `current + 1`; at or beyond the reset threshold the counter
/// wraps back to 1 instead of growing past the signed 32-bit range.
pub fn next_version(current: u64) -> u64 {
    if current >= VERSION_RESET_THRESHOLD {
        1
    } else {
        current + 1
    }
}
