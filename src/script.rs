//! Atomic CAS procedures
//!
//! The three read-modify-write procedures the store executes atomically:
//! get-with-version, set-with-version-check, and the same with an expiry
//! applied in the same step as the write.
//!
//! `apply` is the script body: given the bytes currently stored under the
//! key, it produces the reply and the write to perform, if any. The backend
//! must run `apply` and apply the resulting [`WritePlan`] without letting any
//! other operation on the key interleave; that exclusion is the system's
//! only concurrency-correctness mechanism. Nothing here takes two round
//! trips; a CAS check and its write are always one unit.
//!
//! ## Reply contract
//!
//! - GetWithVersion        → `Record { exists, version, payload }`
//! - SetWithVersion        → `Status(0)` accepted, `Status(-1)` conflict
//! - SetWithVersionExpiry  → same as SetWithVersion

use bytes::Bytes;

use crate::config::CasPolicy;
use crate::error::Result;
use crate::record;

/// Status reply for an accepted write
pub const STATUS_APPLIED: i64 = 0;

/// Status reply for a rejected write
pub const STATUS_CONFLICT: i64 = -1;

/// One atomic procedure plus its arguments
#[derive(Debug, Clone)]
pub enum CasCommand<'a> {
    /// Read the record and report its version; absence is not an error here
    GetWithVersion,

    /// Replace the payload if the token passes the acceptance rule
    SetWithVersion { payload: &'a [u8], token: i64 },

    /// Like SetWithVersion, with an expiry applied atomically with the write
    SetWithVersionExpiry {
        payload: &'a [u8],
        token: i64,
        ttl_seconds: u64,
    },
}

/// Reply from an atomic procedure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasReply {
    /// Result of GetWithVersion. A missing key reports `(false, 0, empty)`.
    Record {
        exists: bool,
        version: u64,
        payload: Bytes,
    },

    /// Result of the set procedures: `STATUS_APPLIED` or `STATUS_CONFLICT`
    Status(i64),
}

/// The write an accepted set procedure performs.
///
/// Record bytes and expiry travel together so the backend stores both in a
/// single step; the key must never exist without its TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    /// Full encoded record (version prefix + payload)
    pub bytes: Vec<u8>,

    /// Expiry to apply with the write, if the procedure carries one
    pub ttl_seconds: Option<u64>,
}

/// Execute one procedure against the current stored bytes.
///
/// Pure decision logic: the backend supplies what is stored under the key
/// (None when absent), holds its exclusion for the duration, and performs
/// the returned write. Fails with `MalformedRecord` when the stored bytes
/// are shorter than the version prefix.
pub fn apply(
    command: &CasCommand<'_>,
    current: Option<&Bytes>,
    policy: CasPolicy,
) -> Result<(CasReply, Option<WritePlan>)> {
    match command {
        CasCommand::GetWithVersion => {
            let reply = match current {
                None => CasReply::Record {
                    exists: false,
                    version: 0,
                    payload: Bytes::new(),
                },
                Some(raw) => {
                    let (version, payload) = record::decode(raw)?;
                    CasReply::Record {
                        exists: true,
                        version,
                        payload,
                    }
                }
            };
            Ok((reply, None))
        }

        CasCommand::SetWithVersion { payload, token } => {
            set_with_check(payload, *token, None, current, policy)
        }

        CasCommand::SetWithVersionExpiry {
            payload,
            token,
            ttl_seconds,
        } => set_with_check(payload, *token, Some(*ttl_seconds), current, policy),
    }
}

/// Shared body of the two set procedures
fn set_with_check(
    payload: &[u8],
    token: i64,
    ttl_seconds: Option<u64>,
    current: Option<&Bytes>,
    policy: CasPolicy,
) -> Result<(CasReply, Option<WritePlan>)> {
    // A missing key reads as version 0
    let current_version = match current {
        None => 0,
        Some(raw) => record::decode(raw)?.0,
    };

    if !accepts(policy, token, current_version) {
        return Ok((CasReply::Status(STATUS_CONFLICT), None));
    }

    let plan = WritePlan {
        bytes: record::encode(record::next_version(current_version), payload),
        ttl_seconds,
    };

    Ok((CasReply::Status(STATUS_APPLIED), Some(plan)))
}

/// The acceptance rule. Negative tokens force the write under either policy.
fn accepts(policy: CasPolicy, token: i64, current_version: u64) -> bool {
    if token < 0 {
        return true;
    }
    match policy {
        CasPolicy::Relaxed => token as u64 >= current_version,
        CasPolicy::Strict => token as u64 == current_version,
    }
}
