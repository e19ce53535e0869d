//! Atomic Procedure Tests
//!
//! Tests for the CAS script logic: reply contract, acceptance rules under
//! both policies, write plans, and overflow handling.

use bytes::Bytes;
use caskv::config::CasPolicy;
use caskv::error::CasKvError;
use caskv::record::{encode, VERSION_RESET_THRESHOLD};
use caskv::script::{apply, CasCommand, CasReply, STATUS_APPLIED, STATUS_CONFLICT};

/// Raw bytes as the store would hold them
fn stored(version: u64, payload: &[u8]) -> Bytes {
    Bytes::from(encode(version, payload))
}

// =============================================================================
// GetWithVersion Tests
// =============================================================================

#[test]
fn test_get_absent_key() {
    let (reply, plan) = apply(&CasCommand::GetWithVersion, None, CasPolicy::Relaxed).unwrap();

    assert_eq!(
        reply,
        CasReply::Record {
            exists: false,
            version: 0,
            payload: Bytes::new(),
        }
    );
    assert!(plan.is_none());
}

#[test]
fn test_get_present_key() {
    let current = stored(3, b"value");
    let (reply, plan) =
        apply(&CasCommand::GetWithVersion, Some(&current), CasPolicy::Relaxed).unwrap();

    assert_eq!(
        reply,
        CasReply::Record {
            exists: true,
            version: 3,
            payload: Bytes::from_static(b"value"),
        }
    );
    assert!(plan.is_none());
}

#[test]
fn test_get_malformed_record() {
    let current = Bytes::from_static(b"xyz");
    let result = apply(&CasCommand::GetWithVersion, Some(&current), CasPolicy::Relaxed);

    match result {
        Err(CasKvError::MalformedRecord { actual, .. }) => assert_eq!(actual, 3),
        other => panic!("Expected MalformedRecord, got {:?}", other),
    }
}

// =============================================================================
// SetWithVersion Tests - Relaxed Policy
// =============================================================================

#[test]
fn test_set_absent_key_any_token() {
    // A missing key has version 0, so token 0 and the force token both pass
    for token in [-1, 0, 7] {
        let command = CasCommand::SetWithVersion {
            payload: b"v1",
            token,
        };
        let (reply, plan) = apply(&command, None, CasPolicy::Relaxed).unwrap();

        assert_eq!(reply, CasReply::Status(STATUS_APPLIED));
        let plan = plan.expect("accepted write must carry a plan");
        assert_eq!(plan.bytes, encode(1, b"v1"));
        assert_eq!(plan.ttl_seconds, None);
    }
}

#[test]
fn test_set_token_equal_to_current() {
    let current = stored(4, b"old");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: 4,
    };
    let (reply, plan) = apply(&command, Some(&current), CasPolicy::Relaxed).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_APPLIED));
    assert_eq!(plan.unwrap().bytes, encode(5, b"new"));
}

#[test]
fn test_set_token_ahead_of_current_accepted() {
    // The relaxed rule accepts tokens the caller never actually observed
    let current = stored(2, b"old");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: 10,
    };
    let (reply, plan) = apply(&command, Some(&current), CasPolicy::Relaxed).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_APPLIED));
    assert_eq!(plan.unwrap().bytes, encode(3, b"new"));
}

#[test]
fn test_set_stale_token_conflicts() {
    let current = stored(5, b"old");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: 4,
    };
    let (reply, plan) = apply(&command, Some(&current), CasPolicy::Relaxed).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_CONFLICT));
    // A rejected write must not touch the store
    assert!(plan.is_none());
}

#[test]
fn test_set_negative_token_forces_write() {
    let current = stored(9, b"old");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: -1,
    };
    let (reply, plan) = apply(&command, Some(&current), CasPolicy::Relaxed).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_APPLIED));
    assert_eq!(plan.unwrap().bytes, encode(10, b"new"));
}

#[test]
fn test_set_malformed_current_record() {
    let current = Bytes::from_static(b"\x01\x02");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: -1,
    };
    let result = apply(&command, Some(&current), CasPolicy::Relaxed);

    assert!(matches!(
        result,
        Err(CasKvError::MalformedRecord { actual: 2, .. })
    ));
}

// =============================================================================
// SetWithVersion Tests - Strict Policy
// =============================================================================

#[test]
fn test_strict_exact_token_accepted() {
    let current = stored(4, b"old");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: 4,
    };
    let (reply, plan) = apply(&command, Some(&current), CasPolicy::Strict).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_APPLIED));
    assert_eq!(plan.unwrap().bytes, encode(5, b"new"));
}

#[test]
fn test_strict_token_ahead_rejected() {
    // Under strict semantics a token the writer never observed is a conflict
    let current = stored(2, b"old");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: 10,
    };
    let (reply, plan) = apply(&command, Some(&current), CasPolicy::Strict).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_CONFLICT));
    assert!(plan.is_none());
}

#[test]
fn test_strict_stale_token_rejected() {
    let current = stored(5, b"old");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: 4,
    };
    let (reply, _) = apply(&command, Some(&current), CasPolicy::Strict).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_CONFLICT));
}

#[test]
fn test_strict_negative_token_still_forces() {
    let current = stored(5, b"old");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: -1,
    };
    let (reply, plan) = apply(&command, Some(&current), CasPolicy::Strict).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_APPLIED));
    assert_eq!(plan.unwrap().bytes, encode(6, b"new"));
}

// =============================================================================
// Overflow Tests
// =============================================================================

#[test]
fn test_version_wraps_at_threshold() {
    let current = stored(VERSION_RESET_THRESHOLD, b"old");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: -1,
    };
    let (reply, plan) = apply(&command, Some(&current), CasPolicy::Relaxed).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_APPLIED));
    // Resets to 0 internally, then increments to 1, never 2147483648
    assert_eq!(plan.unwrap().bytes, encode(1, b"new"));
}

#[test]
fn test_version_wraps_beyond_threshold() {
    let current = stored(VERSION_RESET_THRESHOLD + 100, b"old");
    let command = CasCommand::SetWithVersion {
        payload: b"new",
        token: -1,
    };
    let (_, plan) = apply(&command, Some(&current), CasPolicy::Relaxed).unwrap();

    assert_eq!(plan.unwrap().bytes, encode(1, b"new"));
}

// =============================================================================
// Expiry Variant Tests
// =============================================================================

#[test]
fn test_set_with_expiry_carries_ttl_in_plan() {
    let command = CasCommand::SetWithVersionExpiry {
        payload: b"v1",
        token: -1,
        ttl_seconds: 30,
    };
    let (reply, plan) = apply(&command, None, CasPolicy::Relaxed).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_APPLIED));
    let plan = plan.unwrap();
    assert_eq!(plan.bytes, encode(1, b"v1"));
    // TTL travels with the write so the store applies both in one step
    assert_eq!(plan.ttl_seconds, Some(30));
}

#[test]
fn test_set_with_expiry_conflict_has_no_plan() {
    let current = stored(5, b"old");
    let command = CasCommand::SetWithVersionExpiry {
        payload: b"new",
        token: 2,
        ttl_seconds: 30,
    };
    let (reply, plan) = apply(&command, Some(&current), CasPolicy::Relaxed).unwrap();

    assert_eq!(reply, CasReply::Status(STATUS_CONFLICT));
    assert!(plan.is_none());
}

// =============================================================================
// Reply Contract Tests
// =============================================================================

#[test]
fn test_status_constants_match_wire_contract() {
    assert_eq!(STATUS_APPLIED, 0);
    assert_eq!(STATUS_CONFLICT, -1);
}
