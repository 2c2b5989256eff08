//! End-to-end regression and property tests against the public
//! `vanity_core` API: known search vectors, recovery round-trips, and
//! the aggregation/prefix invariants the search is expected to hold.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use vanity_core::{recover, search, SearchRequest, SearchStatus, StartPoint};

fn b64_decode_32(s: &str) -> [u8; 32] {
    let bytes = base64::engine::general_purpose::STANDARD.decode(s).unwrap();
    bytes.try_into().unwrap()
}

fn b64_encode_32(bytes: &[u8; 32]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

// =============================================================================
// Known-vector regression
// =============================================================================

#[test]
fn known_offset_for_fixed_starting_point() {
    let start = b64_decode_32("qkHBetbXfAxsmr0jH6Zs6Dx1ZEReO9WBZCoNREce0gE=");
    let req = SearchRequest {
        prefix: "AY/".to_string(),
        start: StartPoint::PublicKey(start),
        worker_count: 1,
        batch_size: 1024,
        max_matches: 1,
        deadline: Some(Duration::from_secs(120)),
        cancel: None,
        candidate_limit_per_worker: None,
    };
    let outcome = search(req).expect("search should run");
    assert_eq!(outcome.status, SearchStatus::Found);
    let m = &outcome.matches[0];
    assert_eq!(m.offset, 92950);
    assert_eq!(b64_encode_32(&m.public_key), "AY/yq7zukqRmMUzqqPFmtqXJdAcbmh8mn4rMgtjVnGI=");
}

// =============================================================================
// Prefix predicate
// =============================================================================

#[test]
fn single_byte_prefix_matches_expected_byte_patterns() {
    let req_a = SearchRequest {
        prefix: "A".to_string(),
        start: StartPoint::Seed([5u8; 32]),
        worker_count: 1,
        batch_size: 32,
        max_matches: 1,
        deadline: Some(Duration::from_secs(30)),
        cancel: None,
        candidate_limit_per_worker: None,
    };
    let outcome = search(req_a).expect("search should run");
    assert_eq!(outcome.status, SearchStatus::Found);
    let encoded = b64_encode_32(&outcome.matches[0].public_key);
    assert!(encoded.starts_with('A'));
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn zero_offset_recovery_returns_clamped_seed_unchanged() {
    let seed = [0x77u8; 32];
    let clamped = vanity_core::recover(&seed, 0, &public_key_of_clamped_seed(&seed)).unwrap();
    let mut expected = seed;
    expected[0] &= 0xf8;
    expected[31] &= 0x7f;
    expected[31] |= 0x40;
    assert_eq!(clamped, expected);
}

fn public_key_of_clamped_seed(seed: &[u8; 32]) -> [u8; 32] {
    let mut clamped = *seed;
    clamped[0] &= 0xf8;
    clamped[31] &= 0x7f;
    clamped[31] |= 0x40;
    let scalar = curve25519_dalek::scalar::Scalar::from_bytes_mod_order(clamped);
    let point = &scalar * &curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
    point.to_montgomery().to_bytes()
}

#[test]
fn search_then_recover_roundtrips_for_several_seeds() {
    for seed_byte in [0x01u8, 0x42, 0xAB] {
        let seed = [seed_byte; 32];
        let req = SearchRequest {
            prefix: "A".to_string(),
            start: StartPoint::Seed(seed),
            worker_count: 1,
            batch_size: 64,
            max_matches: 1,
            deadline: Some(Duration::from_secs(30)),
            cancel: None,
            candidate_limit_per_worker: None,
        };
        let outcome = search(req).expect("search should run");
        assert_eq!(outcome.status, SearchStatus::Found);
        let m = &outcome.matches[0];
        let recovered = recover(&seed, m.offset, &m.public_key).expect("recovery must succeed for a true match");

        let scalar = curve25519_dalek::scalar::Scalar::from_bytes_mod_order(recovered);
        let point = &scalar * &curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
        assert_eq!(point.to_montgomery().to_bytes(), m.public_key);
    }
}

// =============================================================================
// Aggregation bound (spec property 7)
// =============================================================================

#[test]
fn attempts_reported_covers_at_least_the_found_offset() {
    let seed = [9u8; 32];
    let req = SearchRequest {
        prefix: "A".to_string(),
        start: StartPoint::Seed(seed),
        worker_count: 2,
        batch_size: 32,
        max_matches: 1,
        deadline: Some(Duration::from_secs(30)),
        cancel: None,
        candidate_limit_per_worker: None,
    };
    let outcome = search(req).expect("search should run");
    assert_eq!(outcome.status, SearchStatus::Found);
    let offset = outcome.matches[0].offset;
    assert!(outcome.attempts as u128 >= offset.min(u64::MAX as u128));
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn external_cancel_yields_cancelled_status_when_no_match_found() {
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_clone = Arc::clone(&cancel);
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        cancel_clone.store(true, std::sync::atomic::Ordering::Relaxed);
    });

    let req = SearchRequest {
        // a prefix long enough to be unreachable inside the test window
        prefix: "/".repeat(40),
        start: StartPoint::Seed([1u8; 32]),
        worker_count: 2,
        batch_size: 32,
        max_matches: 1,
        deadline: None,
        cancel: Some(cancel),
        candidate_limit_per_worker: None,
    };
    let outcome = search(req).expect("search should run");
    assert_eq!(outcome.status, SearchStatus::Cancelled);
    assert!(outcome.matches.is_empty());
}
