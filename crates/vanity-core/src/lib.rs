//! Curve25519 vanity public-key search engine.
//!
//! Given a target base64 prefix, searches for an Ed25519/X25519
//! public key whose standard base64 encoding starts with that prefix,
//! by walking a fixed increment `Q = 8*B` away from a starting point
//! and batch-testing many neighbors per modular inversion. See
//! [`search`] for the entry point and [`recover`] for turning a found
//! offset back into a private scalar.

mod batch;
mod batch_invert;
mod coordinator;
mod edwards;
mod error;
mod field;
mod montgomery;
mod prefix;
mod recovery;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

pub use coordinator::{SearchMatch, SearchOutcome, SearchStatus};
pub use error::VanityError;
pub use recovery::{recover, Disambiguator};

use edwards::Extended;
use prefix::build_prefix_test;

/// Where a search starts walking from.
pub enum StartPoint {
    /// Derive the starting public key from a 32-byte seed (clamped per
    /// RFC 7748 before use).
    Seed([u8; 32]),
    /// Start directly from a given Montgomery u-coordinate public key.
    PublicKey([u8; 32]),
}

/// Parameters for [`search`].
pub struct SearchRequest {
    /// Base64 prefix to search for (standard alphabet, up to 43 chars).
    pub prefix: String,
    pub start: StartPoint,
    /// Number of worker threads. 0 defaults to `num_cpus::get().saturating_sub(1)`.
    pub worker_count: usize,
    /// Candidates tested per modular inversion, must be even, power of
    /// two, in `[2, 8192]`.
    pub batch_size: usize,
    /// Stop after collecting this many matches.
    pub max_matches: usize,
    /// Optional wall-clock budget for the whole search.
    pub deadline: Option<Duration>,
    /// Optional externally-owned cancellation flag (e.g. wired to a
    /// Ctrl-C handler by a caller).
    pub cancel: Option<Arc<AtomicBool>>,
    /// Optional cap on candidates examined per worker, mainly useful
    /// for deterministic tests and benchmarking.
    pub candidate_limit_per_worker: Option<u64>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        SearchRequest {
            prefix: String::new(),
            start: StartPoint::Seed([0u8; 32]),
            worker_count: 0,
            batch_size: 1024,
            max_matches: 1,
            deadline: None,
            cancel: None,
            candidate_limit_per_worker: None,
        }
    }
}

fn resolve_start_point(start: &StartPoint) -> Result<Extended, VanityError> {
    match start {
        StartPoint::Seed(seed) => {
            let clamped = montgomery::clamp_scalar(seed);
            let scalar = curve25519_dalek::scalar::Scalar::from_bytes_mod_order(clamped);
            let point = &scalar * &curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
            Extended::decompress(point.compress().as_bytes())
                .ok_or_else(|| VanityError::InvalidPrivateKey("seed produced an invalid point".into()))
        }
        StartPoint::PublicKey(bytes) => montgomery::decode_u_coordinate(bytes),
    }
}

fn worker_skip_ranges(worker_count: usize) -> Vec<u128> {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    // Spread workers across disjoint, randomly-chosen regions of the
    // offset space so independent runs (and independent workers in the
    // same run) don't retread each other's candidates.
    let stride: u128 = 1u128 << 80;
    (0..worker_count.max(1))
        .map(|i| (i as u128) * stride + rng.gen::<u64>() as u128)
        .collect()
}

/// Run a parallel vanity search for [`SearchRequest::prefix`], starting
/// from [`SearchRequest::start`].
pub fn search(req: SearchRequest) -> Result<SearchOutcome, VanityError> {
    let test = build_prefix_test(&req.prefix)?;
    let p0 = resolve_start_point(&req.start)?;
    let worker_count = if req.worker_count == 0 {
        num_cpus::get().saturating_sub(1).max(1)
    } else {
        req.worker_count
    };

    let params = coordinator::SearchParams {
        p0,
        worker_count,
        batch_size: req.batch_size,
        skip_ranges: worker_skip_ranges(worker_count),
        max_matches: req.max_matches.max(1),
        deadline: req.deadline,
        candidate_limit_per_worker: req.candidate_limit_per_worker,
        external_cancel: req.cancel,
    };
    Ok(coordinator::search(params, Arc::new(test)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_a_short_prefix_quickly() {
        let req = SearchRequest {
            prefix: "A".to_string(),
            start: StartPoint::Seed([1u8; 32]),
            worker_count: 1,
            batch_size: 32,
            max_matches: 1,
            deadline: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        let outcome = search(req).expect("search should run");
        assert_eq!(outcome.status, SearchStatus::Found);
        assert_eq!(outcome.matches.len(), 1);
    }

    #[test]
    fn recover_roundtrips_with_search() {
        let seed = [2u8; 32];
        let req = SearchRequest {
            prefix: "A".to_string(),
            start: StartPoint::Seed(seed),
            worker_count: 1,
            batch_size: 32,
            max_matches: 1,
            deadline: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        let outcome = search(req).expect("search should run");
        let m = &outcome.matches[0];
        let scalar = recover(&seed, m.offset, &m.public_key).expect("recovery must succeed");
        let derived = &curve25519_dalek::scalar::Scalar::from_bytes_mod_order(scalar)
            * &curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
        let derived_point = Extended::decompress(derived.compress().as_bytes()).unwrap();
        assert_eq!(montgomery::encode_u_coordinate(&derived_point), m.public_key);
    }
}
