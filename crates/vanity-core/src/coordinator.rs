//! Parallel search coordinator (C5): one worker thread per enumerator,
//! a shared cancellation flag, a shared attempt counter, and an mpsc
//! channel carrying matches back to the caller.
//!
//! No async runtime: each worker is a tight CPU-bound loop on its own
//! OS thread, checking the cancellation flag only at batch boundaries
//! so the hot path never pays for a suspension point.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::batch::BatchEnumerator;
use crate::edwards::Extended;
use crate::prefix::PrefixTest;

/// A single match found by a worker.
#[derive(Clone, Debug)]
pub struct SearchMatch {
    pub offset: u128,
    pub public_key: [u8; 32],
}

/// Terminal status of a [`search`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Found,
    Cancelled,
    TimedOut,
    Exhausted,
}

/// Result of a completed search: whatever matches were collected, plus
/// why the search stopped looking for more, plus the total number of
/// candidates examined across all workers.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    pub matches: Vec<SearchMatch>,
    pub attempts: u64,
}

/// Parameters for a parallel search. `max_matches` bounds how many
/// matches to collect before stopping (the multi-match mode); `1`
/// reproduces single-match behavior. `deadline` and
/// `external_cancel`, if set, both race against completion — whichever
/// fires first stops the search (OR semantics).
pub struct SearchParams {
    pub p0: Extended,
    pub worker_count: usize,
    pub batch_size: usize,
    pub skip_ranges: Vec<u128>,
    pub max_matches: usize,
    pub deadline: Option<Duration>,
    pub candidate_limit_per_worker: Option<u64>,
    pub external_cancel: Option<Arc<AtomicBool>>,
}

/// Run `worker_count` enumerators concurrently, each starting at its
/// own entry in `skip_ranges`, testing candidates against `test` until
/// `max_matches` are found, the deadline elapses, `external_cancel`
/// fires, or every worker exhausts its `candidate_limit_per_worker`.
pub fn search(params: SearchParams, test: Arc<PrefixTest>) -> SearchOutcome {
    let cancel = Arc::new(AtomicBool::new(false));
    let attempts = Arc::new(AtomicU64::new(0));
    let (result_tx, result_rx) = mpsc::channel::<SearchMatch>();

    let mut handles = Vec::with_capacity(params.worker_count);
    for worker_id in 0..params.worker_count {
        let skip = params.skip_ranges[worker_id % params.skip_ranges.len()];
        let p0 = params.p0;
        let batch_size = params.batch_size;
        let cancel = Arc::clone(&cancel);
        let attempts = Arc::clone(&attempts);
        let result_tx = result_tx.clone();
        let test = Arc::clone(&test);
        let limit = params.candidate_limit_per_worker;

        let handle = thread::spawn(move || {
            log::debug!("worker {worker_id} starting at skip={skip}, batch_size={batch_size}");
            let mut enumerator = BatchEnumerator::new(&p0, skip, batch_size);
            loop {
                if cancel.load(Ordering::Relaxed) {
                    log::trace!("worker {worker_id} observed cancellation at a batch boundary");
                    return;
                }
                let test_fn = |bytes: &[u8; 32]| test.matches(bytes);
                let (found, examined) = enumerator.find_batch(&test_fn, &cancel, limit);
                attempts.fetch_add(examined, Ordering::Relaxed);

                match found {
                    Some(offset) => {
                        log::debug!("worker {worker_id} found a match at offset {offset}");
                        let public_key = recompute_public_key(&p0, offset);
                        let _ = result_tx.send(SearchMatch { offset, public_key });
                    }
                    None => {
                        log::debug!("worker {worker_id} stopping, no further candidates (cancelled or exhausted)");
                        return;
                    }
                }
            }
        });
        handles.push(handle);
    }
    drop(result_tx);

    let mut matches = Vec::new();
    let start = Instant::now();
    let status = loop {
        if matches.len() >= params.max_matches {
            break SearchStatus::Found;
        }
        if let Some(cancel) = &params.external_cancel {
            if cancel.load(Ordering::Relaxed) {
                break SearchStatus::Cancelled;
            }
        }
        let remaining = params.deadline.map(|d| d.checked_sub(start.elapsed()));
        match remaining {
            Some(Some(left)) => match result_rx.recv_timeout(left.min(Duration::from_millis(100))) {
                Ok(m) => matches.push(m),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if start.elapsed() >= params.deadline.unwrap() {
                        break SearchStatus::TimedOut;
                    }
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break SearchStatus::Exhausted,
            },
            Some(None) => break SearchStatus::TimedOut,
            None => match result_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(m) => matches.push(m),
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => break SearchStatus::Exhausted,
            },
        }
    };

    cancel.store(true, Ordering::Relaxed);
    for handle in handles {
        let _ = handle.join();
    }
    // Drain any matches sent in the window between the stop condition
    // and the workers observing `cancel == true`.
    while matches.len() < params.max_matches {
        match result_rx.try_recv() {
            Ok(m) => matches.push(m),
            Err(_) => break,
        }
    }

    SearchOutcome {
        status: if status == SearchStatus::Found && matches.is_empty() {
            SearchStatus::Exhausted
        } else {
            status
        },
        matches,
        attempts: attempts.load(Ordering::Relaxed),
    }
}

fn recompute_public_key(p0: &Extended, offset: u128) -> [u8; 32] {
    let q = crate::edwards::cofactor_base_point();
    let mut result = Extended::identity();
    let mut base = q;
    let mut s = offset;
    while s > 0 {
        if s & 1 == 1 {
            result = result.add(&base);
        }
        base = base.double();
        s >>= 1;
    }
    p0.add(&result).compress()
}
