//! Montgomery's simultaneous inversion trick (C2).
//!
//! Replaces `n` modular inversions with a single inversion plus
//! `4*(n-1)+1` multiplications — the saving the batch enumerator relies
//! on to keep the per-candidate cost a handful of multiplications
//! instead of the ~265 multiplications a naive inversion would cost.

use crate::field::FieldElement;

/// Compute `u[i] = x[i] / y[i]` for all `i`, using one modular
/// inversion. `scratch_r` and `scratch_s` are caller-supplied buffers
/// of the same length as `x`/`y`/`out`, reused across calls to avoid
/// heap traffic on the hot path.
///
/// Panics if any `y[i]` is zero — on the enumerator's inputs (`u+1`,
/// `Z`, or `den ± num`) a zero denominator has negligible probability
/// and indicates either an adversarial input or a library bug, not a
/// condition the caller should recover from.
pub fn vector_divide(
    x: &[FieldElement],
    y: &[FieldElement],
    out: &mut [FieldElement],
    scratch_r: &mut [FieldElement],
    scratch_s: &mut [FieldElement],
) {
    let n = x.len();
    assert_eq!(y.len(), n);
    assert_eq!(out.len(), n);
    assert_eq!(scratch_r.len(), n);
    assert_eq!(scratch_s.len(), n);
    assert!(n > 0, "vector_divide requires at least one element");

    scratch_r[0] = y[0];
    for i in 1..n {
        scratch_r[i] = scratch_r[i - 1].mul(&y[i]);
        scratch_s[i] = scratch_r[i - 1].mul(&x[i]);
    }

    assert!(!scratch_r[n - 1].is_zero(), "vector_divide: zero denominator in batch");
    let mut t = scratch_r[n - 1].invert();

    for i in (1..n).rev() {
        out[i] = t.mul(&scratch_s[i]);
        t = t.mul(&y[i]);
    }
    out[0] = t.mul(&x[0]);
}
