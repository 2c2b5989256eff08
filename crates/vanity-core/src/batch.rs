//! Batch enumerator (C4): the hot loop.
//!
//! Advances a center point by a fixed increment `Q = 8·B` and tests the
//! Montgomery u-coordinates of `2k+1` neighbors around it per
//! iteration, paying for exactly one modular inversion (amortized over
//! the whole batch via [`crate::batch_invert::vector_divide`]) instead
//! of one inversion per candidate.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::edwards::{cofactor_base_point, Affine, CachedAddend, Extended};
use crate::batch_invert::vector_divide;
use crate::field::FieldElement;

/// Minimum and maximum batch size: must be even, a power of two, and
/// in `[2, 8192]`.
pub const MIN_BATCH: usize = 2;
pub const MAX_BATCH: usize = 8192;

/// Double-and-add scalar multiplication, `O(log n)` point doublings.
/// Only used off the hot path: building the one-time offset tables and
/// (in test code elsewhere in the crate) independently recomputing an
/// expected point to check the batch enumerator's output against.
pub(crate) fn scalar_mul_u128(point: &Extended, mut scalar: u128) -> Extended {
    let mut result = Extended::identity();
    let mut base = *point;
    while scalar > 0 {
        if scalar & 1 == 1 {
            result = result.add(&base);
        }
        base = base.double();
        scalar >>= 1;
    }
    result
}

/// A precomputed neighbor offset `(i+1)*Q`, carrying its affine `(x, y)`
/// alongside `2d*x*y` so the per-candidate inner loop can derive both
/// the `center + offset` and `center - offset` numerators from the same
/// two multiplications (`y1*y`, `x1*x`) instead of one set per sign.
#[derive(Copy, Clone, Debug)]
struct NeighborAddend {
    x: FieldElement,
    y: FieldElement,
    two_d_xy: FieldElement,
}

/// Build the `offsets[i] = (i+1)*Q` table (affine) and
/// `batchOffset = (2*half_k+1)*Q`, sharing a single batched inversion
/// across all `half_k + 1` points instead of inverting each one.
fn build_tables(q: &Extended, half_k: usize) -> (Vec<NeighborAddend>, CachedAddend) {
    let mut running = *q;
    let mut points = Vec::with_capacity(half_k);
    points.push(running);
    for _ in 1..half_k {
        running = running.add(q);
        points.push(running);
    }
    let batch_offset_point = points[half_k - 1].double().add(q);

    let n = half_k + 1;
    let denominators: Vec<FieldElement> = points.iter().map(|p| p.z).chain(std::iter::once(batch_offset_point.z)).collect();
    let numerators = vec![FieldElement::ONE; n];
    let mut zinvs = vec![FieldElement::ZERO; n];
    let mut scratch_r = vec![FieldElement::ZERO; n];
    let mut scratch_s = vec![FieldElement::ZERO; n];
    vector_divide(&numerators, &denominators, &mut zinvs, &mut scratch_r, &mut scratch_s);

    let two_d = FieldElement::edwards_2d();
    let mut offsets = Vec::with_capacity(half_k);
    for (i, p) in points.iter().enumerate() {
        let zinv = zinvs[i];
        let x = p.x.mul(&zinv);
        let y = p.y.mul(&zinv);
        let two_d_xy = two_d.mul(&x).mul(&y);
        offsets.push(NeighborAddend { x, y, two_d_xy });
    }
    let zinv = zinvs[half_k];
    let batch_affine = Affine { x: batch_offset_point.x.mul(&zinv), y: batch_offset_point.y.mul(&zinv) };
    (offsets, CachedAddend::from_affine(&batch_affine))
}

/// Pure per-worker search state: precomputed offset tables, the
/// running center point, and preallocated scratch buffers. Owned
/// exclusively by one worker; never shared.
pub struct BatchEnumerator {
    k: usize,
    half_k: usize,
    offsets: Vec<NeighborAddend>,
    batch_offset: CachedAddend,
    center_affine: Affine,
    center_offset: u128,
    ua: Vec<FieldElement>,
    ub: Vec<FieldElement>,
    u_out: Vec<FieldElement>,
    scratch_r: Vec<FieldElement>,
    scratch_s: Vec<FieldElement>,
}

impl BatchEnumerator {
    /// `p0` is the starting Edwards point; `skip` the worker's initial
    /// offset from it; `k` the (even, power-of-two) batch size.
    pub fn new(p0: &Extended, skip: u128, k: usize) -> Self {
        assert!(k >= MIN_BATCH && k <= MAX_BATCH && k % 2 == 0, "k must be even in [2, 8192]");
        let half_k = k / 2;
        let q = cofactor_base_point();
        let (offsets, batch_offset) = build_tables(&q, half_k);

        let steps_to_center = skip + half_k as u128;
        let center_extended = p0.add(&scalar_mul_u128(&q, steps_to_center));
        let center_affine = center_extended.to_affine();

        let slots = k + 2;
        BatchEnumerator {
            k,
            half_k,
            offsets,
            batch_offset,
            center_affine,
            center_offset: steps_to_center,
            ua: vec![FieldElement::ZERO; slots],
            ub: vec![FieldElement::ZERO; slots],
            u_out: vec![FieldElement::ZERO; slots],
            scratch_r: vec![FieldElement::ZERO; slots],
            scratch_s: vec![FieldElement::ZERO; slots],
        }
    }

    /// Run batches until `test` matches one of the `k+1` candidates,
    /// `cancel` fires, or `limit` candidates have been examined
    /// (`None` = unbounded). Returns `(offset_if_found, attempts_made)`;
    /// the offset is absolute from the enumerator's `P0`.
    pub fn find_batch(
        &mut self,
        test: &dyn Fn(&[u8; 32]) -> bool,
        cancel: &AtomicBool,
        mut limit: Option<u64>,
    ) -> (Option<u128>, u64) {
        let mut attempts = 0u64;
        let two = FieldElement::from_u64(2);

        loop {
            if cancel.load(Ordering::Relaxed) {
                return (None, attempts);
            }
            if limit == Some(0) {
                return (None, attempts);
            }

            let y1 = self.center_affine.y;
            let x1 = self.center_affine.x;
            let t1 = x1.mul(&y1);

            for i in 0..self.half_k {
                let addend = &self.offsets[i];
                // e1 = y1*y2, e2 = x1*x2 give both neighbor numerators
                // for free: h_plus = 2(e1+e2) for center+offset, h_minus
                // = 2(e1-e2) for center-offset (the two differ only in
                // the sign of the x1*x2 cross term, so no separate
                // multiplication is needed per direction).
                let e1 = y1.mul(&addend.y);
                let e2 = x1.mul(&addend.x);
                let c = t1.mul(&addend.two_d_xy);
                let h_plus = e1.add(&e2).add(&e1).add(&e2);
                let h_minus = e1.sub(&e2).add(&e1).sub(&e2);
                let f_minus = two.add(&c);
                let f_plus = two.sub(&c);

                // position i: center - offsets[i]
                self.ua[i] = f_minus.add(&h_minus);
                self.ub[i] = f_minus.sub(&h_minus);
                // position half_k+1+i: center + offsets[i]
                self.ua[self.half_k + 1 + i] = f_plus.add(&h_plus);
                self.ub[self.half_k + 1 + i] = f_plus.sub(&h_plus);
            }
            // center itself: u = (1+y)/(1-y)
            self.ua[self.half_k] = FieldElement::ONE.add(&y1);
            self.ub[self.half_k] = FieldElement::ONE.sub(&y1);

            let center_extended = Extended { x: x1, y: y1, z: FieldElement::ONE, t: t1 };
            let next_center = center_extended.add_cached(&self.batch_offset);

            let piggyback_idx = self.k + 1;
            self.ua[piggyback_idx] = FieldElement::ONE;
            self.ub[piggyback_idx] = next_center.z;

            let n = self.k + 2;
            vector_divide(
                &self.ua[..n],
                &self.ub[..n],
                &mut self.u_out[..n],
                &mut self.scratch_r[..n],
                &mut self.scratch_s[..n],
            );

            let candidates = self.k as u64 + 1;
            let test_count = match limit {
                Some(l) => l.min(candidates),
                None => candidates,
            } as usize;

            let mut hit = None;
            for i in 0..test_count {
                let bytes = self.u_out[i].to_bytes();
                attempts += 1;
                if test(&bytes) {
                    hit = Some(i);
                    break;
                }
            }
            if let Some(l) = limit {
                limit = Some(l - test_count as u64);
            }

            if let Some(i) = hit {
                let local_offset: i128 = match i.cmp(&self.half_k) {
                    std::cmp::Ordering::Less => -((i as i128) + 1),
                    std::cmp::Ordering::Equal => 0,
                    std::cmp::Ordering::Greater => (i - self.half_k) as i128,
                };
                let absolute = self.center_offset as i128 + local_offset;
                return (Some(absolute as u128), attempts);
            }

            let zinv = self.u_out[piggyback_idx];
            let new_x = next_center.x.mul(&zinv);
            let new_y = next_center.y.mul(&zinv);
            self.center_affine = Affine { x: new_x, y: new_y };
            self.center_offset += self.k as u128 + 1;

            if limit == Some(0) {
                return (None, attempts);
            }
        }
    }
}
