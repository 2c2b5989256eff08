//! Modular arithmetic over GF(2^255 - 19).
//!
//! `curve25519-dalek`'s own field element type is crate-private, so the
//! batch enumerator — which needs separate numerator/denominator field
//! elements to defer division across a whole batch — can't be built on
//! top of it directly: a plain 4-limb little-endian integer with
//! schoolbook multiplication and Fermat inversion. No attempt is made
//! at constant time; this is a brute-force search over public
//! information, not a signing routine, and constant time would only
//! cost throughput for no benefit here.

use std::fmt;

/// An element of GF(2^255 - 19), stored as four 64-bit little-endian
/// limbs. Always kept reduced (`< P`) except in `add_raw`/`sub_raw`
/// scratch computations that callers immediately reduce.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct FieldElement(pub [u64; 4]);

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({:016x}{:016x}{:016x}{:016x})", self.0[3], self.0[2], self.0[1], self.0[0])
    }
}

impl FieldElement {
    pub const ZERO: Self = FieldElement([0, 0, 0, 0]);
    pub const ONE: Self = FieldElement([1, 0, 0, 0]);

    /// p = 2^255 - 19
    pub const P: Self = FieldElement([
        0xFFFFFFFFFFFFFFED,
        0xFFFFFFFFFFFFFFFF,
        0xFFFFFFFFFFFFFFFF,
        0x7FFFFFFFFFFFFFFF,
    ]);

    /// Edwards25519 curve constant d = -121665/121666 mod p.
    pub const EDWARDS_D: Self = FieldElement([
        0x75EB4DCA135978A3,
        0x00700A4D4141D8AB,
        0x8CC740797779E898,
        0x52036CEE2B6FFE73,
    ]);

    /// 2d, used by the extended-coordinate addition formula.
    pub fn edwards_2d() -> Self {
        Self::EDWARDS_D.add(&Self::EDWARDS_D)
    }

    /// sqrt(-1) mod p, used to recover the correct root when the
    /// "easy" candidate root of a non-square doesn't check out.
    pub const SQRT_M1: Self = FieldElement([
        0xc4ee1b274a0ea0b0,
        0x2f431806ad2fe478,
        0x2b4d00993dfbd7a7,
        0x2b8324804fc1df0b,
    ]);

    pub fn from_u64(v: u64) -> Self {
        FieldElement([v, 0, 0, 0]).reduce()
    }

    /// Decode 32 little-endian bytes. Per RFC 8032 §5.1.3 the top bit
    /// is the sign of x in a compressed Edwards point and is masked off
    /// here; callers that need the sign bit extract it from the raw
    /// byte before calling this.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let mut masked = *bytes;
        masked[31] &= 0x7f;
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let o = i * 8;
            *limb = u64::from_le_bytes(masked[o..o + 8].try_into().unwrap());
        }
        FieldElement(limbs).reduce()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let r = self.reduce();
        let mut out = [0u8; 32];
        for i in 0..4 {
            out[i * 8..i * 8 + 8].copy_from_slice(&r.0[i].to_le_bytes());
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        let r = self.reduce();
        r.0 == [0, 0, 0, 0]
    }

    /// Least-significant bit, used as the canonical "sign" of a field
    /// element (RFC 8032 §5.1.2).
    pub fn is_negative(&self) -> bool {
        self.reduce().0[0] & 1 == 1
    }

    fn ge(&self, other: &Self) -> bool {
        for i in (0..4).rev() {
            if self.0[i] > other.0[i] {
                return true;
            }
            if self.0[i] < other.0[i] {
                return false;
            }
        }
        true
    }

    fn add_raw(&self, other: &Self) -> (Self, bool) {
        let mut result = [0u64; 4];
        let mut carry = 0u128;
        for i in 0..4 {
            let sum = self.0[i] as u128 + other.0[i] as u128 + carry;
            result[i] = sum as u64;
            carry = sum >> 64;
        }
        (FieldElement(result), carry != 0)
    }

    fn sub_raw(&self, other: &Self) -> (Self, bool) {
        let mut result = [0u64; 4];
        let mut borrow = 0i128;
        for i in 0..4 {
            let diff = self.0[i] as i128 - other.0[i] as i128 + borrow;
            if diff < 0 {
                result[i] = (diff + (1i128 << 64)) as u64;
                borrow = -1;
            } else {
                result[i] = diff as u64;
                borrow = 0;
            }
        }
        (FieldElement(result), borrow != 0)
    }

    /// Reduce a value known to be `< 2p` into canonical form.
    fn reduce(&self) -> Self {
        let mut r = *self;
        while r.ge(&Self::P) {
            let (sub, _) = r.sub_raw(&Self::P);
            r = sub;
        }
        r
    }

    pub fn add(&self, other: &Self) -> Self {
        let (sum, _carry) = self.add_raw(other);
        sum.reduce()
    }

    pub fn sub(&self, other: &Self) -> Self {
        if self.ge(other) {
            let (diff, _) = self.sub_raw(other);
            diff
        } else {
            let (sum, _) = self.add_raw(&Self::P);
            let (diff, _) = sum.sub_raw(other);
            diff.reduce()
        }
    }

    pub fn neg(&self) -> Self {
        if self.is_zero() {
            Self::ZERO
        } else {
            let (diff, _) = Self::P.sub_raw(self);
            diff
        }
    }

    /// Schoolbook multiply with a 512-bit intermediate product, folded
    /// down using `2^256 ≡ 38 (mod p)`.
    pub fn mul(&self, other: &Self) -> Self {
        let mut prod = [0u128; 8];
        for i in 0..4 {
            let mut carry = 0u128;
            for j in 0..4 {
                let v = self.0[i] as u128 * other.0[j] as u128 + prod[i + j] + carry;
                prod[i + j] = v & 0xFFFFFFFFFFFFFFFF;
                carry = v >> 64;
            }
            prod[i + 4] += carry;
        }

        let lo = FieldElement([prod[0] as u64, prod[1] as u64, prod[2] as u64, prod[3] as u64]);
        let hi = FieldElement([prod[4] as u64, prod[5] as u64, prod[6] as u64, prod[7] as u64]);

        let hi_times_38 = hi.mul_small(38);
        let (sum, carry) = lo.add_raw(&hi_times_38);
        let mut result = sum;
        if carry {
            let (r, _) = result.add_raw(&FieldElement([38, 0, 0, 0]));
            result = r;
        }
        result.reduce()
    }

    fn mul_small(&self, b: u64) -> Self {
        let mut result = [0u64; 4];
        let mut carry = 0u128;
        for i in 0..4 {
            let v = self.0[i] as u128 * b as u128 + carry;
            result[i] = v as u64;
            carry = v >> 64;
        }
        let mut r = FieldElement(result);
        if carry > 0 {
            let extra = FieldElement([carry as u64 * 38, 0, 0, 0]);
            let (sum, _) = r.add_raw(&extra);
            r = sum;
        }
        r.reduce()
    }

    pub fn sqr(&self) -> Self {
        self.mul(self)
    }

    fn pow(&self, exp: &[u64; 4]) -> Self {
        let mut result = Self::ONE;
        let mut base = *self;
        for limb_idx in 0..4 {
            let mut bits = exp[limb_idx];
            for _ in 0..64 {
                if bits & 1 == 1 {
                    result = result.mul(&base);
                }
                base = base.sqr();
                bits >>= 1;
            }
        }
        result
    }

    /// Modular inverse via Fermat's little theorem: a^(p-2) mod p.
    /// Used only off the hot path (see `batch::vector_divide` for the
    /// one-inversion-per-batch amortization that keeps this function
    /// off the per-candidate cost).
    pub fn invert(&self) -> Self {
        const P_MINUS_2: [u64; 4] = [
            0xFFFFFFFFFFFFFFEB,
            0xFFFFFFFFFFFFFFFF,
            0xFFFFFFFFFFFFFFFF,
            0x7FFFFFFFFFFFFFFF,
        ];
        self.pow(&P_MINUS_2)
    }

    /// x^((p+3)/8) mod p, the candidate square root exponent used by
    /// both Edwards point decompression and the Elligator-style y/u
    /// conversion.
    pub fn pow_p3d8(&self) -> Self {
        const EXP: [u64; 4] = [
            0xFFFFFFFFFFFFFFFE,
            0xFFFFFFFFFFFFFFFF,
            0xFFFFFFFFFFFFFFFF,
            0x0FFFFFFFFFFFFFFF,
        ];
        self.pow(&EXP)
    }

    /// Square root mod p, or `None` if `self` is not a quadratic
    /// residue. Tries the direct candidate first, then candidate *
    /// sqrt(-1), matching the two-branch structure used throughout the
    /// corpus's Ed25519 code (e.g. `elligator2::fe_sqrt`).
    pub fn sqrt(&self) -> Option<Self> {
        if self.is_zero() {
            return Some(Self::ZERO);
        }
        let candidate = self.pow_p3d8();
        if candidate.sqr() == *self {
            return Some(candidate);
        }
        let adjusted = candidate.mul(&Self::SQRT_M1);
        if adjusted.sqr() == *self {
            return Some(adjusted);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_roundtrip() {
        let a = FieldElement::from_u64(12345);
        let b = FieldElement::from_u64(67890);
        assert_eq!(a.add(&b).sub(&b), a);
    }

    #[test]
    fn mul_one_is_identity() {
        let a = FieldElement::from_u64(424242);
        assert_eq!(a.mul(&FieldElement::ONE), a);
    }

    #[test]
    fn invert_roundtrip() {
        let a = FieldElement::from_u64(7);
        let inv = a.invert();
        assert_eq!(a.mul(&inv), FieldElement::ONE);
    }

    #[test]
    fn neg_is_additive_inverse() {
        let a = FieldElement::from_u64(999);
        assert!(a.add(&a.neg()).is_zero());
    }

    #[test]
    fn bytes_roundtrip() {
        let mut bytes = [0u8; 32];
        bytes[0] = 5;
        bytes[15] = 200;
        let fe = FieldElement::from_bytes(&bytes);
        let back = fe.to_bytes();
        assert_eq!(bytes, back);
    }

    #[test]
    fn sqrt_of_square() {
        let a = FieldElement::from_u64(123456789);
        let sq = a.sqr();
        let root = sq.sqrt().expect("square must have a root");
        assert_eq!(root.sqr(), sq);
    }

    #[test]
    fn p_is_reduced_to_zero() {
        assert!(FieldElement::P.reduce().is_zero());
    }
}
