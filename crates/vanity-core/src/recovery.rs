//! Private-key recovery (C6): turn a found public-side offset back into
//! the private scalar that produced it.
//!
//! The public side advances by `Q = 8*B`; the private side advances by
//! the scalar `8`, so a public offset of `n` corresponds to a private
//! scalar shift of `8*n` in one of two directions — enumeration walks
//! both `+n` and `-n` from the center, and only one of the two signs
//! actually produced the match.

use crate::error::VanityError;
use crate::montgomery::{clamp_scalar, encode_u_coordinate};

/// Which of the two candidate scalars (`s0 + 8n` or `s0 - 8n`) produced
/// the match the caller is recovering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Disambiguator {
    Plus,
    Minus,
}

/// Add/subtract a little-endian 256-bit offset to/from a little-endian
/// 256-bit scalar, modulo 2^256 (raw integer arithmetic, not field
/// arithmetic — the private scalar is not reduced mod p).
fn add_u256(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry = 0u16;
    for i in 0..32 {
        let sum = a[i] as u16 + b[i] as u16 + carry;
        out[i] = sum as u8;
        carry = sum >> 8;
    }
    out
}

fn sub_u256(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut borrow = 0i16;
    for i in 0..32 {
        let diff = a[i] as i16 - b[i] as i16 - borrow;
        if diff < 0 {
            out[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            out[i] = diff as u8;
            borrow = 0;
        }
    }
    out
}

fn offset_bytes_times_8(offset: u128) -> [u8; 32] {
    let shifted = offset.checked_shl(3).expect("offset * 8 must not overflow u128");
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(&shifted.to_le_bytes());
    bytes
}

/// Recover the private scalar for a match found at public offset `n`
/// from the clamped seed `s0`. `disambiguator` picks `s0 + 8n` or
/// `s0 - 8n`; the caller determines it by recomputing both public keys
/// and checking which one matches (see [`recover`]).
pub fn apply_offset(seed: &[u8; 32], offset: u128, disambiguator: Disambiguator) -> [u8; 32] {
    let clamped = clamp_scalar(seed);
    let delta = offset_bytes_times_8(offset);
    match disambiguator {
        Disambiguator::Plus => add_u256(&clamped, &delta),
        Disambiguator::Minus => sub_u256(&clamped, &delta),
    }
}

/// Recover the private scalar that produced `target_public_key` at
/// `offset` steps from `seed`, trying both directions and returning
/// whichever one's derived public key actually matches.
pub fn recover(seed: &[u8; 32], offset: u128, target_public_key: &[u8; 32]) -> Result<[u8; 32], VanityError> {
    for disambiguator in [Disambiguator::Plus, Disambiguator::Minus] {
        let candidate_scalar = apply_offset(seed, offset, disambiguator);
        let derived = public_key_for_scalar(&candidate_scalar);
        if &derived == target_public_key {
            return Ok(candidate_scalar);
        }
    }
    Err(VanityError::OffsetMismatch)
}

fn public_key_for_scalar(scalar: &[u8; 32]) -> [u8; 32] {
    use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
    use curve25519_dalek::scalar::Scalar;

    let s = Scalar::from_bytes_mod_order(*scalar);
    let point = &s * &ED25519_BASEPOINT_TABLE;
    encode_u_coordinate(
        &crate::edwards::Extended::decompress(point.compress().as_bytes())
            .expect("scalar multiple of the basepoint is always a valid point"),
    )
}
