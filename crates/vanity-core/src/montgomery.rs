//! Montgomery u-coordinate decoding (C7) and RFC 7748 scalar clamping.

use crate::edwards::Extended;
use crate::error::VanityError;
use crate::field::FieldElement;

/// RFC 7748 §5 clamp: clear the low 3 bits of byte 0, clear the top
/// bit and set bit 6 of byte 31. Applied to a 32-byte scalar before it
/// is used as a private key.
pub fn clamp_scalar(seed: &[u8; 32]) -> [u8; 32] {
    let mut s = *seed;
    s[0] &= 0xf8;
    s[31] &= 0x7f;
    s[31] |= 0x40;
    s
}

/// Decode a 32-byte Montgomery u-coordinate into the corresponding
/// Edwards point. `y = (u-1)/(u+1)`, then decoded as a compressed
/// Edwards point with sign bit 0 (the sign is not recoverable from `u`
/// alone; callers that need a canonical key use the positive-x form).
///
/// Fails if `u = -1` (the denominator `u+1` is zero) or if the
/// resulting point does not lie on the curve.
pub fn decode_u_coordinate(bytes: &[u8; 32]) -> Result<Extended, VanityError> {
    let u = FieldElement::from_bytes(bytes);
    let denom = u.add(&FieldElement::ONE);
    if denom.is_zero() {
        return Err(VanityError::InvalidPublicKey("u = -1 has no corresponding Edwards point".into()));
    }
    let y = u.sub(&FieldElement::ONE).mul(&denom.invert());
    let mut y_bytes = y.to_bytes();
    y_bytes[31] &= 0x7f;
    Extended::decompress(&y_bytes)
        .ok_or_else(|| VanityError::InvalidPublicKey("u-coordinate does not correspond to a valid curve point".into()))
}

/// Encode an Edwards point's affine `y` back to its Montgomery
/// u-coordinate: `u = (1+y)/(1-y)`.
pub fn encode_u_coordinate(point: &Extended) -> [u8; 32] {
    let affine = point.to_affine();
    let num = FieldElement::ONE.add(&affine.y);
    let den = FieldElement::ONE.sub(&affine.y);
    num.mul(&den.invert()).to_bytes()
}
