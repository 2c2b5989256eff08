use thiserror::Error;

/// Errors surfaced by the search and recovery operations.
///
/// Input-decoding errors (`InvalidPrefix`, `InvalidPublicKey`,
/// `InvalidPrivateKey`) are raised synchronously before any worker
/// starts. Terminal search outcomes that aren't decoding failures
/// (cancelled, timed out, exhausted) are carried as `SearchStatus`
/// values inside a successful `Ok(SearchOutcome)` instead of as
/// `VanityError` variants, since a search that stopped without a match
/// is a valid outcome, not a failure to decode or recover a key.
/// Arithmetic failures in the field layer (a zero modular inverse) are
/// not represented here either, because they indicate a bug in this
/// crate on well-formed input, not a caller error, and panic instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VanityError {
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("offset recovery mismatch: neither s+8n nor s-8n reproduced the target")]
    OffsetMismatch,
}
