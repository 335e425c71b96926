//! Size bounds applied before any decoding or parsing
//!
//! `DecodedToken::from_string` rejects an oversized token or signature
//! segment with `Error::TokenTooLarge` before any segment is decoded. Decoded
//! header and payload bounds fail the base64 step, and the decoded signature
//! bound is enforced by `Jws` when it compares MACs.

/// Whole compact token (64KB), checked before the string is split
pub(crate) const MAX_TOKEN_LENGTH: usize = 64 * 1024;

/// Decoded header JSON (8KB)
///
/// Issued headers carry only `alg`, `typ` and an optional `kid`.
pub(crate) const MAX_DECODED_HEADER_SIZE: usize = 8 * 1024;

/// Decoded payload JSON (64KB), the same as the token bound
pub(crate) const MAX_DECODED_PAYLOAD_SIZE: usize = 64 * 1024;

/// Decoded signature bytes (1KB)
///
/// HS512 needs 64 bytes; the headroom admits RSA-4096 and ECDSA signatures
/// handled by caller-supplied verifiers.
pub(crate) const MAX_DECODED_SIGNATURE_SIZE: usize = 1024;

/// Base64url signature segment (1.5KB), about 4/3 of the decoded bound
pub(crate) const MAX_SIGNATURE_B64_SIZE: usize = 1536;

/// Shorthand duration strings such as `"15d"` or `"2.5 hrs"`
pub(crate) const MAX_DURATION_STRING_LENGTH: usize = 100;
