//! Errors for jwtpolicy

use thiserror::Error;

/// Rule that rejected a token as expired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The `exp` claim has passed
    Claim,
    /// The token is older than the configured `maxAge`
    MaxAge,
}

impl std::fmt::Display for Expiry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expiry::Claim => write!(f, "exp claim"),
            Expiry::MaxAge => write!(f, "maxAge exceeded"),
        }
    }
}

/// jwtpolicy Errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ============================================================================
    // Schema Errors
    // ============================================================================
    #[error("Invalid schema for option '{field}': {reason}")]
    SchemaDefinition { field: String, reason: String },

    #[error("Type error in option '{0}'")]
    SchemaType(String),

    #[error("Option '{0}' is required")]
    SchemaRequired(String),

    #[error("Validation error in option '{0}'")]
    SchemaValidation(String),

    #[error("Invalid option '{option}': {reason}")]
    InvalidOption { option: String, reason: String },

    // ============================================================================
    // Claim Value Errors
    // ============================================================================
    #[error("Invalid {claim} value: {reason}")]
    InvalidClaimValue { claim: String, reason: String },

    // ============================================================================
    // Issuance Errors
    // ============================================================================
    #[error("Secret is required unless the algorithm is 'none'")]
    MissingSecret,

    #[error("Payload is not an object")]
    InvalidPayload,

    // ============================================================================
    // Format Errors
    // ============================================================================
    #[error("No token provided")]
    TokenMissing,

    #[error("Token too large: {size} bytes (maximum: {max} bytes)")]
    TokenTooLarge { size: usize, max: usize },

    #[error("Invalid JWT format: expected three parts separated by '.'")]
    FormatInvalid,

    #[error("Base64URL decoding failed: {0}")]
    FormatInvalidBase64(String),

    #[error("JSON parsing failed: {0}")]
    FormatInvalidJson(String),

    // ============================================================================
    // Signature Errors
    // ============================================================================
    #[error("JWT signature is required")]
    SignatureRequired,

    #[error("Secret is required to verify a signed token")]
    SecretRequired,

    #[error("Algorithm '{found}' not allowed. Allowed: {allowed:?}")]
    AlgorithmNotAllowed { found: String, allowed: Vec<String> },

    #[error("Signature verification failed")]
    SignatureInvalid,

    // ============================================================================
    // Identity Claim Errors
    // ============================================================================
    #[error("Token audience mismatch: expected one of {expected:?}, found {found:?}")]
    AudienceMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Token issuer mismatch: expected one of {expected:?}, found {found:?}")]
    IssuerMismatch {
        expected: Vec<String>,
        found: Option<String>,
    },

    #[error("Token subject mismatch: expected '{expected}', found {found:?}")]
    SubjectMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error("Token jti mismatch: expected '{expected}', found {found:?}")]
    JwtIdMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error("Token nonce mismatch")]
    NonceMismatch,

    // ============================================================================
    // Temporal Claim Errors
    // ============================================================================
    #[error("Token not active until {not_before}")]
    TokenNotYetValid { not_before: i64 },

    #[error("Token expired at {expired_at} ({cause})")]
    TokenExpired { expired_at: i64, cause: Expiry },

    #[error("Payload iat is required when maxAge is set")]
    MissingIssuedAt,

    #[error("Invalid {0} value: expected a numeric date")]
    MalformedClaim(String),

    // ============================================================================
    // Collaborator Errors
    // ============================================================================
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Verification failed: {0}")]
    Verification(String),
}

impl Error {
    /// `true` for both expiry variants (`exp` passed or `maxAge` exceeded)
    pub fn is_expired(&self) -> bool {
        matches!(self, Error::TokenExpired { .. })
    }

    /// `true` for any rejection caused by a time-based claim
    ///
    /// Token renewal flows can use this to tell a stale token apart from a
    /// token that is wrong for this audience, issuer or subject.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Error::TokenExpired { .. }
                | Error::TokenNotYetValid { .. }
                | Error::MissingIssuedAt
                | Error::MalformedClaim(_)
        )
    }
}

/// Result type alias for jwtpolicy operations
pub type Result<T> = std::result::Result<T, Error>;
