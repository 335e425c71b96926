use crate::error::{Error, Result};
use tracing::debug;

/// Every algorithm identifier the crate accepts in options and headers
pub const ALGORITHMS: [&str; 13] = [
    "HS256", "HS384", "HS512", "RS256", "RS384", "RS512", "PS256", "PS384", "PS512", "ES256",
    "ES384", "ES512", "none",
];

const HMAC_FAMILY: [&str; 3] = ["HS256", "HS384", "HS512"];
const RSA_FAMILY: [&str; 3] = ["RS256", "RS384", "RS512"];
const ECDSA_FAMILY: [&str; 3] = ["ES256", "ES384", "ES512"];

/// Check if an identifier is in [`ALGORITHMS`]
pub fn is_supported(algorithm: &str) -> bool {
    ALGORITHMS.contains(&algorithm)
}

/// Policy for allowed algorithms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmPolicy {
    allowed: Vec<String>,
}

impl AlgorithmPolicy {
    /// Create a policy that allows only specific algorithms
    pub fn allow_only<I, S>(algorithms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: algorithms.into_iter().map(Into::into).collect(),
        }
    }

    /// Policy that allows any HMAC algorithm (HS256, HS384, HS512)
    pub fn hmac_any() -> Self {
        Self::allow_only(HMAC_FAMILY)
    }

    /// Policy that allows RS256, RS384 and RS512
    pub fn rsa_any() -> Self {
        Self::allow_only(RSA_FAMILY)
    }

    /// Policy that allows the RSA and ECDSA families
    pub fn asymmetric_any() -> Self {
        Self::allow_only(RSA_FAMILY.into_iter().chain(ECDSA_FAMILY))
    }

    /// Policy that allows only unsigned tokens
    pub fn none_only() -> Self {
        Self::allow_only(["none"])
    }

    /// Infer the algorithm families a secret can verify from its shape
    ///
    /// PEM certificates and SubjectPublicKeyInfo keys may carry RSA or EC
    /// material, PKCS#1 RSA public keys only RSA. Anything else is treated
    /// as an HMAC secret.
    pub fn from_key_shape(secret: &[u8]) -> Self {
        let text = String::from_utf8_lossy(secret);

        let policy = if text.contains("BEGIN CERTIFICATE") || text.contains("BEGIN PUBLIC KEY") {
            Self::asymmetric_any()
        } else if text.contains("BEGIN RSA PUBLIC KEY") {
            Self::rsa_any()
        } else {
            Self::hmac_any()
        };

        debug!(allowed = ?policy.allowed, "inferred algorithms from key shape");
        policy
    }

    /// Check if an algorithm is allowed
    pub fn is_allowed(&self, algorithm: &str) -> bool {
        self.allowed.iter().any(|a| a == algorithm)
    }

    /// Validate that an algorithm is allowed
    pub fn validate(&self, algorithm: &str) -> Result<()> {
        if self.is_allowed(algorithm) {
            Ok(())
        } else {
            Err(Error::AlgorithmNotAllowed {
                found: algorithm.to_string(),
                allowed: self.allowed.clone(),
            })
        }
    }

    /// Get the list of allowed algorithms
    pub fn allowed_algorithms(&self) -> &[String] {
        &self.allowed
    }
}
