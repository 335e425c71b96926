//! Token verification
//!
//! [`TokenValidator`] runs one verification in a fixed order: options are
//! checked and defaulted first, so configuration mistakes surface before the
//! token is looked at. The token is then decoded, its signature/secret
//! pairing checked, its `alg` matched against the allowed algorithms and its
//! signature handed to the [`Verifier`]. Only a verified payload reaches the
//! claims pipeline.

use crate::algorithm::{self, AlgorithmPolicy};
use crate::claims::{Claims, ClaimsPolicy, validate_claims};
use crate::error::{Error, Result};
use crate::jws::{Jws, Verifier};
use crate::options::{Options, Value, ValueKind};
use crate::schema::{FieldDef, OptionsRecord, Schema, Validator};
use crate::token::DecodedToken;
use crate::utils::clock::current_timestamp;
use std::sync::{Arc, LazyLock};
use tracing::debug;

static VERIFY_OPTIONS: LazyLock<Result<Validator>> = LazyLock::new(|| {
    Schema::new()
        .field(
            "algorithms",
            FieldDef::new([ValueKind::StringList]).validator(|v| {
                v.as_string_list()
                    .is_some_and(|list| list.iter().all(|a| algorithm::is_supported(a)))
            }),
        )
        .field(
            "audience",
            vec![
                ValueKind::String,
                ValueKind::Pattern,
                ValueKind::StringList,
                ValueKind::PatternList,
            ],
        )
        .field("issuer", vec![ValueKind::String, ValueKind::StringList])
        .field("subject", ValueKind::String)
        .field("jwtId", ValueKind::String)
        .field(
            "nonce",
            FieldDef::new([ValueKind::String])
                .validator(|v| v.as_str().is_some_and(|s| !s.trim().is_empty())),
        )
        .field("maxAge", vec![ValueKind::Number, ValueKind::String])
        .field(
            "clockTimestamp",
            FieldDef::new([ValueKind::Number])
                .default_with(|| Value::from(current_timestamp())),
        )
        .field(
            "clockTolerance",
            FieldDef::new([ValueKind::Number, ValueKind::String]).default_value(0),
        )
        .field("ignoreExpire", ValueKind::Boolean)
        .field("ignoreNotBefore", ValueKind::Boolean)
        .compile()
});

/// Compiled verification option schema
pub fn verify_options() -> Result<&'static Validator> {
    VERIFY_OPTIONS.as_ref().map_err(Clone::clone)
}

/// JWT token validator
///
/// The validator is configured once and can be reused for multiple token
/// verifications. The default verifier is the built-in [`Jws`].
#[derive(Clone)]
pub struct TokenValidator {
    config_verifier: Arc<dyn Verifier + Send + Sync>,
}

impl Default for TokenValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenValidator {
    pub fn new() -> Self {
        Self {
            config_verifier: Arc::new(Jws),
        }
    }

    /// Configure the verification collaborator
    pub fn verifier<V>(&mut self, verifier: V) -> &mut Self
    where
        V: Verifier + Send + Sync + 'static,
    {
        self.config_verifier = Arc::new(verifier);
        self
    }

    pub fn build(&mut self) -> Self {
        self.clone()
    }

    /// Verify a compact token and return its payload
    ///
    /// An empty `secret` is only accepted for unsigned tokens, which are
    /// then restricted to the `none` algorithm.
    pub fn verify(&self, token: &str, secret: &[u8], options: &Options) -> Result<Claims> {
        let record = verify_options()?.apply(options)?;
        let policy = ClaimsPolicy::from_record(&record)?;

        if token.is_empty() {
            return Err(Error::TokenMissing);
        }

        let decoded = DecodedToken::from_string(token)?;
        let algorithms = allowed_algorithms(&decoded, secret, &record)?;

        let algorithm = decoded.header().algorithm_str();
        algorithms.validate(algorithm)?;

        let valid = self
            .config_verifier
            .verify(token, algorithm, secret)
            .map_err(|e| Error::Verification(e.to_string()))?;
        if !valid {
            debug!(algorithm, "signature rejected");
            return Err(Error::SignatureInvalid);
        }

        validate_claims(decoded.payload(), &policy)?;

        Ok(decoded.into_payload())
    }
}

/// Pair the signature with the secret and settle the allowed algorithms
fn allowed_algorithms(
    decoded: &DecodedToken,
    secret: &[u8],
    record: &OptionsRecord,
) -> Result<AlgorithmPolicy> {
    match (decoded.has_signature(), !secret.is_empty()) {
        (false, true) => Err(Error::SignatureRequired),
        (true, false) => Err(Error::SecretRequired),
        (false, false) => Ok(AlgorithmPolicy::none_only()),
        (true, true) => Ok(match record.get_string_list("algorithms") {
            Some(list) => AlgorithmPolicy::allow_only(list.iter().cloned()),
            None => AlgorithmPolicy::from_key_shape(secret),
        }),
    }
}

/// Verify with the built-in HMAC/none verifier
///
/// # Example
///
/// ```
/// use jwtpolicy::{Options, sign, verify};
/// use serde_json::json;
///
/// let token = sign(&json!({"role": "admin"}), b"secret", &Options::new().with("issuer", "auth"))?;
/// let claims = verify(&token, b"secret", &Options::new().with("issuer", "auth"))?;
/// assert_eq!(claims["role"], "admin");
/// # Ok::<(), jwtpolicy::Error>(())
/// ```
pub fn verify(token: &str, secret: &[u8], options: &Options) -> Result<Claims> {
    TokenValidator::new().verify(token, secret, options)
}

/// Decode a token's payload without verifying anything
pub fn decode(token: &str) -> Result<Claims> {
    DecodedToken::from_string(token).map(DecodedToken::into_payload)
}

/// Check an already trusted payload against verification options
///
/// Returns a copy of the payload when every claim check passes.
pub fn validate(payload: &Claims, options: &Options) -> Result<Claims> {
    let record = verify_options()?.apply(options)?;
    validate_claims(payload, &ClaimsPolicy::from_record(&record)?).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jws::CollaboratorError;
    use crate::utils::base64url;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    fn create_test_token(payload: &str, secret: &[u8]) -> String {
        let header = r#"{"alg":"HS256","typ":"JWT"}"#;

        let header_b64 = base64url::encode(header);
        let payload_b64 = base64url::encode(payload);
        let signing_input = format!("{}.{}", header_b64, payload_b64);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
        mac.update(signing_input.as_bytes());
        let signature_bytes = mac.finalize().into_bytes();
        let signature_b64 = base64url::encode_bytes(&signature_bytes);

        format!("{}.{}", signing_input, signature_b64)
    }

    fn unsigned_token(payload: &str) -> String {
        format!(
            "{}.{}.",
            base64url::encode(r#"{"alg":"none"}"#),
            base64url::encode(payload)
        )
    }

    #[test]
    fn test_full_validation_flow() {
        let now = current_timestamp();
        let token = create_test_token(
            &format!(r#"{{"iss":"https://example.com","sub":"user123","exp":{}}}"#, now + 3600),
            b"test-secret",
        );

        let claims = verify(
            &token,
            b"test-secret",
            &Options::new().with("issuer", "https://example.com"),
        )
        .unwrap();
        assert_eq!(claims["sub"], "user123");
    }

    #[test]
    fn test_empty_token() {
        assert_eq!(
            verify("", b"secret", &Options::new()),
            Err(Error::TokenMissing)
        );
    }

    #[test]
    fn test_options_checked_before_token() {
        assert_eq!(
            verify("", b"secret", &Options::new().with("subject", 1)),
            Err(Error::SchemaType("subject".into()))
        );
        assert_eq!(
            verify("", b"secret", &Options::new().with("nonce", " ")),
            Err(Error::SchemaValidation("nonce".into()))
        );
        assert_eq!(
            verify("", b"secret", &Options::new().with("algorithms", vec!["HS256", "XX1"])),
            Err(Error::SchemaValidation("algorithms".into()))
        );
        assert!(matches!(
            verify("", b"secret", &Options::new().with("maxAge", "forever")),
            Err(Error::InvalidClaimValue { claim, .. }) if claim == "maxAge"
        ));
    }

    #[test]
    fn test_signature_secret_pairing() {
        let signed = create_test_token("{}", b"secret");
        let unsigned = unsigned_token("{}");

        assert_eq!(
            verify(&unsigned, b"secret", &Options::new()),
            Err(Error::SignatureRequired)
        );
        assert_eq!(
            verify(&signed, b"", &Options::new()),
            Err(Error::SecretRequired)
        );
        assert!(verify(&unsigned, b"", &Options::new()).is_ok());
    }

    #[test]
    fn test_unsigned_token_forces_none() {
        // "algorithms" is overridden for unsigned tokens without a secret
        let header_says_hs256 = format!(
            "{}.{}.",
            base64url::encode(r#"{"alg":"HS256"}"#),
            base64url::encode("{}")
        );
        let result = verify(
            &header_says_hs256,
            b"",
            &Options::new().with("algorithms", vec!["HS256"]),
        );
        assert!(matches!(result, Err(Error::AlgorithmNotAllowed { found, .. }) if found == "HS256"));
    }

    #[test]
    fn test_algorithm_policy() {
        let token = create_test_token("{}", b"secret");

        assert!(verify(&token, b"secret", &Options::new().with("algorithms", vec!["HS256"])).is_ok());
        assert_eq!(
            verify(&token, b"secret", &Options::new().with("algorithms", vec!["HS512"])),
            Err(Error::AlgorithmNotAllowed {
                found: "HS256".into(),
                allowed: vec!["HS512".into()],
            })
        );

        // A PEM public key only admits asymmetric algorithms
        let pem = b"-----BEGIN PUBLIC KEY-----\nMFkw\n-----END PUBLIC KEY-----";
        assert!(matches!(
            verify(&token, pem, &Options::new()),
            Err(Error::AlgorithmNotAllowed { .. })
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let token = create_test_token("{}", b"secret");
        assert_eq!(
            verify(&token, b"other", &Options::new()),
            Err(Error::SignatureInvalid)
        );
    }

    #[test]
    fn test_claims_checked_after_signature() {
        let token = create_test_token(r#"{"exp":1}"#, b"secret");
        assert!(matches!(
            verify(&token, b"secret", &Options::new()),
            Err(Error::TokenExpired { expired_at: 1, .. })
        ));
        assert_eq!(
            verify(&token, b"other", &Options::new()),
            Err(Error::SignatureInvalid)
        );
    }

    #[test]
    fn test_clock_options() {
        let token = create_test_token(r#"{"exp":1000}"#, b"secret");
        let at = |ts: i64| Options::new().with("clockTimestamp", ts);

        assert!(verify(&token, b"secret", &at(999)).is_ok());
        assert!(verify(&token, b"secret", &at(1000)).is_err());
        assert!(verify(&token, b"secret", &at(1000).with("clockTolerance", "1s")).is_ok());
        assert!(verify(&token, b"secret", &at(5000).with("ignoreExpire", true)).is_ok());
    }

    #[test]
    fn test_decode_does_not_verify() {
        let token = create_test_token(r#"{"exp":1,"sub":"x"}"#, b"secret");
        let claims = decode(&token).unwrap();
        assert_eq!(claims["sub"], "x");
        assert_eq!(decode("a.b"), Err(Error::FormatInvalid));
    }

    #[test]
    fn test_validate_payload() {
        let payload: Claims = serde_json::from_str(r#"{"iss":"a","iat":100}"#).unwrap();
        assert_eq!(validate(&payload, &Options::new().with("issuer", "a")), Ok(payload.clone()));
        assert!(matches!(
            validate(
                &payload,
                &Options::new().with("maxAge", 50).with("clockTimestamp", 200)
            ),
            Err(Error::TokenExpired { expired_at: 150, .. })
        ));
    }

    struct Rejecting;

    impl Verifier for Rejecting {
        fn verify(
            &self,
            _token: &str,
            algorithm: &str,
            _secret: &[u8],
        ) -> std::result::Result<bool, CollaboratorError> {
            Err(format!("cannot verify {algorithm}").into())
        }
    }

    #[test]
    fn test_custom_verifier_error() {
        let token = create_test_token("{}", b"secret");
        let validator = TokenValidator::new().verifier(Rejecting).build();
        assert_eq!(
            validator.verify(&token, b"secret", &Options::new()),
            Err(Error::Verification("cannot verify HS256".into()))
        );
    }
}
