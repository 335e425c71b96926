//! Token issuance
//!
//! [`TokenIssuer`] validates issuance options, copies the caller's payload,
//! injects the registered claims the options ask for and hands the result to
//! a [`Signer`].

use crate::algorithm;
use crate::claims::Claims;
use crate::duration::parse_duration;
use crate::error::{Error, Result};
use crate::jws::{Jws, Signer};
use crate::options::{Options, Value, ValueKind};
use crate::schema::{FieldDef, OptionsRecord, Schema, Validator};
use crate::token::TokenHeader;
use crate::utils::clock::current_timestamp;
use serde_json::Value as Json;
use std::sync::{Arc, LazyLock};
use tracing::debug;

const DEFAULT_ALGORITHM: &str = "HS256";
const DEFAULT_ENCODING: &str = "utf8";

/// Option name to claim name, for claims copied verbatim
const COPIED_CLAIMS: [(&str, &str); 4] = [
    ("audience", "aud"),
    ("issuer", "iss"),
    ("subject", "sub"),
    ("jwtId", "jti"),
];

static SIGN_OPTIONS: LazyLock<Result<Validator>> = LazyLock::new(|| {
    Schema::new()
        .field(
            "algorithm",
            FieldDef::new([ValueKind::String])
                .default_value(DEFAULT_ALGORITHM)
                .validator(|v| v.as_str().is_some_and(algorithm::is_supported)),
        )
        .field("audience", vec![ValueKind::String, ValueKind::StringList])
        .field("issuer", ValueKind::String)
        .field("subject", ValueKind::String)
        .field("jwtId", ValueKind::String)
        .field("keyId", ValueKind::String)
        .field("expiresIn", vec![ValueKind::Number, ValueKind::String])
        .field("notBefore", vec![ValueKind::Number, ValueKind::String])
        .field("issuedAt", vec![ValueKind::Number, ValueKind::String])
        .field(
            "encoding",
            FieldDef::new([ValueKind::String])
                .default_value(DEFAULT_ENCODING)
                .validator(|v| matches!(v.as_str(), Some("utf8" | "base64"))),
        )
        .field(
            "timestamp",
            FieldDef::new([ValueKind::Boolean]).default_value(true),
        )
        .compile()
});

/// Compiled issuance option schema
pub fn sign_options() -> Result<&'static Validator> {
    SIGN_OPTIONS.as_ref().map_err(Clone::clone)
}

/// JWT token issuer
///
/// Configured once and reusable for any number of tokens. The default signer
/// is the built-in [`Jws`].
#[derive(Clone)]
pub struct TokenIssuer {
    config_signer: Arc<dyn Signer + Send + Sync>,
}

impl Default for TokenIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenIssuer {
    pub fn new() -> Self {
        Self {
            config_signer: Arc::new(Jws),
        }
    }

    /// Configure the signing collaborator
    pub fn signer<S>(&mut self, signer: S) -> &mut Self
    where
        S: Signer + Send + Sync + 'static,
    {
        self.config_signer = Arc::new(signer);
        self
    }

    pub fn build(&mut self) -> Self {
        self.clone()
    }

    /// Sign `payload` into a compact token
    ///
    /// `payload` must be a JSON object; it is copied, never modified.
    pub fn sign(&self, payload: &Json, secret: &[u8], options: &Options) -> Result<String> {
        let record = sign_options()?.apply(options)?;

        let algorithm = record.get_str("algorithm").unwrap_or(DEFAULT_ALGORITHM);
        if secret.is_empty() && algorithm != "none" {
            return Err(Error::MissingSecret);
        }

        let mut claims = payload.as_object().cloned().ok_or(Error::InvalidPayload)?;
        inject_claims(&mut claims, &record, current_timestamp())?;

        let header = TokenHeader::new(algorithm, record.get_str("keyId").map(String::from));
        let encoding = record.get_str("encoding").unwrap_or(DEFAULT_ENCODING);

        debug!(algorithm, claims = claims.len(), "issuing token");

        self.config_signer
            .sign(&header, &claims, secret, encoding)
            .map_err(|e| Error::Signing(e.to_string()))
    }
}

fn inject_claims(claims: &mut Claims, record: &OptionsRecord, now: i64) -> Result<()> {
    if record.get_bool("timestamp").unwrap_or(true) {
        let issued_at = match record.get("issuedAt") {
            Some(value) => parse_duration(value, "issuedAt")?,
            None => 0,
        };
        let iat = if issued_at > 0 {
            timestamp(issued_at, "issuedAt")?
        } else {
            now
        };
        claims.insert("iat".into(), Json::from(iat));
    }

    if let Some(value) = record.get("expiresIn") {
        let expires_in = timestamp(parse_duration(value, "expiresIn")?, "expiresIn")?;
        let exp = now
            .checked_add(expires_in)
            .ok_or_else(|| out_of_range("expiresIn"))?;
        claims.insert("exp".into(), Json::from(exp));
    }

    if let Some(value) = record.get("notBefore") {
        claims.insert("nbf".into(), Json::from(parse_duration(value, "notBefore")?));
    }

    for (option, claim) in COPIED_CLAIMS {
        match record.get(option) {
            Some(Value::String(s)) => {
                claims.insert(claim.into(), Json::from(s.as_str()));
            }
            Some(Value::StringList(list)) => {
                claims.insert(claim.into(), Json::from(list.clone()));
            }
            _ => {}
        }
    }

    Ok(())
}

fn timestamp(seconds: u64, claim: &str) -> Result<i64> {
    i64::try_from(seconds).map_err(|_| out_of_range(claim))
}

fn out_of_range(claim: &str) -> Error {
    Error::InvalidClaimValue {
        claim: claim.to_string(),
        reason: "timestamp out of range".into(),
    }
}

/// Sign `payload` with the built-in HMAC/none signer
///
/// # Example
///
/// ```
/// use jwtpolicy::{Options, sign};
/// use serde_json::json;
///
/// let options = Options::new().with("expiresIn", "1h").with("issuer", "auth");
/// let token = sign(&json!({"role": "admin"}), b"secret", &options)?;
/// assert_eq!(token.split('.').count(), 3);
/// # Ok::<(), jwtpolicy::Error>(())
/// ```
pub fn sign(payload: &Json, secret: &[u8], options: &Options) -> Result<String> {
    TokenIssuer::new().sign(payload, secret, options)
}
