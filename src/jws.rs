//! Signing and verification collaborators
//!
//! The issuance policy and the verification front door never touch key
//! material directly. They hand a header, a payload and a secret to a
//! [`Signer`], or a compact token to a [`Verifier`]. [`Jws`] is the built-in
//! collaborator for the HMAC family and unsigned (`none`) tokens; asymmetric
//! algorithms need a caller-supplied implementation.

use crate::claims::Claims;
use crate::limits::MAX_DECODED_SIGNATURE_SIZE;
use crate::token::TokenHeader;
use crate::utils::base64url;

use base64::{Engine, engine::general_purpose::STANDARD};
use constant_time_eq::constant_time_eq;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use std::borrow::Cow;

/// Error reported by a collaborator
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Produces a compact token from a header and payload
pub trait Signer {
    /// Sign and serialize `payload` under `header`
    ///
    /// `encoding` tells how the secret bytes are to be read: `"utf8"` uses
    /// them as-is, `"base64"` decodes them first.
    fn sign(
        &self,
        header: &TokenHeader,
        payload: &Claims,
        secret: &[u8],
        encoding: &str,
    ) -> std::result::Result<String, CollaboratorError>;
}

/// Checks the signature of a compact token
pub trait Verifier {
    /// `Ok(false)` means the signature does not match
    fn verify(
        &self,
        token: &str,
        algorithm: &str,
        secret: &[u8],
    ) -> std::result::Result<bool, CollaboratorError>;
}

/// Built-in HS256/HS384/HS512 and `none` collaborator
#[derive(Debug, Clone, Copy, Default)]
pub struct Jws;

impl Signer for Jws {
    fn sign(
        &self,
        header: &TokenHeader,
        payload: &Claims,
        secret: &[u8],
        encoding: &str,
    ) -> std::result::Result<String, CollaboratorError> {
        let key = decode_secret(secret, encoding)?;
        let payload_json = serde_json::to_string(payload)?;

        let signing_input = format!(
            "{}.{}",
            base64url::encode(&header.to_json()),
            base64url::encode(&payload_json)
        );

        let signature = match header.algorithm_str() {
            "none" => String::new(),
            algorithm => base64url::encode_bytes(&compute_mac(algorithm, &key, &signing_input)?),
        };

        Ok(format!("{signing_input}.{signature}"))
    }
}

impl Verifier for Jws {
    fn verify(
        &self,
        token: &str,
        algorithm: &str,
        secret: &[u8],
    ) -> std::result::Result<bool, CollaboratorError> {
        let (signing_input, signature) = token
            .rsplit_once('.')
            .ok_or("token has no signature segment")?;

        if algorithm == "none" {
            return Ok(signature.is_empty());
        }

        let expected = compute_mac(algorithm, secret, signing_input)?;

        // An undecodable signature is simply a mismatch
        let Ok(provided) = base64url::decode_bytes(signature, MAX_DECODED_SIGNATURE_SIZE) else {
            return Ok(false);
        };

        if provided.len() != expected.len() {
            return Ok(false);
        }

        Ok(constant_time_eq(&provided, &expected))
    }
}

fn decode_secret<'a>(
    secret: &'a [u8],
    encoding: &str,
) -> std::result::Result<Cow<'a, [u8]>, CollaboratorError> {
    match encoding {
        "utf8" => Ok(Cow::Borrowed(secret)),
        "base64" => Ok(Cow::Owned(STANDARD.decode(secret)?)),
        other => Err(format!("unsupported secret encoding '{other}'").into()),
    }
}

fn compute_mac(
    algorithm: &str,
    key: &[u8],
    signing_input: &str,
) -> std::result::Result<Vec<u8>, CollaboratorError> {
    match algorithm {
        "HS256" => mac::<Hmac<Sha256>>(key, signing_input),
        "HS384" => mac::<Hmac<Sha384>>(key, signing_input),
        "HS512" => mac::<Hmac<Sha512>>(key, signing_input),
        other => Err(format!("algorithm '{other}' requires an external collaborator").into()),
    }
}

fn mac<M: Mac + KeyInit>(
    key: &[u8],
    signing_input: &str,
) -> std::result::Result<Vec<u8>, CollaboratorError> {
    let mut mac = <M as KeyInit>::new_from_slice(key).map_err(|e| e.to_string())?;
    mac.update(signing_input.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
