use crate::claims::Claims;
use crate::error::{Error, Result};
use crate::limits::{
    MAX_DECODED_HEADER_SIZE, MAX_DECODED_PAYLOAD_SIZE, MAX_SIGNATURE_B64_SIZE, MAX_TOKEN_LENGTH,
};
use crate::token::TokenHeader;
use crate::utils::base64url;

/// A compact token split and decoded, signature not yet checked
///
/// Nothing read from a `DecodedToken` can be trusted until a
/// [`Verifier`](crate::jws::Verifier) has accepted the signature.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    header: TokenHeader,
    payload: Claims,
    signing_input: String,
    signature: String,
}

impl DecodedToken {
    /// Parse a compact `header.payload.signature` string
    ///
    /// # Example
    /// ```
    /// use jwtpolicy::token::DecodedToken;
    ///
    /// let token = "eyJhbGciOiJub25lIn0.eyJzdWIiOiJ1c2VyIn0.";
    /// let decoded = DecodedToken::from_string(token)?;
    /// assert_eq!(decoded.header().algorithm_str(), "none");
    /// assert!(!decoded.has_signature());
    /// # Ok::<(), jwtpolicy::Error>(())
    /// ```
    pub fn from_string(token: &str) -> Result<Self> {
        if token.len() > MAX_TOKEN_LENGTH {
            return Err(Error::TokenTooLarge {
                size: token.len(),
                max: MAX_TOKEN_LENGTH,
            });
        }

        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(Error::FormatInvalid)?;
        let payload_b64 = parts.next().ok_or(Error::FormatInvalid)?;
        let signature_b64 = parts.next().ok_or(Error::FormatInvalid)?;
        if parts.next().is_some() {
            return Err(Error::FormatInvalid);
        }

        if signature_b64.len() > MAX_SIGNATURE_B64_SIZE {
            return Err(Error::TokenTooLarge {
                size: signature_b64.len(),
                max: MAX_SIGNATURE_B64_SIZE,
            });
        }

        let header_json = base64url::decode_string(header_b64, MAX_DECODED_HEADER_SIZE)?;
        let header: TokenHeader = miniserde::json::from_str(&header_json)
            .map_err(|e| Error::FormatInvalidJson(format!("Failed to parse header: {e}")))?;

        let payload_json = base64url::decode_string(payload_b64, MAX_DECODED_PAYLOAD_SIZE)?;
        let payload = match serde_json::from_str(&payload_json) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => {
                return Err(Error::FormatInvalidJson(
                    "Payload is not a JSON object".to_string(),
                ));
            }
            Err(e) => {
                return Err(Error::FormatInvalidJson(format!(
                    "Failed to parse payload: {e}"
                )));
            }
        };

        Ok(Self {
            header,
            payload,
            signing_input: format!("{header_b64}.{payload_b64}"),
            signature: signature_b64.to_string(),
        })
    }

    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    pub fn payload(&self) -> &Claims {
        &self.payload
    }

    pub fn into_payload(self) -> Claims {
        self.payload
    }

    /// Raw base64url signature segment
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The `header.payload` part the signature covers
    pub fn signing_input(&self) -> &str {
        &self.signing_input
    }

    /// A blank signature segment counts as no signature
    pub fn has_signature(&self) -> bool {
        !self.signature.trim().is_empty()
    }
}
