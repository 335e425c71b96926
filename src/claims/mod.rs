mod validator;

pub use validator::{AudienceMatcher, ClaimsPolicy, validate_claims};

/// Decoded token payload
///
/// Registered claims (`iss`, `sub`, `aud`, `exp`, `nbf`, `iat`, `jti`) sit
/// next to any custom claims; `aud` may be a string or an array of strings.
pub type Claims = serde_json::Map<String, serde_json::Value>;
