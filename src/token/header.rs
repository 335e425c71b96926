use miniserde::Deserialize;

/// JWT header structure
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    /// Algorithm used for signing
    #[serde(rename = "alg")]
    pub algorithm: String,

    /// Token type (typically "JWT")
    #[serde(rename = "typ")]
    pub token_type: Option<String>,

    /// Key ID hint for the verifier
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
}

impl TokenHeader {
    /// Header for a freshly issued token
    pub fn new(algorithm: impl Into<String>, key_id: Option<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            token_type: Some("JWT".to_string()),
            key_id,
        }
    }

    /// Get algorithm as string
    pub fn algorithm_str(&self) -> &str {
        &self.algorithm
    }

    /// Get token type if present
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// Get key ID if present
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Serialize as compact JSON, members in `alg`, `typ`, `kid` order
    pub fn to_json(&self) -> String {
        let mut json = format!(r#"{{"alg":{}"#, quote(&self.algorithm));
        if let Some(typ) = &self.token_type {
            json.push_str(&format!(r#","typ":{}"#, quote(typ)));
        }
        if let Some(kid) = &self.key_id {
            json.push_str(&format!(r#","kid":{}"#, quote(kid)));
        }
        json.push('}');
        json
    }
}

fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
