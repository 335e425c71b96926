use crate::claims::Claims;
use crate::duration::parse_duration;
use crate::error::{Error, Expiry, Result};
use crate::options::Value;
use crate::schema::OptionsRecord;
use crate::utils::clock::current_timestamp;
use regex::Regex;
use serde_json::Value as Json;
use tracing::debug;

/// One accepted audience
#[derive(Debug, Clone)]
pub enum AudienceMatcher {
    /// Must equal the `aud` entry
    Exact(String),
    /// Must match somewhere in the `aud` entry (unanchored)
    Pattern(Regex),
}

impl AudienceMatcher {
    pub fn matches(&self, audience: &str) -> bool {
        match self {
            AudienceMatcher::Exact(expected) => expected == audience,
            AudienceMatcher::Pattern(pattern) => pattern.is_match(audience),
        }
    }
}

impl std::fmt::Display for AudienceMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudienceMatcher::Exact(expected) => write!(f, "{expected}"),
            AudienceMatcher::Pattern(pattern) => write!(f, "/{}/", pattern.as_str()),
        }
    }
}

/// What a decoded payload must satisfy
///
/// Identity checks are skipped when their expectation is unset. Temporal
/// checks run whenever the claim is present, unless switched off.
#[derive(Debug, Clone, Default)]
pub struct ClaimsPolicy {
    /// Accepted audiences; any overlap with `aud` passes
    pub audience: Option<Vec<AudienceMatcher>>,

    /// Accepted issuers
    pub issuer: Option<Vec<String>>,

    pub subject: Option<String>,

    pub jwt_id: Option<String>,

    pub nonce: Option<String>,

    /// Maximum token age in seconds, measured from `iat` (0 disables)
    pub max_age: Option<u64>,

    /// Unix time to validate against; the system clock when unset
    pub clock_timestamp: Option<f64>,

    /// Seconds of leeway for `nbf`, `exp` and max age
    pub clock_tolerance: u64,

    pub ignore_expire: bool,

    pub ignore_not_before: bool,
}

impl ClaimsPolicy {
    /// Create an empty policy (temporal checks only)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a policy from validated verification options
    ///
    /// Durations (`maxAge`, `clockTolerance`) go through the duration
    /// parser, so `"1h"` and `3600` are equivalent.
    pub fn from_record(record: &OptionsRecord) -> Result<Self> {
        let audience = record.get("audience").map(|value| match value {
            Value::String(s) => vec![AudienceMatcher::Exact(s.clone())],
            Value::StringList(list) => list.iter().cloned().map(AudienceMatcher::Exact).collect(),
            Value::Pattern(p) => vec![AudienceMatcher::Pattern(p.clone())],
            Value::PatternList(list) => list.iter().cloned().map(AudienceMatcher::Pattern).collect(),
            _ => Vec::new(),
        });

        let issuer = record.get("issuer").map(|value| match value {
            Value::String(s) => vec![s.clone()],
            Value::StringList(list) => list.clone(),
            _ => Vec::new(),
        });

        let max_age = record
            .get("maxAge")
            .map(|value| parse_duration(value, "maxAge"))
            .transpose()?;

        let clock_tolerance = record
            .get("clockTolerance")
            .map(|value| parse_duration(value, "clockTolerance"))
            .transpose()?
            .unwrap_or(0);

        Ok(Self {
            audience,
            issuer,
            subject: record.get_str("subject").map(String::from),
            jwt_id: record.get_str("jwtId").map(String::from),
            nonce: record.get_str("nonce").map(String::from),
            max_age,
            clock_timestamp: record.get_f64("clockTimestamp"),
            clock_tolerance,
            ignore_expire: record.get_bool("ignoreExpire").unwrap_or(false),
            ignore_not_before: record.get_bool("ignoreNotBefore").unwrap_or(false),
        })
    }

    /// Accept an exact audience
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience
            .get_or_insert_with(Vec::new)
            .push(AudienceMatcher::Exact(audience.into()));
        self
    }

    /// Accept any audience matching `pattern`
    pub fn audience_pattern(mut self, pattern: Regex) -> Self {
        self.audience
            .get_or_insert_with(Vec::new)
            .push(AudienceMatcher::Pattern(pattern));
        self
    }

    /// Accept an issuer
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer.get_or_insert_with(Vec::new).push(issuer.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn jwt_id(mut self, jwt_id: impl Into<String>) -> Self {
        self.jwt_id = Some(jwt_id.into());
        self
    }

    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Set maximum token age
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Validate as if the current time were `timestamp`
    pub fn clock_timestamp(mut self, timestamp: f64) -> Self {
        self.clock_timestamp = Some(timestamp);
        self
    }

    /// Set clock tolerance
    pub fn clock_tolerance(mut self, seconds: u64) -> Self {
        self.clock_tolerance = seconds;
        self
    }

    /// Disable expiration validation
    pub fn ignore_expire(mut self) -> Self {
        self.ignore_expire = true;
        self
    }

    /// Disable not-before validation
    pub fn ignore_not_before(mut self) -> Self {
        self.ignore_not_before = true;
        self
    }
}

struct Context<'a> {
    payload: &'a Claims,
    policy: &'a ClaimsPolicy,
    now: f64,
    tolerance: f64,
}

type Check = fn(&Context<'_>) -> Result<()>;

// Evaluation order is part of the contract: the first failure is reported
const CHECKS: &[(&str, Check)] = &[
    ("aud", check_audience),
    ("iss", check_issuer),
    ("sub", check_subject),
    ("jti", check_jwt_id),
    ("nonce", check_nonce),
    ("nbf", check_not_before),
    ("exp", check_expiration),
    ("maxAge", check_max_age),
];

/// Run every claim check against `payload`, stopping at the first failure
///
/// Returns the untouched payload when every check passes.
pub fn validate_claims<'a>(payload: &'a Claims, policy: &ClaimsPolicy) -> Result<&'a Claims> {
    let context = Context {
        payload,
        policy,
        now: policy
            .clock_timestamp
            .unwrap_or_else(|| current_timestamp() as f64),
        tolerance: policy.clock_tolerance as f64,
    };

    for (claim, check) in CHECKS {
        if let Err(error) = check(&context) {
            debug!(claim, %error, "claim check rejected token");
            return Err(error);
        }
    }

    Ok(payload)
}

/// Empty expectations are treated as unset
fn expectation(expected: &Option<String>) -> Option<&str> {
    expected.as_deref().filter(|e| !e.is_empty())
}

fn string_claim<'a>(payload: &'a Claims, name: &str) -> Option<&'a str> {
    payload.get(name).and_then(Json::as_str)
}

/// `None` for an absent or null claim
fn numeric_claim(payload: &Claims, name: &str) -> Result<Option<f64>> {
    match payload.get(name) {
        None | Some(Json::Null) => Ok(None),
        Some(Json::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| Error::MalformedClaim(name.to_string())),
        Some(_) => Err(Error::MalformedClaim(name.to_string())),
    }
}

fn check_audience(ctx: &Context<'_>) -> Result<()> {
    let Some(expected) = &ctx.policy.audience else {
        return Ok(());
    };

    let found: Vec<&str> = match ctx.payload.get("aud") {
        Some(Json::String(aud)) => vec![aud.as_str()],
        Some(Json::Array(items)) => items.iter().filter_map(Json::as_str).collect(),
        _ => Vec::new(),
    };

    let matched = expected
        .iter()
        .any(|matcher| found.iter().any(|aud| matcher.matches(aud)));

    if matched {
        Ok(())
    } else {
        Err(Error::AudienceMismatch {
            expected: expected.iter().map(ToString::to_string).collect(),
            found: found.into_iter().map(String::from).collect(),
        })
    }
}

fn check_issuer(ctx: &Context<'_>) -> Result<()> {
    let Some(expected) = &ctx.policy.issuer else {
        return Ok(());
    };

    let found = string_claim(ctx.payload, "iss");
    if found.is_some_and(|iss| expected.iter().any(|e| e == iss)) {
        Ok(())
    } else {
        Err(Error::IssuerMismatch {
            expected: expected.clone(),
            found: found.map(String::from),
        })
    }
}

fn check_subject(ctx: &Context<'_>) -> Result<()> {
    match expectation(&ctx.policy.subject) {
        Some(expected) if string_claim(ctx.payload, "sub") != Some(expected) => {
            Err(Error::SubjectMismatch {
                expected: expected.to_string(),
                found: string_claim(ctx.payload, "sub").map(String::from),
            })
        }
        _ => Ok(()),
    }
}

fn check_jwt_id(ctx: &Context<'_>) -> Result<()> {
    match expectation(&ctx.policy.jwt_id) {
        Some(expected) if string_claim(ctx.payload, "jti") != Some(expected) => {
            Err(Error::JwtIdMismatch {
                expected: expected.to_string(),
                found: string_claim(ctx.payload, "jti").map(String::from),
            })
        }
        _ => Ok(()),
    }
}

fn check_nonce(ctx: &Context<'_>) -> Result<()> {
    match expectation(&ctx.policy.nonce) {
        Some(expected) if string_claim(ctx.payload, "nonce") != Some(expected) => {
            Err(Error::NonceMismatch)
        }
        _ => Ok(()),
    }
}

fn check_not_before(ctx: &Context<'_>) -> Result<()> {
    if ctx.policy.ignore_not_before {
        return Ok(());
    }

    match numeric_claim(ctx.payload, "nbf")? {
        Some(nbf) if nbf > ctx.now + ctx.tolerance => Err(Error::TokenNotYetValid {
            not_before: nbf.floor() as i64,
        }),
        _ => Ok(()),
    }
}

fn check_expiration(ctx: &Context<'_>) -> Result<()> {
    if ctx.policy.ignore_expire {
        return Ok(());
    }

    match numeric_claim(ctx.payload, "exp")? {
        Some(exp) if ctx.now >= exp + ctx.tolerance => Err(Error::TokenExpired {
            expired_at: exp.floor() as i64,
            cause: Expiry::Claim,
        }),
        _ => Ok(()),
    }
}

fn check_max_age(ctx: &Context<'_>) -> Result<()> {
    let max_age = match ctx.policy.max_age {
        None | Some(0) => return Ok(()),
        Some(seconds) => seconds as f64,
    };

    let issued_at = match ctx.payload.get("iat") {
        Some(Json::Number(n)) => n.as_f64().ok_or(Error::MissingIssuedAt)?,
        _ => return Err(Error::MissingIssuedAt),
    };

    let boundary = issued_at + max_age + ctx.tolerance;
    if ctx.now >= boundary {
        return Err(Error::TokenExpired {
            expired_at: boundary.floor() as i64,
            cause: Expiry::MaxAge,
        });
    }

    Ok(())
}
