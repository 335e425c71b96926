//! # jwtpolicy - Schema-Checked JWT Issuance and Claims Validation
//!
//! > Issue and verify JSON Web Tokens (JWT) against a declarative option schema
//! > and an ordered, clock-aware claims policy.
//!
//! ## Overview
//!
//! Every call starts by running the caller's [`Options`] through a compiled
//! [`Schema`](schema::Schema): unknown keys are ignored, missing keys receive
//! their defaults, and type or predicate violations fail before the token is
//! touched. Issuance then injects the registered claims the options ask for
//! (`iat`, `exp`, `nbf`, `aud`, `iss`, `sub`, `jti`) and hands header and
//! payload to a [`Signer`](jws::Signer). Verification decodes the token,
//! pairs signature and secret, restricts the algorithm, asks a
//! [`Verifier`](jws::Verifier) about the signature and finally walks the
//! claims pipeline.
//!
//! ## Quick Start
//!
//! ```
//! use jwtpolicy::{Options, sign, verify};
//! use serde_json::json;
//!
//! let token = sign(
//!     &json!({"role": "admin"}),
//!     b"secret",
//!     &Options::new()
//!         .with("expiresIn", "1h")
//!         .with("audience", "my-api")
//!         .with("issuer", "https://auth.example.com"),
//! )?;
//!
//! let claims = verify(
//!     &token,
//!     b"secret",
//!     &Options::new()
//!         .with("audience", "my-api")
//!         .with("issuer", vec!["https://auth.example.com", "https://legacy.example.com"])
//!         .with("clockTolerance", 30),
//! )?;
//!
//! assert_eq!(claims["role"], "admin");
//! let lifetime = claims["exp"].as_i64().unwrap() - claims["iat"].as_i64().unwrap();
//! assert_eq!(lifetime, 3600);
//! # Ok::<(), jwtpolicy::Error>(())
//! ```
//!
//! ## Claims Pipeline
//!
//! Checks run in a fixed order and the first failure is the only error
//! reported:
//!
//! ```text
//! aud -> iss -> sub -> jti -> nonce -> nbf -> exp -> maxAge
//! ```
//!
//! Identity checks come first so that a token that is both foreign and stale
//! is reported as foreign. Temporal failures can be told apart with
//! [`Error::is_temporal`] and [`Error::is_expired`], e.g. to trigger a token
//! refresh instead of a re-login.
//!
//! ## Algorithms
//!
//! The built-in [`Jws`](jws::Jws) collaborator signs and verifies HS256,
//! HS384 and HS512 and handles unsigned (`none`) tokens. RS, PS and ES
//! identifiers are accepted by the policy; plug in your own
//! [`Signer`](jws::Signer) / [`Verifier`](jws::Verifier) through
//! [`TokenIssuer`] and [`TokenValidator`] to use them.
//!
//! When no `algorithms` option is given, the allowed set is inferred from the
//! secret: PEM certificates and public keys admit RSA and ECDSA, PKCS#1 RSA
//! public keys admit RSA only, anything else admits HMAC only.
//!
//! ## Configuration
//!
//! Options can be built in code or loaded from JSON with
//! [`Options::from_json_str`]. Durations (`expiresIn`, `maxAge`,
//! `clockTolerance`, ...) accept seconds as numbers or shorthand strings such
//! as `"30m"`, `"1h"` and `"15d"`.
//!
//! ## Security
//!
//! HMAC signature verification uses constant-time comparison via the
//! [`constant_time_eq`](https://crates.io/crates/constant_time_eq) crate.
//! Tokens and their decoded segments are size-limited before parsing.
//!
//! ## References
//!
//! - [RFC 7515](https://datatracker.ietf.org/doc/html/rfc7515): JSON Web Signature (JWS)
//! - [RFC 7519](https://datatracker.ietf.org/doc/html/rfc7519): JSON Web Token (JWT)

// Core modules
pub mod error;
pub(crate) mod limits;
pub mod utils;

// Option handling
pub mod duration;
pub mod options;
pub mod schema;

// Tokens and collaborators
pub mod algorithm;
pub mod jws;
pub mod token;

// Claims and validation
pub mod claims;

// Issuance and verification (main public API)
pub mod issuer;
pub mod validator;

pub use algorithm::{ALGORITHMS, AlgorithmPolicy};
pub use claims::{Claims, ClaimsPolicy};
pub use error::{Error, Expiry, Result};
pub use issuer::{TokenIssuer, sign};
pub use jws::{CollaboratorError, Jws, Signer, Verifier};
pub use options::{Options, Value, ValueKind};
pub use token::{DecodedToken, TokenHeader};
pub use validator::{TokenValidator, decode, validate, verify};
