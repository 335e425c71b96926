pub mod base64url;

pub(crate) mod clock;

pub use base64url::{decode_bytes, decode_string, encode, encode_bytes};
