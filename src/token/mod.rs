mod decoded;
mod header;

pub use crate::claims::Claims;
pub use decoded::DecodedToken;
pub use header::TokenHeader;
