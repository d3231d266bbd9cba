//! Token issuance: claim sets and the issuer.

pub mod claims;
pub mod issuer;

pub use claims::Claims;
pub use issuer::{IssuerSettings, TokenIssuer, Validity};
