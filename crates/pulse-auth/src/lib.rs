//! # pulse-auth
//!
//! Bearer-credential validation for the Pulse gateway.
//!
//! The gateway treats token issuance as an external concern; this crate
//! only validates presented credentials. [`TokenValidator`] is the seam —
//! the production implementation ([`JwtTokenValidator`]) verifies HMAC
//! JWTs, while tests substitute their own validators.

pub mod claims;
pub mod validator;

pub use claims::Claims;
pub use validator::{JwtTokenValidator, TokenValidator};
