//! # auth-adapters
//!
//! Argon2-based implementation of `CredentialHasher`, plus the HMAC signer
//! behind the stateless session cookie.

mod password;
mod session;

pub use password::ArgonHasher;
pub use session::{IssuedSession, SessionSigner};
