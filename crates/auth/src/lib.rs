//! `coffeeshop-auth`: bearer-token authentication and permission checks.
//!
//! This crate is decoupled from HTTP and storage: it turns an
//! `Authorization` header value into verified [`AuthClaims`] and answers
//! "does this caller hold permission X". Status codes are carried as plain
//! numbers for the transport layer to map.

pub mod authorize;
pub mod bearer;
pub mod claims;
pub mod error;
pub mod jwks;
pub mod permissions;
pub mod verifier;

pub use authorize::{authenticate, check_permission};
pub use bearer::extract_bearer;
pub use claims::AuthClaims;
pub use error::{AuthError, AuthErrorCode};
pub use jwks::{CachedKeySet, HttpKeySetSource, KeySetError, KeySetSource, StaticKeySet};
pub use permissions::Permission;
pub use verifier::{Algorithm, JwksVerifier, TokenVerifier, VerifierConfig};
