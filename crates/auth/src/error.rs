//! Authorization failure taxonomy.
//!
//! Every failure carries a machine code, the HTTP status the client should
//! see and a human description. The description is shown to the client
//! verbatim, so it never includes key material or token contents.

use std::borrow::Cow;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    MissingHeader,
    MalformedHeader,
    InvalidHeader,
    TokenExpired,
    InvalidClaims,
    Unauthorized,
}

impl AuthErrorCode {
    /// Wire name of the code, as identity-provider samples spell it.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::MissingHeader => "authorization_header_missing",
            AuthErrorCode::MalformedHeader | AuthErrorCode::InvalidHeader => "invalid_header",
            AuthErrorCode::TokenExpired => "token_expired",
            AuthErrorCode::InvalidClaims => "invalid_claims",
            AuthErrorCode::Unauthorized => "unauthorized",
        }
    }
}

impl core::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code} ({status}): {description}")]
pub struct AuthError {
    code: AuthErrorCode,
    status: u16,
    description: Cow<'static, str>,
}

impl AuthError {
    pub fn new(code: AuthErrorCode, status: u16, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            status,
            description: description.into(),
        }
    }

    pub fn missing_header() -> Self {
        Self::new(
            AuthErrorCode::MissingHeader,
            401,
            "Authorization header is expected.",
        )
    }

    pub fn malformed_header(description: &'static str) -> Self {
        Self::new(AuthErrorCode::MalformedHeader, 401, description)
    }

    pub fn invalid_header(status: u16, description: &'static str) -> Self {
        Self::new(AuthErrorCode::InvalidHeader, status, description)
    }

    pub fn token_expired() -> Self {
        Self::new(AuthErrorCode::TokenExpired, 401, "Token expired.")
    }

    pub fn invalid_claims(status: u16, description: &'static str) -> Self {
        Self::new(AuthErrorCode::InvalidClaims, status, description)
    }

    pub fn unauthorized() -> Self {
        Self::new(AuthErrorCode::Unauthorized, 403, "Permission not found.")
    }

    pub fn code(&self) -> AuthErrorCode {
        self.code
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
