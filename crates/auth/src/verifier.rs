//! Signature and registered-claim verification.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::jwks::{CachedKeySet, KeySetSource};
use crate::{AuthClaims, AuthError};

pub use jsonwebtoken::Algorithm;

/// Verifies a raw bearer token and returns its claims.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthClaims, AuthError>;
}

/// Expected issuer/audience and the signing algorithm tokens must use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    pub issuer: String,
    pub audience: String,
    pub algorithm: Algorithm,
}

impl VerifierConfig {
    /// Auth0 convention: the issuer is the tenant domain with a trailing slash.
    pub fn for_domain(domain: &str, audience: impl Into<String>, algorithm: Algorithm) -> Self {
        Self {
            issuer: format!("https://{}/", domain.trim_end_matches('/')),
            audience: audience.into(),
            algorithm,
        }
    }
}

/// Verifies RSA-signed tokens against the identity provider's key set.
pub struct JwksVerifier<S> {
    keys: CachedKeySet<S>,
    config: VerifierConfig,
}

impl<S: KeySetSource> JwksVerifier<S> {
    pub fn new(source: S, config: VerifierConfig) -> Self {
        Self {
            keys: CachedKeySet::new(source),
            config,
        }
    }

    /// Minimum spacing between key-set refetches caused by unknown key ids.
    pub fn with_key_refresh_interval(mut self, interval: Duration) -> Self {
        self.keys = self.keys.with_min_refresh(interval);
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.config.algorithm);
        validation.set_audience(&[self.config.audience.as_str()]);
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation
    }
}

#[async_trait]
impl<S: KeySetSource> TokenVerifier for JwksVerifier<S> {
    async fn verify(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let keys = self.keys.current().await.map_err(|e| {
            warn!("signing keys unavailable: {e}");
            AuthError::invalid_header(401, "Unable to fetch signing keys.")
        })?;

        let header = decode_header(token).map_err(|e| {
            debug!("undecodable token header: {e}");
            AuthError::invalid_header(400, "Unable to parse authentication token.")
        })?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::invalid_header(401, "Authorization malformed."))?;

        let jwk = self
            .keys
            .find(keys, &kid)
            .await
            .map_err(|e| {
                warn!("signing keys unavailable: {e}");
                AuthError::invalid_header(401, "Unable to fetch signing keys.")
            })?
            .ok_or_else(|| AuthError::invalid_header(401, "Unable to find the appropriate key."))?;

        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            warn!(kid = %kid, "unusable signing key: {e}");
            AuthError::invalid_header(400, "Unable to parse authentication token.")
        })?;

        let data = decode::<Map<String, Value>>(token, &key, &self.validation())
            .map_err(|e| map_jwt_error(e.kind()))?;

        Ok(AuthClaims::from_payload(data.claims))
    }
}

fn map_jwt_error(kind: &ErrorKind) -> AuthError {
    debug!("token rejected: {kind:?}");
    match kind {
        ErrorKind::ExpiredSignature => AuthError::token_expired(),
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => AuthError::invalid_claims(
            401,
            "Incorrect claims. Please, check the audience and issuer.",
        ),
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" || claim == "iss" => {
            AuthError::invalid_claims(
                401,
                "Incorrect claims. Please, check the audience and issuer.",
            )
        }
        // A header algorithm other than the configured one cannot carry a valid signature.
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            AuthError::invalid_header(401, "Unable to verify token signature.")
        }
        _ => AuthError::invalid_header(400, "Unable to parse authentication token."),
    }
}
