use tracing::debug;

use crate::{AuthClaims, AuthError, Permission, TokenVerifier, extract_bearer};

/// Run the token half of the flow: header → key set → signature and claims.
///
/// Each step short-circuits on failure; nothing is retried.
pub async fn authenticate(
    verifier: &dyn TokenVerifier,
    authorization: Option<&str>,
) -> Result<AuthClaims, AuthError> {
    let token = extract_bearer(authorization)?;
    verifier.verify(token).await
}

/// Check that verified claims grant `required`.
///
/// - No IO
/// - No panics
/// - Exact string membership only
pub fn check_permission(claims: &AuthClaims, required: &Permission) -> Result<(), AuthError> {
    let granted = claims.permissions().ok_or_else(|| {
        AuthError::invalid_claims(400, "Permissions not included in JWT.")
    })?;

    if granted.contains(required) {
        Ok(())
    } else {
        debug!(
            subject = claims.subject().unwrap_or("<none>"),
            required = %required,
            "permission denied"
        );
        Err(AuthError::unauthorized())
    }
}
