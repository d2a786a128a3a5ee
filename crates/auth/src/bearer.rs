use crate::error::AuthError;

/// Pull the token out of an `Authorization` header value.
///
/// The value must be exactly `Bearer <token>` (scheme matched
/// case-insensitively, parts separated by whitespace).
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or_else(AuthError::missing_header)?;
    let parts: Vec<&str> = header.split_whitespace().collect();

    match parts.as_slice() {
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => Err(
            AuthError::malformed_header("Authorization header must start with \"Bearer\"."),
        ),
        [] => Err(AuthError::malformed_header(
            "Authorization header must start with \"Bearer\".",
        )),
        [_] => Err(AuthError::malformed_header("Token not found.")),
        [_, token] => Ok(*token),
        _ => Err(AuthError::malformed_header(
            "Authorization header must be bearer token.",
        )),
    }
}
