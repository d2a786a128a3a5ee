use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::Permission;

/// Verified claims of one request's bearer token.
///
/// Built only from a payload whose signature, issuer, audience and expiry
/// have already been checked. Lives for a single request and is never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthClaims {
    /// Subject (`sub`) of the token.
    subject: Option<String>,

    /// Granted permissions; `None` when the token carries no permission claim at all.
    permissions: Option<BTreeSet<Permission>>,

    /// Every other claim, untouched (provider-specific extras, `iss`, `aud`, ...).
    extra: Map<String, Value>,
}

impl AuthClaims {
    pub fn new(
        subject: Option<String>,
        permissions: Option<BTreeSet<Permission>>,
        extra: Map<String, Value>,
    ) -> Self {
        Self {
            subject,
            permissions,
            extra,
        }
    }

    /// Split a verified JWT payload into typed claims.
    ///
    /// Permissions come from the `permissions` array (Auth0 RBAC). When that
    /// claim is missing, a space-separated OAuth `scope` string is used instead.
    pub fn from_payload(mut payload: Map<String, Value>) -> Self {
        let subject = match payload.remove("sub") {
            Some(Value::String(sub)) => Some(sub),
            _ => None,
        };

        let permissions = match payload.remove("permissions") {
            Some(Value::Array(items)) => Some(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(Permission::from(s)),
                        _ => None,
                    })
                    .collect(),
            ),
            Some(_) => None,
            None => match payload.get("scope") {
                Some(Value::String(scope)) => {
                    Some(scope.split_whitespace().map(Permission::from).collect())
                }
                _ => None,
            },
        };

        Self {
            subject,
            permissions,
            extra: payload,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn permissions(&self) -> Option<&BTreeSet<Permission>> {
        self.permissions.as_ref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}
