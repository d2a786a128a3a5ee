use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "post:drinks") and are
/// matched by exact membership; there is no wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const GET_DRINKS_DETAIL: Permission = Permission(Cow::Borrowed("get:drinks-detail"));
    pub const POST_DRINKS: Permission = Permission(Cow::Borrowed("post:drinks"));
    pub const PATCH_DRINKS: Permission = Permission(Cow::Borrowed("patch:drinks"));
    pub const DELETE_DRINKS: Permission = Permission(Cow::Borrowed("delete:drinks"));

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(value: &str) -> Self {
        Self(Cow::Owned(value.to_string()))
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}
