use std::collections::BTreeSet;

/// Caller identity after the token has passed every check.
///
/// Only the validator constructs this type, so holding one means the
/// signature, issuer, audience and lifetime were all verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPrincipal {
    subject: String,
    permissions: BTreeSet<String>,
}

impl VerifiedPrincipal {
    pub(crate) fn new(subject: String, permissions: BTreeSet<String>) -> Self {
        Self {
            subject,
            permissions,
        }
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    #[must_use]
    pub fn has_permission(&self, scope: &str) -> bool {
        self.permissions.contains(scope)
    }
}
