//! Scope enforcement.

use crate::error::AuthFailure;
use crate::principal::VerifiedPrincipal;

/// Pass the principal through if it was granted `required_scope`.
///
/// # Errors
/// Returns [`AuthFailure::PermissionDenied`] when the scope is not granted.
pub fn enforce(
    principal: VerifiedPrincipal,
    required_scope: &str,
) -> Result<VerifiedPrincipal, AuthFailure> {
    debug_assert!(!required_scope.is_empty(), "required scope must be set");
    if principal.has_permission(required_scope) {
        Ok(principal)
    } else {
        Err(AuthFailure::PermissionDenied {
            scope: required_scope.to_owned(),
        })
    }
}
