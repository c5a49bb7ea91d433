//! Rules for admins viewing the storefront as another user.

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// Check whether `admin_id` (holding `actor_role`) may impersonate the target.
///
/// Nested impersonation is refused: `already_impersonating` is true when the
/// caller's token was itself issued by an impersonation.
pub fn check_impersonation(
    admin_id: DbId,
    actor_role: Role,
    already_impersonating: bool,
    target_id: DbId,
    target_role: Role,
    target_active: bool,
) -> Result<(), CoreError> {
    if actor_role != Role::Admin || already_impersonating {
        return Err(CoreError::Forbidden(
            "Only admins acting as themselves can impersonate".into(),
        ));
    }
    if admin_id == target_id {
        return Err(CoreError::Validation("Cannot impersonate yourself".into()));
    }
    if target_role == Role::Admin {
        return Err(CoreError::Forbidden("Cannot impersonate another admin".into()));
    }
    if !target_active {
        return Err(CoreError::Conflict(
            "Cannot impersonate a deactivated account".into(),
        ));
    }
    Ok(())
}
