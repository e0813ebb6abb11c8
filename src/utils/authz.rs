// src/utils/authz.rs

use uuid::Uuid;

use crate::error::AppError;

/// Ownership guard executed before every mutating operation on an owned
/// entity: the stored owner reference must equal the authenticated actor.
pub fn ensure_owner(owner_id: Uuid, actor_id: Uuid, what: &str) -> Result<(), AppError> {
    if owner_id != actor_id {
        return Err(AppError::Forbidden(format!(
            "You do not have permission to modify this {what}"
        )));
    }
    Ok(())
}
