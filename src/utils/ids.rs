// src/utils/ids.rs

use uuid::Uuid;

use crate::error::AppError;

/// Parses a path or query identifier.
///
/// Malformed ids are rejected with 400 before any store access; an invalid
/// id must never silently match zero rows when the caller intended a lookup.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid {what} ID format: {raw}")))
}
