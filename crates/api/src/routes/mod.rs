//! HTTP route handlers.

pub mod bookings;
pub mod health;
pub mod metrics;
pub mod trains;
pub mod users;

use uuid::Uuid;

use crate::error::ApiError;

/// Parses a path or body identifier, rejecting malformed values with 400.
pub(crate) fn parse_id(field: &str, value: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value).map_err(|e| ApiError::BadRequest(format!("Invalid {field}: {e}")))
}
