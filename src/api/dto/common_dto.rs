//! DTOs and validation shared by both services.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ServiceError;

/// Maximum accepted length of a team or tournament name, in characters.
pub const MAX_NAME_CHARS: usize = 100;

/// Request body carrying a single `name`, used to create teams and
/// tournaments.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNamedRequest {
    /// Display name (1–100 characters after trimming).
    #[schema(example = "Helsinki FC")]
    pub name: String,
}

impl CreateNamedRequest {
    /// Returns the trimmed name.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidRequest`] if the name is blank or
    /// longer than [`MAX_NAME_CHARS`].
    pub fn validated_name(&self) -> Result<&str, ServiceError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "name must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(ServiceError::InvalidRequest(format!(
                "name must be at most {MAX_NAME_CHARS} characters"
            )));
        }
        Ok(name)
    }
}

/// Response body of `GET /health`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the event feed is down.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Crate version.
    pub version: String,
    /// Event feed state (`connected` / `disconnected`); tournament service
    /// only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_feed: Option<String>,
}
