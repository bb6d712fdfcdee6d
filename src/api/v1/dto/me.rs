/*
 * Responsibility
 * - GET /me の response DTO
 */
use serde::Serialize;

use crate::services::auth::{Permission, Principal};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject: String,
    // sorted, no duplicates
    pub permissions: Vec<Permission>,
}

impl From<&Principal> for MeResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            subject: principal.subject().to_string(),
            permissions: principal.permissions().iter().cloned().collect(),
        }
    }
}
