//! Request DTOs for the burn ban API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for token issuance (POST /auth)
///
/// # Fields
/// - `api_key`: Consumer key printed by `burnban generate-key`
/// - `api_secret`: Matching secret
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub api_key: String,
    pub api_secret: String,
}

impl TokenRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.api_key.trim().is_empty() {
            return Some("api_key cannot be empty".to_string());
        }
        if self.api_secret.is_empty() {
            return Some("api_secret cannot be empty".to_string());
        }
        None
    }
}
