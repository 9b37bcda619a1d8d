//! Azure client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Azure Resource Manager API
#[derive(Debug, Error)]
pub enum AzureError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// ARM returned an error response
    #[error("Azure API error ({status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication failed (bad service principal, expired secret, missing role assignment)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Credentials could not be parsed
    #[error("Invalid credentials: {0}")]
    Credentials(String),
}

impl AzureError {
    /// Whether the error means the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, AzureError::NotFound(_))
    }
}
