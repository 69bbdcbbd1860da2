/// Errors returned when an API key fails validation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid API key")]
    InvalidKey,
}

/// Validates a provided API key against the configured key.
///
/// The expected key is resolved once at startup and passed in; request
/// handling never reads the environment.
pub fn validate_api_key(provided_key: &str, expected_key: &str) -> Result<(), AuthError> {
    if provided_key == expected_key {
        Ok(())
    } else {
        Err(AuthError::InvalidKey)
    }
}
