// Error types shared by every component of the client
use thiserror::Error;

// Message used when the server rejects a request without a readable cause
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

// Errors surfaced to the screen that started an action.
// Every failure is terminal for that action; nothing here is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // Rejected input, either by the client-side guards or by the server
    #[error("Validation error: {0}")]
    ValidationError(String),

    // Missing or invalid token, or a role that does not allow the action
    #[error("Authorization error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFoundError(String),

    // Network failure, unexpected status or an unparseable body
    #[error("Fetch error: {0}")]
    FetchError(String),
}

impl ApiError {
    // Maps a non-success HTTP status and the server's message onto the taxonomy.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 | 409 | 422 => ApiError::ValidationError(message),
            401 | 403 => ApiError::AuthError(message),
            404 => ApiError::NotFoundError(message),
            _ => ApiError::FetchError(message),
        }
    }

    // The human-readable cause, without the category prefix
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationError(message)
            | ApiError::AuthError(message)
            | ApiError::NotFoundError(message)
            | ApiError::FetchError(message) => message,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFoundError(_))
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Session storage error: {0}")]
    StorageError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(400, "ValidationError"; "bad request")]
    #[test_case(409, "ValidationError"; "conflict")]
    #[test_case(422, "ValidationError"; "unprocessable")]
    #[test_case(401, "AuthError"; "unauthorized")]
    #[test_case(403, "AuthError"; "forbidden")]
    #[test_case(404, "NotFoundError"; "not found")]
    #[test_case(500, "FetchError"; "server error")]
    #[test_case(503, "FetchError"; "unavailable")]
    fn test_status_mapping(status: u16, expected: &str) {
        let error = ApiError::from_status(status, "boom".to_string());
        let kind = match &error {
            ApiError::ValidationError(_) => "ValidationError",
            ApiError::AuthError(_) => "AuthError",
            ApiError::NotFoundError(_) => "NotFoundError",
            ApiError::FetchError(_) => "FetchError",
        };
        assert_eq!(kind, expected);
        assert_eq!(error.message(), "boom");
    }

    #[test]
    fn test_display_keeps_server_message() {
        let error = ApiError::ValidationError("Guests exceed venue capacity".to_string());
        assert_eq!(
            error.to_string(),
            "Validation error: Guests exceed venue capacity"
        );
        assert!(!error.is_not_found());
        assert!(ApiError::NotFoundError("gone".to_string()).is_not_found());
    }
}
