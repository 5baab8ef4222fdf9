//! Error types for the catalog service clients.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while talking to the course and section services.
#[derive(Debug, Error, Clone)]
pub enum ApiError {
    /// Network/HTTP request failed before a response arrived
    #[error("Network error: {message}")]
    Network { message: String },

    /// The service answered with a non-success status
    #[error("Service returned {status}: {message}")]
    Service { status: StatusCode, message: String },

    /// The service answered 2xx but the body was not in any known shape
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// URL parsing/construction failed
    #[error("URL error: {message}")]
    UrlError { message: String },
}

impl ApiError {
    /// The message to show a user, verbatim from the service where it sent one.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Service { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns true if the requested entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApiError::Service {
                status: StatusCode::NOT_FOUND,
                ..
            }
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ApiError::UnexpectedResponse {
                message: err.to_string(),
            };
        }
        ApiError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::UrlError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::UnexpectedResponse {
            message: format!("Could not decode response body: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_verbatim_for_service_errors() {
        let err = ApiError::Service {
            status: StatusCode::BAD_REQUEST,
            message: "Section title already exists".to_string(),
        };
        assert_eq!(err.user_message(), "Section title already exists");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_classification() {
        let not_found = ApiError::Service {
            status: StatusCode::NOT_FOUND,
            message: "Course not found".to_string(),
        };
        assert!(not_found.is_not_found());
        assert_eq!(not_found.user_message(), "Course not found");

        let network = ApiError::Network {
            message: "refused".to_string(),
        };
        assert!(!network.is_not_found());
        assert_eq!(network.user_message(), "Network error: refused");
    }

    #[test]
    fn test_decode_errors_are_unexpected_responses() {
        let decode = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        match ApiError::from(decode) {
            ApiError::UnexpectedResponse { message } => {
                assert!(message.starts_with("Could not decode response body: "))
            }
            other => panic!("expected UnexpectedResponse, got {:?}", other),
        }
    }
}
