use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::web::responses::json_error;

/// Failure surface shared by the JSON API handlers.
///
/// The internal variants keep their cause for the server log and expose
/// only an operation-scoped message to the client.
#[derive(Debug)]
pub enum ApiError {
    /// A protected endpoint was reached without a usable session token.
    AuthenticationRequired,
    /// Login rejected. Unknown accounts and wrong passwords share this
    /// variant so the responses cannot be told apart.
    InvalidCredentials,
    /// The request payload failed validation.
    InvalidInput(String),
    /// A uniqueness conflict, e.g. signing up with a taken email.
    Conflict(String),
    /// The analysis service could not be reached or replied with garbage.
    Upstream {
        message: &'static str,
        source: anyhow::Error,
    },
    /// A database read or write failed.
    Persistence {
        message: &'static str,
        source: anyhow::Error,
    },
    /// A server-side step failed outside storage and the upstream call,
    /// e.g. hashing a password or signing a session token.
    Internal {
        message: &'static str,
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn upstream(message: &'static str, source: anyhow::Error) -> Self {
        ApiError::Upstream { message, source }
    }

    pub fn persistence(message: &'static str, source: anyhow::Error) -> Self {
        ApiError::Persistence { message, source }
    }

    pub fn internal(message: &'static str, source: anyhow::Error) -> Self {
        ApiError::Internal { message, source }
    }

    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            ApiError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            ApiError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, message),
            ApiError::Upstream { message, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
            ApiError::Persistence { message, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
            ApiError::Internal { message, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Upstream { source, .. } => {
                error!(err = ?source, "analysis upstream failure");
            }
            ApiError::Persistence { source, .. } => {
                error!(err = ?source, "storage failure");
            }
            ApiError::Internal { source, .. } => {
                error!(err = ?source, "internal failure");
            }
            _ => {}
        }

        let (status, message) = self.status_and_message();
        json_error(status, message).into_response()
    }
}
