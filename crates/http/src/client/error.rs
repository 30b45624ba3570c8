//! Client error types

use super::storage::StorageError;
use crate::types::ApiErrorBody;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server returned a non-success status other than 401
    #[error("Server error {status}: {body}")]
    Status { status: u16, body: ApiErrorBody },

    /// 401 that could not be recovered by a token refresh
    #[error("Authentication failed: {0}")]
    Unauthorized(ApiErrorBody),

    /// The token refresh exchange failed and the session was cleared
    #[error("Session refresh failed: {0}")]
    RefreshFailed(#[from] RefreshError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Credential storage error
    #[error("Credential storage error: {0}")]
    Storage(#[from] StorageError),

    /// Local file error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// HTTP status carried by this error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the caller has to log in again before retrying
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::RefreshFailed(_))
    }

    /// Message suitable for showing to a user: the server-provided message
    /// when there is one, otherwise `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status { body, .. } | Self::Unauthorized(body) => body
                .message()
                .map_or_else(|| fallback.to_string(), str::to_string),
            _ => fallback.to_string(),
        }
    }
}

/// Why a refresh exchange failed
///
/// One outcome is broadcast to every request waiting on the same exchange,
/// hence `Clone` and string payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// No refresh token was stored
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint answered with a non-success status
    #[error("refresh rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The refresh endpoint could not be reached
    #[error("refresh request failed: {0}")]
    Transport(String),

    /// The refresh endpoint answered with an unexpected body
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    /// The stored refresh token could not be read
    #[error("credential storage failed: {0}")]
    Storage(String),

    /// The request driving the exchange was dropped before it settled
    #[error("refresh abandoned before completion")]
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> ApiErrorBody {
        ApiErrorBody::from_bytes(json.as_bytes())
    }

    #[test]
    fn user_message_prefers_server_message() {
        let err = ClientError::Status {
            status: 400,
            body: body(r#"{"status":400,"message":"Nome obrigatório"}"#),
        };
        assert_eq!(err.user_message("Erro ao criar artista"), "Nome obrigatório");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn user_message_falls_back() {
        let err = ClientError::Configuration("base_url is required".into());
        assert_eq!(err.user_message("Erro ao carregar"), "Erro ao carregar");
    }

    #[test]
    fn auth_expired_kinds() {
        assert!(ClientError::RefreshFailed(RefreshError::Abandoned).is_auth_expired());
        assert!(ClientError::Unauthorized(ApiErrorBody::default()).is_auth_expired());
        let other = ClientError::Status {
            status: 403,
            body: ApiErrorBody::default(),
        };
        assert!(!other.is_auth_expired());
    }
}
