use pitchcraft_core::token::TokenFormatError;

/// Errors surfaced by the session client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A token failed structural validation.
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] TokenFormatError),

    /// The token storage backend failed.
    #[error("Token storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        /// The server's `error` field, or the raw body when it has none.
        message: String,
    },

    /// The server did not confirm a session for the stored token.
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// A response body did not match the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether retrying the same request could succeed: connection
    /// failures, timeouts, 429 and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the server rejected the caller's credentials (401/403).
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Api {
                status: 401 | 403,
                ..
            } | Self::Unauthenticated(_)
        )
    }

    /// Message suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } | Self::Unauthenticated(message) => message.clone(),
            Self::Request(_) => "Could not reach the server. Please try again.".to_string(),
            other => other.to_string(),
        }
    }
}
