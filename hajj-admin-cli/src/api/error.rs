//! Errors raised while talking to the logistics REST API

/// Failure of a single call against the persistence collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, refused connection, ...)
    Transport(String),
    /// A privileged call was attempted without a stored bearer token
    MissingCredential,
    /// The server answered with a non-success status
    ServerRejected { status: u16, message: String },
    /// The response body did not have the expected shape
    Decode(String),
}

impl ApiError {
    /// Build a `ServerRejected` error from a status code and a raw response body.
    ///
    /// The `message` field of a JSON body is preferred; otherwise the trimmed
    /// body text, and finally the canonical reason phrase of the status.
    pub fn rejected(status: u16, body: &str) -> Self {
        let from_json = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));

        let message = match from_json {
            Some(m) if !m.trim().is_empty() => m,
            _ if !body.trim().is_empty() && body.len() <= 200 => body.trim().to_string(),
            _ => reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Request failed")
                .to_string(),
        };

        ApiError::ServerRejected { status, message }
    }

    /// Message suitable for a user-facing banner
    pub fn user_message(&self) -> String {
        match self {
            ApiError::ServerRejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "Unable to reach the server: {}", msg),
            ApiError::MissingCredential => write!(f, "No token found. Please log in again."),
            ApiError::ServerRejected { status, message } => {
                write!(f, "Server rejected the request ({}): {}", status, message)
            }
            ApiError::Decode(msg) => write!(f, "Unexpected response from server: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
