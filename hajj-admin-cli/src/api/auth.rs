//! Admin login against `<admin_url>/login`

use log::{debug, info};
use serde::{Deserialize, Serialize};

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const UNREACHABLE: &str = "Unable to connect to the server. Please try again later.";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
    message: Option<String>,
}

/// Failure of a login attempt, already phrased for the user
#[derive(Debug, Clone, PartialEq)]
pub enum LoginError {
    Rejected(String),
    Unreachable,
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginError::Rejected(msg) => write!(f, "{}", msg),
            LoginError::Unreachable => write!(f, "{}", UNREACHABLE),
        }
    }
}

impl std::error::Error for LoginError {}

/// Exchange username and password for an opaque admin token
pub async fn login(
    http: &reqwest::Client,
    admin_url: &str,
    username: &str,
    password: &str,
) -> Result<String, LoginError> {
    let url = format!("{}/login", admin_url.trim_end_matches('/'));
    debug!("POST {}", url);

    let response = http
        .post(&url)
        .json(&LoginRequest { username, password })
        .send()
        .await
        .map_err(|e| {
            log::error!("Login request failed: {}", e);
            LoginError::Unreachable
        })?;

    let status = response.status();
    let text = response.text().await.map_err(|_| LoginError::Unreachable)?;
    let parsed: Option<LoginResponse> = serde_json::from_str(&text).ok();

    if !status.is_success() {
        debug!("Login rejected with {}", status);
        let message = parsed
            .and_then(|p| p.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| INVALID_CREDENTIALS.to_string());
        return Err(LoginError::Rejected(message));
    }

    match parsed.and_then(|p| p.token) {
        Some(token) if !token.is_empty() => {
            info!("Logged in as {}", username);
            Ok(token)
        }
        _ => Err(LoginError::Rejected(INVALID_CREDENTIALS.to_string())),
    }
}
