use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RideshareClientError {
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl RideshareClientError {
    pub async fn from_http_response(resp: reqwest::Response) -> Self {
        let status = resp.status().as_u16();
        match resp.text().await {
            Ok(body) => Self::from_status(status, &body),
            Err(err) => Self::RequestError(err),
        }
    }

    /// Maps a failed response onto an error variant, preferring the
    /// server's `{"error": ...}` message over the raw body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("HTTP {status}")
                } else {
                    trimmed.to_string()
                }
            });

        match status {
            400 | 422 => Self::InvalidRequest(message),
            401 => Self::Unauthorized(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::Server { status, message },
        }
    }
}
