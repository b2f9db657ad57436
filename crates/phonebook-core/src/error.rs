//! Error types for API calls and the passphrase gate.

use thiserror::Error;

/// Failure of a single request against the lookup API.
///
/// The `Display` text is what ends up in the bot message after `Error: `,
/// so every variant renders to a non-empty line.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response; `detail` is the server's `detail` field when it sent one
    #[error("{}", status_text(.status, .detail))]
    Status { status: u16, detail: Option<String> },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid image data: {0}")]
    Image(String),

    /// The background task running the request died before returning
    #[error("request task failed: {0}")]
    Aborted(String),
}

impl ApiError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ApiError::Io {
            context: context.into(),
            source,
        }
    }
}

fn status_text(status: &u16, detail: &Option<String>) -> String {
    match detail.as_deref().map(str::trim) {
        Some(detail) if !detail.is_empty() => detail.to_string(),
        _ => format!("API error (HTTP {})", status),
    }
}

/// Rejection reasons for a passphrase attempt
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    #[error("Passphrase is required")]
    Empty,
    #[error("Incorrect passphrase")]
    Incorrect,
}
