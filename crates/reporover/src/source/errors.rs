use thiserror::Error;

/// Longest body excerpt kept in a remote error message.
const MAX_MESSAGE_LEN: usize = 200;

/// Errors that can occur when talking to the external repository source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The credential was rejected.
    #[error("Authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    /// Any other non-2xx response. `reason` is the status text, e.g. `Not Found`.
    #[error("Remote error (HTTP {status} {reason}): {message}")]
    Remote {
        status: u16,
        reason: String,
        message: String,
    },

    /// The request never produced a response.
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The response body did not have the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String },
}

impl SourceError {
    /// Classify a non-2xx response.
    #[must_use]
    pub fn from_status(status: u16, reason: &str, body: &[u8]) -> Self {
        let message = summarize_body(body);
        match status {
            401 | 403 => Self::Auth { status, message },
            _ => Self::Remote {
                status,
                reason: reason.to_string(),
                message,
            },
        }
    }

    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    #[inline]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Whether this is a credential problem rather than a per-item fault.
    #[inline]
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

fn summarize_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    match text.char_indices().nth(MAX_MESSAGE_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Extract a short error message suitable for display.
///
/// Takes the first line of an error message, which is useful for errors
/// that carry multi-line response bodies.
#[inline]
pub fn short_error_message(e: &impl std::error::Error) -> String {
    let full = e.to_string();
    full.lines().next().unwrap_or(&full).to_string()
}

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;
