//! Error types for the characters API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because both controllers recover from
//! it differently than from other failures. Transport failures report status
//! 0. Every variant carries the API-relative path that produced it.

use thiserror::Error;

/// Errors produced while executing or parsing a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response was received.
    #[error("Network error: {message}")]
    Transport { path: String, message: String },

    /// The server returned 404.
    #[error("API request failed: Not Found")]
    NotFound { path: String },

    /// The server returned a non-2xx status other than 404.
    #[error("API request failed: {status_text}")]
    Http {
        status: u16,
        status_text: String,
        path: String,
    },

    /// A 2xx body that is not the expected JSON.
    #[error("deserialization failed: {message}")]
    Deserialization {
        status: u16,
        path: String,
        message: String,
    },

    #[error("{what} is required")]
    MissingId { what: &'static str, path: String },
}

impl ApiError {
    pub fn transport(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        ApiError::Transport {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Numeric status code; 0 when the request never completed.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Transport { .. } => 0,
            ApiError::NotFound { .. } => 404,
            ApiError::Http { status, .. } | ApiError::Deserialization { status, .. } => *status,
            ApiError::MissingId { .. } => 400,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            ApiError::Transport { path, .. }
            | ApiError::NotFound { path }
            | ApiError::Http { path, .. }
            | ApiError::Deserialization { path, .. }
            | ApiError::MissingId { path, .. } => path,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_reports_status_zero() {
        let err = ApiError::transport("/character", "connection refused");
        assert_eq!(err.status(), 0);
        assert_eq!(err.path(), "/character");
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn http_error_message_uses_status_text() {
        let err = ApiError::Http {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            path: "/character?page=2".to_string(),
        };
        assert_eq!(err.status(), 503);
        assert_eq!(err.to_string(), "API request failed: Service Unavailable");
    }

    #[test]
    fn not_found_is_distinct() {
        let err = ApiError::NotFound {
            path: "/character/999".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.status(), 404);
        assert!(!ApiError::transport("/x", "boom").is_not_found());
    }
}
