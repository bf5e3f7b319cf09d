//! Error types for remote submissions and configuration expansion.
//!
//! Submission errors are classified up front so the retry layer can decide
//! whether another attempt is worthwhile without knowing anything about the
//! transport that produced them.

use thiserror::Error;

/// Categories of submission errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient I/O, timeouts and server-side failures
    Transient,
    /// Malformed request or validation failure; repeating it cannot help
    Rejected,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// A failed attempt to add or remove a single item remotely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Worth another attempt (connection reset, timeout, 5xx, ...)
    #[error("{reason}")]
    Retryable {
        /// What went wrong on this attempt
        reason: String,
    },

    /// Retrying would not change the answer (4xx, unreadable source, ...)
    #[error("{reason}")]
    Terminal {
        /// What went wrong
        reason: String,
    },
}

impl SubmitError {
    pub fn retryable(reason: impl Into<String>) -> Self {
        Self::Retryable {
            reason: reason.into(),
        }
    }

    pub fn terminal(reason: impl Into<String>) -> Self {
        Self::Terminal {
            reason: reason.into(),
        }
    }

    /// The terminal error reported once the attempt ceiling is reached.
    pub fn exhausted(attempts: u32, last: &SubmitError) -> Self {
        Self::terminal(format!("gave up after {attempts} attempts: {last}"))
    }

    /// Classify an HTTP status code returned by the remote endpoint.
    ///
    /// Timeouts, throttling and server errors are retryable; every other
    /// failure status means the request itself is wrong.
    pub fn from_status(status: u16, context: &str) -> Self {
        let reason = format!("{context}: HTTP {status}");
        match status {
            408 | 429 | 500..=599 => Self::retryable(reason),
            _ => Self::terminal(reason),
        }
    }

    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Retryable { .. } => ErrorCategory::Transient,
            Self::Terminal { .. } => ErrorCategory::Rejected,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Retryable { reason } | Self::Terminal { reason } => reason,
        }
    }

    /// Reclassify as terminal, keeping the reason.
    pub fn into_terminal(self) -> Self {
        match self {
            Self::Retryable { reason } => Self::Terminal { reason },
            terminal @ Self::Terminal { .. } => terminal,
        }
    }
}

/// Fatal problems found while expanding the configured range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The same identifier is configured twice
    #[error("identifier \"{id}\" is configured at position {first} and again at position {second}")]
    DuplicateId {
        /// The repeated identifier
        id: String,
        /// Range position of the first occurrence
        first: i64,
        /// Range position of the repeat
        second: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::Rejected.is_retryable());
    }

    #[test]
    fn test_from_status_server_errors_are_retryable() {
        for status in [408, 429, 500, 502, 503, 504] {
            let err = SubmitError::from_status(status, "upload");
            assert!(err.is_retryable(), "status {status} should be retryable");
        }
    }

    #[test]
    fn test_from_status_client_errors_are_terminal() {
        for status in [400, 401, 403, 404, 413, 422] {
            let err = SubmitError::from_status(status, "upload");
            assert_eq!(err.category(), ErrorCategory::Rejected);
        }
    }

    #[test]
    fn test_from_status_keeps_context() {
        let err = SubmitError::from_status(503, "removing \"party\"");
        assert_eq!(err.reason(), "removing \"party\": HTTP 503");
    }

    #[test]
    fn test_into_terminal() {
        let err = SubmitError::retryable("connection reset").into_terminal();
        assert_eq!(err, SubmitError::terminal("connection reset"));
    }

    #[test]
    fn test_exhausted_message() {
        let err = SubmitError::exhausted(3, &SubmitError::retryable("timed out"));
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "gave up after 3 attempts: timed out");
    }

    #[test]
    fn test_duplicate_id_display() {
        let err = ConfigError::DuplicateId {
            id: "party".to_string(),
            first: 2,
            second: 5,
        };
        let display = err.to_string();
        assert!(display.contains("party"));
        assert!(display.contains('2'));
        assert!(display.contains('5'));
    }
}
