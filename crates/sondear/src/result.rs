//! Result and error types for Sondear.

use thiserror::Error;

/// Result type for Sondear operations
pub type SondearResult<T> = Result<T, SondearError>;

/// Errors that can occur in Sondear
#[derive(Debug, Error)]
pub enum SondearError {
    /// Settings source missing or malformed — fatal at startup
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message
        message: String,
    },

    /// Element or selector cannot be matched, or became stale
    #[error("Resolution failed for {query}: {message}")]
    Resolution {
        /// Description of the query that failed to resolve
        query: String,
        /// Error message
        message: String,
    },

    /// A wait's condition never held within budget
    #[error("Timed out after {ms}ms waiting for {condition}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the condition waited for
        condition: String,
    },

    /// The underlying browser call itself rejected
    #[error("Action '{action}' failed: {message}")]
    ActionFailure {
        /// The action that was attempted
        action: String,
        /// Error message
        message: String,
    },

    /// Caller-supplied precondition violated
    #[error("Validation failed: {message}")]
    Validation {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Accessibility engine or report writer failed
    #[error("External tool '{tool}' failed: {message}")]
    ExternalTool {
        /// The tool that failed
        tool: String,
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SondearError {
    /// Whether this error is a wait timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether this error is a resolution failure
    #[must_use]
    pub const fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = SondearError::Timeout {
            ms: 5000,
            condition: "element visible".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("5000ms"));
        assert!(msg.contains("element visible"));
    }

    #[test]
    fn test_resolution_display() {
        let err = SondearError::Resolution {
            query: "textbox by id 'firstName'".to_string(),
            message: "no match".to_string(),
        };
        assert!(err.to_string().contains("textbox by id 'firstName'"));
        assert!(err.is_resolution());
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_validation_display() {
        let err = SondearError::Validation {
            message: "file not found: /tmp/missing.png".to_string(),
        };
        assert!(err.to_string().contains("/tmp/missing.png"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: SondearError = io.into();
        assert!(matches!(err, SondearError::Io(_)));
    }
}
