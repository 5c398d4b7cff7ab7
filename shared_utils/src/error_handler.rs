//! Error severity classification
//!
//! - Recoverable: skip the current file, log a warning, keep going
//! - Fatal: stop the whole run
//! - Optional: a best-effort step failed, the result is still usable

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Recoverable,
    Fatal,
    Optional,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Recoverable => write!(f, "RECOVERABLE"),
            ErrorCategory::Fatal => write!(f, "FATAL"),
            ErrorCategory::Optional => write!(f, "OPTIONAL"),
        }
    }
}

/// Log an error at the level its category deserves.
pub fn report_error(category: ErrorCategory, context: &str, error: &dyn std::error::Error) {
    match category {
        ErrorCategory::Recoverable => {
            tracing::warn!(category = %category, error = %error, "⚠️ {}", context);
        }
        ErrorCategory::Fatal => {
            tracing::error!(category = %category, error = %error, "❌ {}", context);
        }
        ErrorCategory::Optional => {
            tracing::info!(category = %category, error = %error, "ℹ️ {}", context);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Recoverable.to_string(), "RECOVERABLE");
        assert_eq!(ErrorCategory::Fatal.to_string(), "FATAL");
        assert_eq!(ErrorCategory::Optional.to_string(), "OPTIONAL");
    }

    #[test]
    fn test_report_error_no_panic() {
        let err = std::io::Error::other("boom");
        report_error(ErrorCategory::Recoverable, "probe failed", &err);
        report_error(ErrorCategory::Fatal, "cannot continue", &err);
        report_error(ErrorCategory::Optional, "metadata skipped", &err);
    }
}
