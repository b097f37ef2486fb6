//! Error types for the locator engine

use thiserror::Error;

/// Locator error enumeration
///
/// A locator that matches nothing is not an error; it yields an empty
/// [`crate::WeightedControlList`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// Raw locator string could not be parsed
    #[error("Invalid path '{raw}': {reason}")]
    InvalidPath { raw: String, reason: String },

    /// Table coordinate fragment is malformed
    #[error("'{0}' is not a valid table coordinate")]
    InvalidTableCoordinate(String),

    /// Search pattern could not be compiled into an automaton
    #[error("Pattern '{pattern}' could not be compiled: {reason}")]
    PatternCompilation { pattern: String, reason: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Locate call exceeded the configured timeout
    #[error("Locate timeout: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LocatorError {
    /// Check if error is retryable
    ///
    /// The engine is a pure function of page snapshot and locator, so only a
    /// timed out call is worth repeating.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LocatorError::Timeout(_))
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::Internal(_) => 3,
            LocatorError::Timeout(_) | LocatorError::Config(_) => 2,
            LocatorError::InvalidPath { .. }
            | LocatorError::InvalidTableCoordinate(_)
            | LocatorError::PatternCompilation { .. } => 1,
        }
    }

    pub(crate) fn invalid_path(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        LocatorError::InvalidPath {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offending_input() {
        let err = LocatorError::invalid_path("[a] > b > [c] > d", "only one group of table coordinates allowed");
        assert_eq!(
            err.to_string(),
            "Invalid path '[a] > b > [c] > d': only one group of table coordinates allowed"
        );
        assert_eq!(
            LocatorError::InvalidTableCoordinate("[a;b;c]".to_string()).to_string(),
            "'[a;b;c]' is not a valid table coordinate"
        );
    }

    #[test]
    fn test_retryable_and_severity() {
        assert!(LocatorError::Timeout("500ms".to_string()).is_retryable());
        assert!(!LocatorError::Internal("boom".to_string()).is_retryable());
        assert_eq!(LocatorError::Internal("boom".to_string()).severity(), 3);
        assert_eq!(LocatorError::Config("bad".to_string()).severity(), 2);
        assert_eq!(
            LocatorError::PatternCompilation {
                pattern: "a*".to_string(),
                reason: "too long".to_string()
            }
            .severity(),
            1
        );
    }
}
