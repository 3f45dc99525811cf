//! Index error types
//!
//! Error codes:
//! - AERO_INVALID_KEY_SIZE (REJECT)
//! - AERO_INVALID_POSITION (REJECT)
//! - AERO_UNKNOWN_OPTION (REJECT)
//!
//! "Not found" outcomes of seeks and steps are plain `bool` results and
//! never surface here.

use std::fmt;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller input rejected; index and cursor state are unaffected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Key bytes or value do not match the attribute's fixed width/type
    AeroInvalidKeySize,
    /// Position token is malformed, stale, foreign, or no longer resolves
    AeroInvalidPosition,
    /// Cursor option name not recognized
    AeroUnknownOption,
}

impl IndexErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::AeroInvalidKeySize => "AERO_INVALID_KEY_SIZE",
            IndexErrorCode::AeroInvalidPosition => "AERO_INVALID_POSITION",
            IndexErrorCode::AeroUnknownOption => "AERO_UNKNOWN_OPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
}

impl IndexError {
    /// Key width mismatch
    pub fn invalid_key_size(expected: usize, actual: usize) -> Self {
        Self {
            code: IndexErrorCode::AeroInvalidKeySize,
            message: format!("expected {} key bytes, got {}", expected, actual),
        }
    }

    /// Key value could not be converted under the key spec
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::AeroInvalidKeySize,
            message: reason.into(),
        }
    }

    /// Token cannot be restored
    pub fn invalid_position(reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::AeroInvalidPosition,
            message: reason.into(),
        }
    }

    /// Unrecognized `prop_set` name
    pub fn unknown_option(name: &str) -> Self {
        Self {
            code: IndexErrorCode::AeroUnknownOption,
            message: format!("unknown cursor option '{}'", name),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(IndexErrorCode::AeroInvalidKeySize.code(), "AERO_INVALID_KEY_SIZE");
        assert_eq!(IndexErrorCode::AeroInvalidPosition.code(), "AERO_INVALID_POSITION");
        assert_eq!(IndexErrorCode::AeroUnknownOption.code(), "AERO_UNKNOWN_OPTION");
    }

    #[test]
    fn test_constructors_set_code() {
        assert_eq!(
            IndexError::invalid_key_size(4, 8).code(),
            IndexErrorCode::AeroInvalidKeySize
        );
        assert_eq!(
            IndexError::invalid_position("stale").code(),
            IndexErrorCode::AeroInvalidPosition
        );
        assert_eq!(
            IndexError::unknown_option("sup_last_dup").code(),
            IndexErrorCode::AeroUnknownOption
        );
    }

    #[test]
    fn test_error_display() {
        let err = IndexError::invalid_key_size(4, 3);
        let display = format!("{}", err);
        assert!(display.contains("REJECT"));
        assert!(display.contains("AERO_INVALID_KEY_SIZE"));
        assert!(display.contains("expected 4 key bytes, got 3"));
    }
}
