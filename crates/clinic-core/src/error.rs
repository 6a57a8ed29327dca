use thiserror::Error;

/// Core error types for clinic record operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown resource kind: {0}")]
    UnknownResourceKind(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid record data: {message}")]
    InvalidRecord { message: String },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time formatting error: {0}")]
    TimeFormat(#[from] time::error::Format),
}

impl CoreError {
    /// Create a new UnknownResourceKind error
    pub fn unknown_resource_kind(kind: impl Into<String>) -> Self {
        Self::UnknownResourceKind(kind.into())
    }

    /// Create a new InvalidDate error
    pub fn invalid_date(date: impl Into<String>) -> Self {
        Self::InvalidDate(date.into())
    }

    /// Create a new InvalidRecord error
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            CoreError::unknown_resource_kind("widgets").to_string(),
            "Unknown resource kind: widgets"
        );
        assert_eq!(
            CoreError::invalid_record("expected an object").to_string(),
            "Invalid record data: expected an object"
        );
    }
}
