//! Error types for the Humane Center provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Humane Center provider errors
#[derive(Error, Debug)]
pub enum HumaneError {
    /// API request returned a non-success status
    #[error("Humane API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Transport failed before a response arrived
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Bridge error
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result type for Humane Center operations
pub type Result<T> = std::result::Result<T, HumaneError>;

impl From<HumaneError> for BridgeError {
    fn from(error: HumaneError) -> Self {
        match error {
            HumaneError::ApiError {
                status_code: 404,
                message,
            } => BridgeError::NotFound(message),
            HumaneError::ApiError {
                status_code: status_code @ (401 | 403),
                message,
            } => BridgeError::AccessDenied(format!("status {}: {}", status_code, message)),
            HumaneError::ApiError {
                status_code,
                message,
            } => BridgeError::OperationFailed(format!(
                "API error (status {}): {}",
                status_code, message
            )),
            HumaneError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            HumaneError::NetworkError(msg) => {
                BridgeError::OperationFailed(format!("Network error: {}", msg))
            }
            HumaneError::Bridge(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = HumaneError::ApiError {
            status_code: 404,
            message: "Memory not found".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Humane API error (status 404): Memory not found"
        );
    }

    #[test]
    fn test_error_conversion() {
        let not_found: BridgeError = HumaneError::ApiError {
            status_code: 404,
            message: "gone".into(),
        }
        .into();
        assert!(matches!(not_found, BridgeError::NotFound(_)));

        let denied: BridgeError = HumaneError::ApiError {
            status_code: 401,
            message: "expired".into(),
        }
        .into();
        assert!(matches!(denied, BridgeError::AccessDenied(_)));

        let parse: BridgeError = HumaneError::ParseError("eof".into()).into();
        assert!(matches!(parse, BridgeError::OperationFailed(_)));
    }
}
