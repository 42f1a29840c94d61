use bridge_traits::error::BridgeError;
use core_library::{CaptureId, LibraryError};
use thiserror::Error;

/// Failures that abort a whole reconciliation pass or a store-level operation.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Media library permission denied")]
    PermissionDenied,

    #[error("Failed to probe remote capture count: {0}")]
    ProbeFailed(String),

    #[error("Sync failed: {0}")]
    SyncFailed(String),

    #[error("Sync already in progress")]
    SyncInProgress,

    #[error("Sync cancelled")]
    Cancelled,

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Capture {0} not found")]
    NotFound(CaptureId),
}

impl SyncError {
    /// Message suitable for display to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            SyncError::PermissionDenied => "No access to photo library",
            _ => "Failed to sync captures",
        }
    }
}

/// Failures of the fetch-and-persist pipeline for a single capture.
///
/// These never abort a pass; the reconciler logs them and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Capture {capture_id} has no usable asset")]
    InvalidContent { capture_id: CaptureId },

    #[error("Download failed for capture {capture_id}: {message}")]
    DownloadFailed {
        capture_id: CaptureId,
        message: String,
        transient: bool,
    },

    #[error("Saving capture {capture_id} failed: {message}")]
    SaveFailed {
        capture_id: CaptureId,
        message: String,
    },
}

impl PipelineError {
    pub fn download_failed(capture_id: CaptureId, error: &BridgeError) -> Self {
        PipelineError::DownloadFailed {
            capture_id,
            message: error.to_string(),
            transient: error.is_transient(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::InvalidContent { .. } => false,
            PipelineError::DownloadFailed { transient, .. } => *transient,
            PipelineError::SaveFailed { .. } => true,
        }
    }

    pub fn capture_id(&self) -> CaptureId {
        match self {
            PipelineError::InvalidContent { capture_id }
            | PipelineError::DownloadFailed { capture_id, .. }
            | PipelineError::SaveFailed { capture_id, .. } => *capture_id,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::InvalidContent { .. } => "Unable to process capture content",
            PipelineError::DownloadFailed { .. } => "Failed to download capture",
            PipelineError::SaveFailed { .. } => "Failed to save to camera roll",
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let id = CaptureId::new();
        assert!(!PipelineError::InvalidContent { capture_id: id }.is_retryable());
        assert!(PipelineError::download_failed(
            id,
            &BridgeError::OperationFailed("timeout".into())
        )
        .is_retryable());
        assert!(!PipelineError::download_failed(
            id,
            &BridgeError::NotFound("asset".into())
        )
        .is_retryable());
        assert!(!PipelineError::download_failed(
            id,
            &BridgeError::AccessDenied("token expired".into())
        )
        .is_retryable());
        assert!(PipelineError::SaveFailed {
            capture_id: id,
            message: "disk full".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            SyncError::PermissionDenied.user_message(),
            "No access to photo library"
        );
        assert_eq!(
            SyncError::ProbeFailed("offline".into()).user_message(),
            "Failed to sync captures"
        );
        let id = CaptureId::new();
        assert_eq!(
            PipelineError::SaveFailed {
                capture_id: id,
                message: String::new()
            }
            .user_message(),
            "Failed to save to camera roll"
        );
        assert_eq!(
            PipelineError::InvalidContent { capture_id: id }.capture_id(),
            id
        );
    }
}
