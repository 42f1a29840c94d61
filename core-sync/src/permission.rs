//! Media library authorization, resolved lazily and mirrored into progress.

use bridge_traits::error::Result;
use bridge_traits::permission::{AuthorizationStatus, PermissionGate};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::progress::ProgressTracker;

/// Resolves media library access and publishes the result as
/// `has_media_permission` on the shared [`ProgressTracker`].
///
/// The platform is queried on every call so a revoked grant is noticed, but the
/// user is only prompted while the status is still undetermined.
pub struct PermissionCoordinator {
    gate: Arc<dyn PermissionGate>,
    progress: Arc<ProgressTracker>,
}

impl PermissionCoordinator {
    pub fn new(gate: Arc<dyn PermissionGate>, progress: Arc<ProgressTracker>) -> Self {
        Self { gate, progress }
    }

    /// Query the current status without prompting.
    pub async fn refresh(&self) -> Result<AuthorizationStatus> {
        let status = self.gate.query_authorization().await?;
        self.progress.set_media_permission(status.is_authorized());
        Ok(status)
    }

    /// Query the status and prompt once if it has never been resolved.
    pub async fn ensure_authorized(&self) -> Result<AuthorizationStatus> {
        let mut status = self.gate.query_authorization().await?;
        debug!(?status, "Queried media library authorization");

        if status == AuthorizationStatus::NotDetermined {
            info!("Requesting media library authorization");
            status = self.gate.request_authorization().await?;
        }

        if !status.is_authorized() {
            warn!(?status, "Media library access not granted");
        }

        self.progress.set_media_permission(status.is_authorized());
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct ScriptedGate {
        status: Mutex<AuthorizationStatus>,
        on_request: AuthorizationStatus,
        requests: AtomicUsize,
    }

    impl ScriptedGate {
        fn new(status: AuthorizationStatus, on_request: AuthorizationStatus) -> Self {
            Self {
                status: Mutex::new(status),
                on_request,
                requests: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PermissionGate for ScriptedGate {
        async fn query_authorization(&self) -> Result<AuthorizationStatus> {
            Ok(*self.status.lock().await)
        }

        async fn request_authorization(&self) -> Result<AuthorizationStatus> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            *self.status.lock().await = self.on_request;
            Ok(self.on_request)
        }
    }

    #[tokio::test]
    async fn test_prompts_only_when_undetermined() {
        let gate = Arc::new(ScriptedGate::new(
            AuthorizationStatus::NotDetermined,
            AuthorizationStatus::Authorized,
        ));
        let progress = Arc::new(ProgressTracker::new());
        let coordinator = PermissionCoordinator::new(gate.clone(), progress.clone());

        assert!(coordinator.ensure_authorized().await.unwrap().is_authorized());
        assert!(coordinator.ensure_authorized().await.unwrap().is_authorized());
        assert_eq!(gate.requests.load(Ordering::SeqCst), 1);
        assert!(progress.has_media_permission());
    }

    #[tokio::test]
    async fn test_denied_is_not_reprompted() {
        let gate = Arc::new(ScriptedGate::new(
            AuthorizationStatus::Denied,
            AuthorizationStatus::Authorized,
        ));
        let progress = Arc::new(ProgressTracker::new());
        let coordinator = PermissionCoordinator::new(gate.clone(), progress.clone());

        let status = coordinator.ensure_authorized().await.unwrap();

        assert_eq!(status, AuthorizationStatus::Denied);
        assert_eq!(gate.requests.load(Ordering::SeqCst), 0);
        assert!(!progress.has_media_permission());
    }

    #[tokio::test]
    async fn test_refresh_notices_revocation() {
        let gate = Arc::new(ScriptedGate::new(
            AuthorizationStatus::Authorized,
            AuthorizationStatus::Authorized,
        ));
        let progress = Arc::new(ProgressTracker::new());
        let coordinator = PermissionCoordinator::new(gate.clone(), progress.clone());

        coordinator.refresh().await.unwrap();
        assert!(progress.has_media_permission());

        *gate.status.lock().await = AuthorizationStatus::Denied;
        coordinator.refresh().await.unwrap();
        assert!(!progress.has_media_permission());
    }
}
