//! Permission Gate Implementation for hosts without a photo-library prompt

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    permission::{AuthorizationStatus, PermissionGate},
};
use tokio::sync::RwLock;
use tracing::info;

/// Permission gate with a fixed answer.
///
/// Desktop file systems have no photo-library authorization, so the default
/// gate is always authorized. The other constructors exist for hosts that
/// want to disable media writes or simulate a first-run prompt.
pub struct StaticPermissionGate {
    status: RwLock<AuthorizationStatus>,
    answer: AuthorizationStatus,
}

impl StaticPermissionGate {
    pub fn authorized() -> Self {
        Self::prompting(AuthorizationStatus::Authorized, AuthorizationStatus::Authorized)
    }

    pub fn denied() -> Self {
        Self::prompting(AuthorizationStatus::Denied, AuthorizationStatus::Denied)
    }

    /// Gate that starts in `status` and resolves to `answer` when prompted.
    pub fn prompting(status: AuthorizationStatus, answer: AuthorizationStatus) -> Self {
        Self {
            status: RwLock::new(status),
            answer,
        }
    }
}

impl Default for StaticPermissionGate {
    fn default() -> Self {
        Self::authorized()
    }
}

#[async_trait]
impl PermissionGate for StaticPermissionGate {
    async fn query_authorization(&self) -> Result<AuthorizationStatus> {
        Ok(*self.status.read().await)
    }

    async fn request_authorization(&self) -> Result<AuthorizationStatus> {
        let mut status = self.status.write().await;
        if *status == AuthorizationStatus::NotDetermined {
            *status = self.answer;
            info!(status = ?self.answer, "Resolved media library authorization");
        }
        Ok(*status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_authorized_gate() {
        let gate = StaticPermissionGate::default();
        assert!(gate.query_authorization().await.unwrap().is_authorized());
        assert!(gate.request_authorization().await.unwrap().is_authorized());
    }

    #[tokio::test]
    async fn test_prompt_resolves_once() {
        let gate = StaticPermissionGate::prompting(
            AuthorizationStatus::NotDetermined,
            AuthorizationStatus::Denied,
        );

        assert_eq!(
            gate.query_authorization().await.unwrap(),
            AuthorizationStatus::NotDetermined
        );
        assert_eq!(
            gate.request_authorization().await.unwrap(),
            AuthorizationStatus::Denied
        );
        assert_eq!(
            gate.query_authorization().await.unwrap(),
            AuthorizationStatus::Denied
        );
    }

    #[tokio::test]
    async fn test_denied_gate_stays_denied() {
        let gate = StaticPermissionGate::denied();
        assert_eq!(
            gate.request_authorization().await.unwrap(),
            AuthorizationStatus::Denied
        );
    }
}
