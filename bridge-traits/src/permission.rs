//! Media Library Permission Gate
//!
//! Mirrors the host's photo-library authorization prompt. Synchronization that
//! would write media is gated on [`AuthorizationStatus::Authorized`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Authorization state reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    NotDetermined,
    Authorized,
    Denied,
}

impl AuthorizationStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(self, AuthorizationStatus::Authorized)
    }
}

#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Current authorization without prompting.
    async fn query_authorization(&self) -> Result<AuthorizationStatus>;

    /// Prompt the user. Returns `Authorized` or `Denied`.
    async fn request_authorization(&self) -> Result<AuthorizationStatus>;
}
