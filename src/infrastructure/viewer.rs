// Viewer identity - the portal runs without real authentication, so every
// request is made by the same anonymous viewer

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;
use uuid::Uuid;

use crate::core::AlumniId;
use crate::error::AppResult;

pub const ANONYMOUS_VIEWER_ID: &str = "anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerContext {
    /// Tags registrations made on the viewer's behalf
    pub user_id: AlumniId,
    pub session_id: String,
    pub is_anonymous: bool,
}

impl ViewerContext {
    pub fn anonymous() -> Self {
        Self {
            user_id: AlumniId::new(ANONYMOUS_VIEWER_ID),
            session_id: Uuid::new_v4().to_string(),
            is_anonymous: true,
        }
    }
}

/// Identity seam for the portal. Implementations grant no capabilities.
#[async_trait]
pub trait IdentityProvider: Send + Sync + Debug {
    fn viewer(&self) -> ViewerContext;
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<()>;
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<()>;
    async fn sign_out(&self) -> AppResult<()>;
}

/// Always the same anonymous viewer; every auth call succeeds and changes nothing
#[derive(Debug, Clone)]
pub struct AnonymousIdentity {
    viewer: ViewerContext,
}

impl AnonymousIdentity {
    pub fn new() -> Self {
        Self {
            viewer: ViewerContext::anonymous(),
        }
    }
}

impl Default for AnonymousIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    fn viewer(&self) -> ViewerContext {
        self.viewer.clone()
    }

    async fn sign_in(&self, email: &str, _password: &str) -> AppResult<()> {
        debug!("Ignoring sign-in for {}", email);
        Ok(())
    }

    async fn sign_up(&self, email: &str, _password: &str) -> AppResult<()> {
        debug!("Ignoring sign-up for {}", email);
        Ok(())
    }

    async fn sign_out(&self) -> AppResult<()> {
        Ok(())
    }
}
