//! Identity service integration.
//!
//! The remote identity service owns verification codes and accounts. All
//! four flow-facing operations go through [`VerificationClient`], which
//! tries the remote service first and substitutes the local simulation
//! only when the service cannot be reached — business rejections always
//! propagate.

pub mod fallback;
pub mod http;

pub use fallback::LocalIdentityService;
pub use http::HttpIdentityService;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
use crate::session::AuthenticatedSession;

/// Acknowledgement that a one-time code was dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeDispatch {
    pub expires_in_seconds: u64,
}

/// Response to the sign-in precursor call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginIntent {
    pub requires_phone_verification: bool,
}

/// A phone marked verified-pending-signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupVerification {
    pub phone: String,
    pub is_new_user: bool,
}

/// Fields sent to account creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub phone: String,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// The identity service contract, implemented by the remote HTTP backend
/// and by the local simulation.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Request a one-time code be dispatched to `phone`.
    async fn send_code(&self, phone: &str) -> Result<CodeDispatch, IdentityError>;

    /// Announce a sign-in attempt for `phone`.
    async fn login_intent(&self, phone: &str) -> Result<LoginIntent, IdentityError>;

    /// Validate `code` for an existing account and return its session.
    async fn verify_sign_in(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<AuthenticatedSession, IdentityError>;

    /// Validate `code` for a not-yet-created account.
    async fn verify_sign_up(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<SignupVerification, IdentityError>;

    /// Create the account for a verified-pending-signup phone.
    async fn create_account(
        &self,
        request: &SignupRequest,
    ) -> Result<AuthenticatedSession, IdentityError>;
}

/// Primary-with-fallback wrapper around the identity service.
///
/// Every operation tries the primary service first. On a transport failure
/// (and only a transport failure) the local simulation is substituted so
/// the flow stays usable without a live backend.
pub struct VerificationClient {
    primary: Arc<dyn IdentityService>,
    fallback: LocalIdentityService,
}

impl VerificationClient {
    pub fn new(primary: Arc<dyn IdentityService>) -> Self {
        Self {
            primary,
            fallback: LocalIdentityService::new(),
        }
    }

    pub async fn send_code(&self, phone: &str) -> Result<CodeDispatch, IdentityError> {
        match self.primary.send_code(phone).await {
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, "send_code: falling back to local simulation");
                self.fallback.send_code(phone).await
            }
            other => other,
        }
    }

    pub async fn login_intent(&self, phone: &str) -> Result<LoginIntent, IdentityError> {
        match self.primary.login_intent(phone).await {
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, "login_intent: falling back to local simulation");
                self.fallback.login_intent(phone).await
            }
            other => other,
        }
    }

    pub async fn verify_sign_in(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<AuthenticatedSession, IdentityError> {
        match self.primary.verify_sign_in(phone, code).await {
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, "verify_sign_in: falling back to local simulation");
                self.fallback.verify_sign_in(phone, code).await
            }
            other => other,
        }
    }

    pub async fn verify_sign_up(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<SignupVerification, IdentityError> {
        match self.primary.verify_sign_up(phone, code).await {
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, "verify_sign_up: falling back to local simulation");
                self.fallback.verify_sign_up(phone, code).await
            }
            other => other,
        }
    }

    pub async fn create_account(
        &self,
        request: &SignupRequest,
    ) -> Result<AuthenticatedSession, IdentityError> {
        match self.primary.create_account(request).await {
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, "create_account: falling back to local simulation");
                self.fallback.create_account(request).await
            }
            other => other,
        }
    }
}
