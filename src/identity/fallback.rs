//! Local identity simulation.
//!
//! Stands in for the remote identity service when it is unreachable, so the
//! flow stays usable offline and in development. Codes are never actually
//! dispatched anywhere; a fixed demonstration code is stored per phone and
//! logged for the developer.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::IdentityError;
use crate::session::{AuthenticatedSession, User};

use super::{CodeDispatch, IdentityService, LoginIntent, SignupRequest, SignupVerification};

/// The code the simulation "delivers" for every phone.
pub const DEMO_CODE: &str = "123456";

/// Simulated code lifetime, matching the remote service's default.
const CODE_TTL_SECONDS: u64 = 300;

#[derive(Debug, Default)]
struct PhoneRecord {
    code: String,
    verified_for_signup: bool,
}

/// Ephemeral in-process identity service.
#[derive(Default)]
pub struct LocalIdentityService {
    phones: RwLock<HashMap<String, PhoneRecord>>,
    /// Created accounts, keyed by canonical phone.
    accounts: RwLock<HashMap<String, User>>,
}

impl LocalIdentityService {
    pub fn new() -> Self {
        Self::default()
    }

    fn session_for(user: User) -> AuthenticatedSession {
        AuthenticatedSession {
            access_token: format!("local-access-{}", Uuid::new_v4()),
            refresh_token: format!("local-refresh-{}", Uuid::new_v4()),
            user,
        }
    }
}

#[async_trait]
impl IdentityService for LocalIdentityService {
    async fn send_code(&self, phone: &str) -> Result<CodeDispatch, IdentityError> {
        let mut phones = self.phones.write().await;
        let record = phones.entry(phone.to_string()).or_default();
        record.code = DEMO_CODE.to_string();
        tracing::info!(%phone, code = DEMO_CODE, "simulated code delivery");
        Ok(CodeDispatch {
            expires_in_seconds: CODE_TTL_SECONDS,
        })
    }

    async fn login_intent(&self, _phone: &str) -> Result<LoginIntent, IdentityError> {
        Ok(LoginIntent {
            requires_phone_verification: true,
        })
    }

    async fn verify_sign_in(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<AuthenticatedSession, IdentityError> {
        let phones = self.phones.read().await;
        match phones.get(phone) {
            Some(record) if record.code == code => {}
            _ => return Err(IdentityError::InvalidCode),
        }
        drop(phones);

        // Offline mode has no real account database; return the locally
        // created account if one exists, otherwise fabricate a returning
        // demo user so sign-in remains exercisable.
        let accounts = self.accounts.read().await;
        let user = accounts.get(phone).cloned().unwrap_or_else(|| {
            let mut user = User::stub(Uuid::new_v4().to_string(), phone);
            user.name = "Demo User".to_string();
            user.username = "demo".to_string();
            user
        });
        Ok(Self::session_for(user))
    }

    async fn verify_sign_up(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<SignupVerification, IdentityError> {
        let mut phones = self.phones.write().await;
        match phones.get_mut(phone) {
            Some(record) if record.code == code => {
                record.verified_for_signup = true;
            }
            _ => return Err(IdentityError::InvalidCode),
        }
        drop(phones);

        let is_new_user = !self.accounts.read().await.contains_key(phone);
        Ok(SignupVerification {
            phone: phone.to_string(),
            is_new_user,
        })
    }

    async fn create_account(
        &self,
        request: &SignupRequest,
    ) -> Result<AuthenticatedSession, IdentityError> {
        {
            let phones = self.phones.read().await;
            match phones.get(&request.phone) {
                Some(record) if record.verified_for_signup => {}
                _ => return Err(IdentityError::PhoneNotVerified),
            }
        }

        let mut accounts = self.accounts.write().await;
        if accounts
            .values()
            .any(|u| u.username == request.username && u.phone != request.phone)
        {
            return Err(IdentityError::AccountCreationFailed(
                "That username is taken".to_string(),
            ));
        }

        let mut user = User::stub(Uuid::new_v4().to_string(), &request.phone);
        user.name = request.name.clone();
        user.username = request.username.clone();
        user.email = request.email.clone();
        user.bio = request.bio.clone();
        accounts.insert(request.phone.clone(), user.clone());

        Ok(Self::session_for(user))
    }
}
