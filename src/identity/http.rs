//! Remote identity service over HTTP.
//!
//! JSON POST endpoints; request/response bodies are the serde shapes in
//! [`super`]. Anything that prevents the request from completing (connect,
//! timeout, malformed response body) maps to `IdentityError::Transport` so
//! the verification client can substitute the local simulation; HTTP
//! rejections map to the matching business error and propagate.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::IdentityError;
use crate::session::AuthenticatedSession;

use super::{CodeDispatch, IdentityService, LoginIntent, SignupRequest, SignupVerification};

/// Identity service client backed by HTTP.
pub struct HttpIdentityService {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct PhoneBody<'a> {
    phone: &'a str,
}

#[derive(Debug, Serialize)]
struct VerifyBody<'a> {
    phone: &'a str,
    code: &'a str,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpIdentityService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<reqwest::Response, IdentityError> {
        self.client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, IdentityError> {
        response
            .json::<T>()
            .await
            .map_err(|e| IdentityError::Transport(format!("invalid response body: {e}")))
    }

    /// Best-effort extraction of the service's `{"error": "..."}` message.
    async fn rejection_message(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("request rejected with status {status}"),
        }
    }
}

fn dispatch_error(status: StatusCode, message: String) -> IdentityError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => IdentityError::RateLimited,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            IdentityError::MalformedPhone(message)
        }
        _ => IdentityError::Transport(format!("send-verification failed: {message}")),
    }
}

fn sign_in_error(status: StatusCode, message: String) -> IdentityError {
    match status {
        StatusCode::NOT_FOUND => IdentityError::AccountNotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
            IdentityError::InvalidCode
        }
        StatusCode::TOO_MANY_REQUESTS => IdentityError::RateLimited,
        _ => IdentityError::Transport(format!("verify-phone failed: {message}")),
    }
}

fn sign_up_error(status: StatusCode, message: String) -> IdentityError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
            IdentityError::InvalidCode
        }
        StatusCode::TOO_MANY_REQUESTS => IdentityError::RateLimited,
        _ => IdentityError::Transport(format!("verify-signup failed: {message}")),
    }
}

fn creation_error(status: StatusCode, message: String) -> IdentityError {
    match status {
        StatusCode::FORBIDDEN => IdentityError::PhoneNotVerified,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            IdentityError::AccountCreationFailed(message)
        }
        StatusCode::TOO_MANY_REQUESTS => IdentityError::RateLimited,
        _ => IdentityError::Transport(format!("signup failed: {message}")),
    }
}

fn login_error(status: StatusCode, message: String) -> IdentityError {
    match status {
        StatusCode::NOT_FOUND => IdentityError::AccountNotFound,
        _ => IdentityError::Transport(format!("login failed: {message}")),
    }
}

#[async_trait::async_trait]
impl IdentityService for HttpIdentityService {
    async fn send_code(&self, phone: &str) -> Result<CodeDispatch, IdentityError> {
        let response = self.post("/auth/send-verification", &PhoneBody { phone }).await?;
        if response.status().is_success() {
            return Self::parse(response).await;
        }
        let status = response.status();
        Err(dispatch_error(status, Self::rejection_message(response).await))
    }

    async fn login_intent(&self, phone: &str) -> Result<LoginIntent, IdentityError> {
        let response = self.post("/auth/login", &PhoneBody { phone }).await?;
        if response.status().is_success() {
            return Self::parse(response).await;
        }
        let status = response.status();
        Err(login_error(status, Self::rejection_message(response).await))
    }

    async fn verify_sign_in(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<AuthenticatedSession, IdentityError> {
        let response = self.post("/auth/verify-phone", &VerifyBody { phone, code }).await?;
        if response.status().is_success() {
            return Self::parse(response).await;
        }
        let status = response.status();
        Err(sign_in_error(status, Self::rejection_message(response).await))
    }

    async fn verify_sign_up(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<SignupVerification, IdentityError> {
        let response = self.post("/auth/verify-signup", &VerifyBody { phone, code }).await?;
        if response.status().is_success() {
            return Self::parse(response).await;
        }
        let status = response.status();
        Err(sign_up_error(status, Self::rejection_message(response).await))
    }

    async fn create_account(
        &self,
        request: &SignupRequest,
    ) -> Result<AuthenticatedSession, IdentityError> {
        let response = self.post("/auth/signup", request).await?;
        if response.status().is_success() {
            return Self::parse(response).await;
        }
        let status = response.status();
        Err(creation_error(status, Self::rejection_message(response).await))
    }
}
