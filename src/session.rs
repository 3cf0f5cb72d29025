//! Session persistence seam and the account/session models.
//!
//! The flow treats the host's session storage as a plain key-value store
//! with JSON values. The in-memory backend backs tests and the demo binary;
//! the host application supplies the real one.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::SessionError;

/// Well-known session store keys.
///
/// The flow writes the first three on session production. The two UI flags
/// are written by the host application after it receives the flow-completed
/// signal — the machine itself never touches them.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const USER: &str = "user";
    pub const WALKTHROUGH_COMPLETED: &str = "walkthrough_completed";
    pub const IS_NEW_USER: &str = "is_new_user";
}

/// Backend-agnostic key-value session store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), SessionError>;
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, SessionError>;
    async fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// In-memory session store.
#[derive(Default)]
pub struct MemorySessionStore {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), SessionError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, SessionError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// A persisted user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    /// Canonical phone identifier the account is keyed by.
    pub phone: String,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    /// Platform name → handle.
    #[serde(default)]
    pub social_links: std::collections::BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A bare account shell for a freshly verified phone.
    pub fn stub(id: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phone: phone.into(),
            name: String::new(),
            username: String::new(),
            email: None,
            bio: None,
            interests: Vec::new(),
            social_links: Default::default(),
            created_at: Utc::now(),
        }
    }
}

/// Tokens plus the account they authenticate.
///
/// Produced by a successful verification or signup call; handed off to the
/// session store immediately. The flow machine keeps only a transient copy
/// to drive its terminal transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_set_get_remove() {
        let store = MemorySessionStore::new();
        store
            .set(keys::ACCESS_TOKEN, &serde_json::json!("tok-1"))
            .await
            .unwrap();

        let got = store.get(keys::ACCESS_TOKEN).await.unwrap();
        assert_eq!(got, Some(serde_json::json!("tok-1")));

        store.remove(keys::ACCESS_TOKEN).await.unwrap();
        assert_eq!(store.get(keys::ACCESS_TOKEN).await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_missing_key_is_none() {
        let store = MemorySessionStore::new();
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[test]
    fn user_serde_roundtrip() {
        let mut user = User::stub("u-1", "+15551234567");
        user.name = "Jo".to_string();
        user.username = "jo1".to_string();
        user.interests = vec!["hiking".to_string()];
        user.social_links
            .insert("instagram".to_string(), "@jo".to_string());

        let json = serde_json::to_string(&user).unwrap();
        let parsed: User = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, user);
    }

    #[test]
    fn user_optional_fields_omitted_when_unset() {
        let user = User::stub("u-1", "+15551234567");
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("email"));
        assert!(!json.contains("bio"));
    }
}
