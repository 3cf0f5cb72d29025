//! Onboarding draft — the in-progress user record assembled across the
//! sign-up steps.
//!
//! Each step mutates the draft additively; nothing here talks to the
//! network or the store. At the `Complete` transition the flow machine
//! freezes the draft onto the account created earlier via [`OnboardingDraft::finalize`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::flow::ProfileFields;
use crate::session::User;

/// What the user chose on the friends step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FriendImportChoice {
    #[default]
    Undecided,
    ConnectContacts,
    Skipped,
}

/// Accumulates profile fields, interests, social links, and the friend
/// import choice across the sign-up steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingDraft {
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub interests: BTreeSet<String>,
    pub social_links: BTreeMap<String, String>,
    pub friend_import: FriendImportChoice,
}

impl OnboardingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the core profile fields from the profile-creation step.
    pub fn set_profile(&mut self, fields: ProfileFields) {
        self.name = fields.name;
        self.username = fields.username;
        self.email = fields.email.filter(|e| !e.is_empty());
        self.bio = fields.bio.filter(|b| !b.is_empty());
    }

    /// Toggle an interest in or out of the set.
    ///
    /// Symmetric: toggling the same name twice restores the prior set.
    pub fn toggle_interest(&mut self, name: &str) {
        if !self.interests.remove(name) {
            self.interests.insert(name.to_string());
        }
    }

    /// Record a social handle. An empty platform key is rejected; an empty
    /// handle removes the entry instead.
    pub fn set_social_handle(
        &mut self,
        platform: &str,
        handle: &str,
    ) -> Result<(), ValidationError> {
        if platform.is_empty() {
            return Err(ValidationError::EmptyPlatform);
        }
        if handle.is_empty() {
            self.remove_social_handle(platform);
        } else {
            self.social_links
                .insert(platform.to_string(), handle.to_string());
        }
        Ok(())
    }

    pub fn remove_social_handle(&mut self, platform: &str) {
        self.social_links.remove(platform);
    }

    pub fn set_friend_import(&mut self, choice: FriendImportChoice) {
        self.friend_import = choice;
    }

    /// Freeze the draft onto the created account.
    ///
    /// Applies exactly the accumulated fields; identity fields (id, phone,
    /// created_at) come from `base`. Called once, at the `Complete`
    /// transition — ordering is guarded by the flow machine.
    pub fn finalize(&self, base: &User) -> User {
        User {
            id: base.id.clone(),
            phone: base.phone.clone(),
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            bio: self.bio.clone(),
            interests: self.interests.iter().cloned().collect(),
            social_links: self.social_links.clone(),
            created_at: base.created_at,
        }
    }
}
