//! The flow state machine.
//!
//! Consumes one user intent at a time, consults the verification client and
//! the onboarding draft for guards and side effects, then advances along
//! the mode's step sequence. Guard and side-effect failures set the error
//! signal and leave the state untouched; the signal clears on the next
//! attempted intent.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::draft::{FriendImportChoice, OnboardingDraft};
use crate::error::{Error, Result, ValidationError};
use crate::identity::{SignupRequest, VerificationClient};
use crate::phone;
use crate::session::{keys, AuthenticatedSession, SessionStore};

use super::event::FlowEvent;
use super::progress::{self, Progress};
use super::state::{next_in_sequence, FlowMode, FlowState, PendingIdentity};

/// Transient, single-slot error attached to the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSignal {
    pub message: String,
}

/// What the flow hands the host application when it ends.
#[derive(Debug, Clone)]
pub enum FlowOutcome {
    /// The flow reached a terminal state. The host is responsible for
    /// writing the `is_new_user` / `walkthrough_completed` flags to its
    /// store; the machine never does.
    Completed {
        session: AuthenticatedSession,
        is_new_user: bool,
        walkthrough_completed: bool,
    },
    /// The user left the flow. No store mutation.
    Abandoned,
}

/// One flow instance per session.
pub struct FlowMachine {
    client: VerificationClient,
    store: Arc<dyn SessionStore>,
    config: ClientConfig,
    state: FlowState,
    mode: FlowMode,
    pending: PendingIdentity,
    draft: OnboardingDraft,
    session: Option<AuthenticatedSession>,
    error: Option<ErrorSignal>,
    loading: bool,
}

impl FlowMachine {
    pub fn new(
        client: VerificationClient,
        store: Arc<dyn SessionStore>,
        config: ClientConfig,
    ) -> Self {
        Self {
            client,
            store,
            config,
            state: FlowState::Landing,
            mode: FlowMode::Unset,
            pending: PendingIdentity::default(),
            draft: OnboardingDraft::new(),
            session: None,
            error: None,
            loading: false,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn mode(&self) -> FlowMode {
        self.mode
    }

    pub fn error(&self) -> Option<&ErrorSignal> {
        self.error.as_ref()
    }

    /// True while an intent's awaited call is outstanding; the UI disables
    /// resubmission on it.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn pending(&self) -> &PendingIdentity {
        &self.pending
    }

    pub fn draft(&self) -> &OnboardingDraft {
        &self.draft
    }

    /// Progress display for the current state and mode.
    pub fn progress(&self) -> Progress {
        progress::project(self.state, self.mode)
    }

    /// Process one user intent and return the resulting state.
    ///
    /// The error signal is cleared at the start of every attempt and set
    /// again if the guard or a side effect fails, in which case the state
    /// is unchanged. Intents that do not apply to the current state are
    /// ignored.
    pub async fn dispatch(&mut self, event: FlowEvent) -> FlowState {
        if self.loading {
            tracing::debug!(state = %self.state, "intent ignored while a call is outstanding");
            return self.state;
        }
        self.error = None;
        self.loading = true;
        let result = self.apply(event).await;
        self.loading = false;

        if let Err(e) = result {
            tracing::debug!(state = %self.state, error = %e, "intent failed");
            self.error = Some(ErrorSignal {
                message: e.to_string(),
            });
        }
        self.state
    }

    async fn apply(&mut self, event: FlowEvent) -> Result<()> {
        match (self.state, event) {
            (FlowState::Landing, FlowEvent::ChooseSignIn) => {
                self.mode = FlowMode::SignIn;
                self.advance();
            }
            (FlowState::Landing, FlowEvent::ChooseSignUp) => {
                self.mode = FlowMode::SignUp;
                self.advance();
            }
            (FlowState::PhoneEntry, FlowEvent::SubmitPhone { country, raw_input }) => {
                self.submit_phone(&country, &raw_input).await?;
            }
            (FlowState::CodeVerification, FlowEvent::SubmitCode { code }) => {
                self.submit_code(&code).await?;
            }
            (FlowState::ProfileCreation, FlowEvent::SubmitProfile(fields)) => {
                if fields.name.trim().is_empty() {
                    return Err(ValidationError::EmptyField { field: "name" }.into());
                }
                if fields.username.trim().is_empty() {
                    return Err(ValidationError::EmptyField { field: "username" }.into());
                }
                self.draft.set_profile(fields);
                let request = SignupRequest {
                    phone: self.pending.canonical_phone.clone(),
                    name: self.draft.name.clone(),
                    username: self.draft.username.clone(),
                    email: self.draft.email.clone(),
                    bio: self.draft.bio.clone(),
                };
                let session = self.client.create_account(&request).await?;
                self.persist_session(&session).await?;
                self.session = Some(session);
                self.advance();
            }
            (FlowState::InterestsStep, FlowEvent::ToggleInterest { name }) => {
                self.draft.toggle_interest(&name);
            }
            (FlowState::InterestsStep, FlowEvent::Continue) => {
                self.advance();
            }
            (FlowState::SocialsStep, FlowEvent::SetSocialHandle { platform, handle }) => {
                self.draft.set_social_handle(&platform, &handle)?;
            }
            (FlowState::SocialsStep, FlowEvent::RemoveSocialHandle { platform }) => {
                self.draft.remove_social_handle(&platform);
            }
            (FlowState::SocialsStep, FlowEvent::Continue | FlowEvent::Skip) => {
                self.advance();
            }
            (FlowState::FriendsStep, FlowEvent::ConnectContacts) => {
                self.draft.set_friend_import(FriendImportChoice::ConnectContacts);
                self.complete().await?;
            }
            (FlowState::FriendsStep, FlowEvent::Skip) => {
                self.draft.set_friend_import(FriendImportChoice::Skipped);
                self.complete().await?;
            }
            (state, event) => {
                tracing::debug!(%state, ?event, "intent does not apply to this state");
            }
        }
        Ok(())
    }

    async fn submit_phone(&mut self, country: &str, raw_input: &str) -> Result<()> {
        if raw_input.trim().is_empty() {
            return Err(ValidationError::EmptyField { field: "phone number" }.into());
        }
        let canonical = phone::normalize(country, raw_input).ok_or_else(|| {
            ValidationError::UnsupportedCountry {
                code: country.to_string(),
            }
        })?;
        if !phone::is_valid(&canonical, country) {
            return Err(ValidationError::MalformedPhone {
                input: raw_input.to_string(),
            }
            .into());
        }

        // Only the fields the user edited change; the rest of the pending
        // identity survives re-entry after an error.
        self.pending.country_code = country.to_string();
        self.pending.local_digits = raw_input.chars().filter(|c| c.is_ascii_digit()).collect();
        self.pending.canonical_phone = canonical.clone();

        if self.mode == FlowMode::SignIn {
            // Login intent failure is surfaced later, by the verify step,
            // if the account really does not exist. The code request always
            // goes out.
            if let Err(e) = self.client.login_intent(&canonical).await {
                tracing::debug!(error = %e, "login intent failed; continuing to code dispatch");
            }
        }
        self.client.send_code(&canonical).await?;
        self.advance();
        Ok(())
    }

    async fn submit_code(&mut self, code: &str) -> Result<()> {
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::BadCodeLength { len: code.len() }.into());
        }
        self.pending.verification_code = code.to_string();

        match self.mode {
            FlowMode::SignIn => {
                let session = self
                    .client
                    .verify_sign_in(&self.pending.canonical_phone, code)
                    .await?;
                self.persist_session(&session).await?;
                self.session = Some(session);
            }
            FlowMode::SignUp => {
                self.client
                    .verify_sign_up(&self.pending.canonical_phone, code)
                    .await?;
            }
            FlowMode::Unset => {
                tracing::error!("code submitted before an entry path was chosen");
                return Ok(());
            }
        }
        self.advance();
        Ok(())
    }

    /// Freeze the draft onto the created account and persist the result.
    async fn complete(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            tracing::error!("reached friends step without a session");
            return Ok(());
        };
        session.user = self.draft.finalize(&session.user);
        let user_json = serde_json::to_value(&session.user)
            .map_err(crate::error::SessionError::from)?;
        self.store.set(keys::USER, &user_json).await.map_err(Error::from)?;
        self.advance();
        Ok(())
    }

    fn advance(&mut self) {
        match next_in_sequence(self.state, self.mode) {
            Some(next) => {
                tracing::debug!(from = %self.state, to = %next, "flow transition");
                self.state = next;
            }
            None => {
                tracing::error!(state = %self.state, mode = ?self.mode, "no successor state");
            }
        }
    }

    async fn persist_session(&self, session: &AuthenticatedSession) -> Result<()> {
        self.store
            .set(keys::ACCESS_TOKEN, &serde_json::Value::String(session.access_token.clone()))
            .await?;
        self.store
            .set(keys::REFRESH_TOKEN, &serde_json::Value::String(session.refresh_token.clone()))
            .await?;
        let user_json =
            serde_json::to_value(&session.user).map_err(crate::error::SessionError::from)?;
        self.store.set(keys::USER, &user_json).await?;
        Ok(())
    }

    /// Automatic terminal handoff.
    ///
    /// Returns `None` unless the flow sits in a terminal state. Waits the
    /// configured delay, then yields the completed outcome and resets the
    /// machine to `Landing`.
    pub async fn handoff(&mut self) -> Option<FlowOutcome> {
        if !self.state.is_terminal() {
            return None;
        }
        tokio::time::sleep(self.config.handoff_delay).await;

        let session = self.session.take()?;
        let is_new_user = self.mode == FlowMode::SignUp;
        self.reset();
        Some(FlowOutcome::Completed {
            session,
            is_new_user,
            walkthrough_completed: true,
        })
    }

    /// The user left the flow without finishing.
    pub fn abandon(&mut self) -> FlowOutcome {
        self.reset();
        FlowOutcome::Abandoned
    }

    /// Return fully to `Landing`: mode, pending identity, draft, session
    /// copy, and error signal all clear.
    pub fn reset(&mut self) {
        self.state = FlowState::Landing;
        self.mode = FlowMode::Unset;
        self.pending = PendingIdentity::default();
        self.draft = OnboardingDraft::new();
        self.session = None;
        self.error = None;
        self.loading = false;
    }
}
