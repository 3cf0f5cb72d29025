//! End-to-end flow scenarios, driven through scripted identity services.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use mingle_client::config::ClientConfig;
use mingle_client::error::IdentityError;
use mingle_client::flow::{FlowEvent, FlowMachine, FlowMode, FlowOutcome, FlowState, ProfileFields};
use mingle_client::identity::{
    CodeDispatch, IdentityService, LoginIntent, SignupRequest, SignupVerification,
    VerificationClient,
};
use mingle_client::session::{AuthenticatedSession, MemorySessionStore, SessionStore, keys};

/// A primary service that is never reachable and counts the attempts.
/// Every call lands in the local fallback simulation.
#[derive(Default)]
struct UnreachableService {
    calls: AtomicUsize,
}

impl UnreachableService {
    fn down(&self) -> IdentityError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        IdentityError::Transport("connection refused".into())
    }
}

#[async_trait]
impl IdentityService for UnreachableService {
    async fn send_code(&self, _phone: &str) -> Result<CodeDispatch, IdentityError> {
        Err(self.down())
    }
    async fn login_intent(&self, _phone: &str) -> Result<LoginIntent, IdentityError> {
        Err(self.down())
    }
    async fn verify_sign_in(
        &self,
        _phone: &str,
        _code: &str,
    ) -> Result<AuthenticatedSession, IdentityError> {
        Err(self.down())
    }
    async fn verify_sign_up(
        &self,
        _phone: &str,
        _code: &str,
    ) -> Result<SignupVerification, IdentityError> {
        Err(self.down())
    }
    async fn create_account(
        &self,
        _request: &SignupRequest,
    ) -> Result<AuthenticatedSession, IdentityError> {
        Err(self.down())
    }
}

/// A primary service that reaches the backend but is rate-limited on code
/// dispatch — a business rejection that must not trigger the fallback.
struct RateLimitedService;

#[async_trait]
impl IdentityService for RateLimitedService {
    async fn send_code(&self, _phone: &str) -> Result<CodeDispatch, IdentityError> {
        Err(IdentityError::RateLimited)
    }
    async fn login_intent(&self, _phone: &str) -> Result<LoginIntent, IdentityError> {
        Ok(LoginIntent {
            requires_phone_verification: true,
        })
    }
    async fn verify_sign_in(
        &self,
        _phone: &str,
        _code: &str,
    ) -> Result<AuthenticatedSession, IdentityError> {
        Err(IdentityError::InvalidCode)
    }
    async fn verify_sign_up(
        &self,
        _phone: &str,
        _code: &str,
    ) -> Result<SignupVerification, IdentityError> {
        Err(IdentityError::InvalidCode)
    }
    async fn create_account(
        &self,
        _request: &SignupRequest,
    ) -> Result<AuthenticatedSession, IdentityError> {
        Err(IdentityError::RateLimited)
    }
}

fn test_config() -> ClientConfig {
    ClientConfig {
        handoff_delay: Duration::ZERO,
        ..ClientConfig::default()
    }
}

fn offline_machine() -> (FlowMachine, Arc<MemorySessionStore>, Arc<UnreachableService>) {
    let primary = Arc::new(UnreachableService::default());
    let client = VerificationClient::new(Arc::clone(&primary) as Arc<dyn IdentityService>);
    let store = Arc::new(MemorySessionStore::new());
    let machine = FlowMachine::new(client, Arc::clone(&store) as Arc<dyn SessionStore>, test_config());
    (machine, store, primary)
}

fn profile(name: &str, username: &str) -> FlowEvent {
    FlowEvent::SubmitProfile(ProfileFields {
        name: name.to_string(),
        username: username.to_string(),
        email: None,
        bio: None,
    })
}

fn submit_phone(raw: &str) -> FlowEvent {
    FlowEvent::SubmitPhone {
        country: "US".to_string(),
        raw_input: raw.to_string(),
    }
}

fn submit_code(code: &str) -> FlowEvent {
    FlowEvent::SubmitCode {
        code: code.to_string(),
    }
}

#[tokio::test]
async fn scenario_a_sign_up_happy_path() {
    let (mut machine, store, _) = offline_machine();

    assert_eq!(machine.state(), FlowState::Landing);
    assert_eq!(machine.dispatch(FlowEvent::ChooseSignUp).await, FlowState::PhoneEntry);
    assert_eq!(machine.mode(), FlowMode::SignUp);

    assert_eq!(
        machine.dispatch(submit_phone("+15551234567")).await,
        FlowState::CodeVerification
    );
    assert_eq!(
        machine.dispatch(submit_code("123456")).await,
        FlowState::ProfileCreation
    );
    assert_eq!(
        machine.dispatch(profile("Jo", "jo1")).await,
        FlowState::InterestsStep
    );

    machine.dispatch(FlowEvent::ToggleInterest { name: "hiking".into() }).await;
    assert_eq!(machine.state(), FlowState::InterestsStep);
    assert_eq!(machine.dispatch(FlowEvent::Continue).await, FlowState::SocialsStep);

    machine
        .dispatch(FlowEvent::SetSocialHandle {
            platform: "instagram".into(),
            handle: "@jo".into(),
        })
        .await;
    assert_eq!(machine.dispatch(FlowEvent::Continue).await, FlowState::FriendsStep);
    assert_eq!(
        machine.dispatch(FlowEvent::ConnectContacts).await,
        FlowState::Complete
    );
    assert!(machine.error().is_none());

    // The finalized user record is persisted with exactly the accumulated
    // fields.
    let user = store.get(keys::USER).await.unwrap().unwrap();
    assert_eq!(user["name"], "Jo");
    assert_eq!(user["username"], "jo1");
    assert_eq!(user["interests"], serde_json::json!(["hiking"]));
    assert_eq!(user["social_links"]["instagram"], "@jo");

    match machine.handoff().await {
        Some(FlowOutcome::Completed {
            session,
            is_new_user,
            walkthrough_completed,
        }) => {
            assert_eq!(session.user.username, "jo1");
            assert!(is_new_user);
            assert!(walkthrough_completed);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    // Handoff resets the machine.
    assert_eq!(machine.state(), FlowState::Landing);
    assert_eq!(machine.mode(), FlowMode::Unset);
}

#[tokio::test]
async fn scenario_b_sign_in_happy_path() {
    let (mut machine, store, _) = offline_machine();

    machine.dispatch(FlowEvent::ChooseSignIn).await;
    assert_eq!(machine.mode(), FlowMode::SignIn);
    assert_eq!(
        machine.dispatch(submit_phone("+15551234567")).await,
        FlowState::CodeVerification
    );
    assert_eq!(
        machine.dispatch(submit_code("123456")).await,
        FlowState::SignInSuccess
    );

    // Session persisted before the automatic handoff.
    assert!(store.get(keys::ACCESS_TOKEN).await.unwrap().is_some());
    assert!(store.get(keys::REFRESH_TOKEN).await.unwrap().is_some());
    assert!(store.get(keys::USER).await.unwrap().is_some());

    match machine.handoff().await {
        Some(FlowOutcome::Completed { is_new_user, .. }) => assert!(!is_new_user),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn scenario_c_invalid_code_keeps_state() {
    let (mut machine, _, _) = offline_machine();

    machine.dispatch(FlowEvent::ChooseSignUp).await;
    machine.dispatch(submit_phone("+15551234567")).await;
    assert_eq!(machine.state(), FlowState::CodeVerification);

    assert_eq!(
        machine.dispatch(submit_code("000000")).await,
        FlowState::CodeVerification
    );
    let signal = machine.error().expect("error signal set");
    assert!(signal.message.to_lowercase().contains("code"));

    // The next attempt clears the signal and succeeds.
    assert_eq!(
        machine.dispatch(submit_code("123456")).await,
        FlowState::ProfileCreation
    );
    assert!(machine.error().is_none());
}

#[tokio::test]
async fn scenario_d_malformed_phone_never_reaches_the_client() {
    let (mut machine, _, primary) = offline_machine();

    machine.dispatch(FlowEvent::ChooseSignUp).await;
    assert_eq!(
        machine.dispatch(submit_phone("abc")).await,
        FlowState::PhoneEntry
    );
    assert!(machine.error().is_some());
    assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn scenario_e_transport_failure_falls_back() {
    let (mut machine, _, primary) = offline_machine();

    machine.dispatch(FlowEvent::ChooseSignUp).await;
    assert_eq!(
        machine.dispatch(submit_phone("+15551234567")).await,
        FlowState::CodeVerification
    );
    // The primary was attempted, then the simulation took over.
    assert!(primary.calls.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn business_rejection_blocks_transition_without_fallback() {
    let client = VerificationClient::new(Arc::new(RateLimitedService));
    let store = Arc::new(MemorySessionStore::new());
    let mut machine =
        FlowMachine::new(client, Arc::clone(&store) as Arc<dyn SessionStore>, test_config());

    machine.dispatch(FlowEvent::ChooseSignUp).await;
    assert_eq!(
        machine.dispatch(submit_phone("+15551234567")).await,
        FlowState::PhoneEntry
    );
    let signal = machine.error().expect("rate limit surfaced");
    assert!(signal.message.contains("Too many attempts"));
}

#[tokio::test]
async fn sign_in_login_intent_failure_does_not_block_code_dispatch() {
    // login_intent is unreachable along with everything else; the flow
    // still reaches code verification via the send_code fallback.
    let (mut machine, _, _) = offline_machine();

    machine.dispatch(FlowEvent::ChooseSignIn).await;
    assert_eq!(
        machine.dispatch(submit_phone("+15551234567")).await,
        FlowState::CodeVerification
    );
    assert!(machine.error().is_none());
}

#[tokio::test]
async fn empty_profile_fields_are_guarded() {
    let (mut machine, _, _) = offline_machine();

    machine.dispatch(FlowEvent::ChooseSignUp).await;
    machine.dispatch(submit_phone("+15551234567")).await;
    machine.dispatch(submit_code("123456")).await;
    assert_eq!(machine.state(), FlowState::ProfileCreation);

    machine.dispatch(profile("", "jo1")).await;
    assert_eq!(machine.state(), FlowState::ProfileCreation);
    assert!(machine.error().unwrap().message.contains("name"));

    machine.dispatch(profile("Jo", "")).await;
    assert!(machine.error().unwrap().message.contains("username"));
}

#[tokio::test]
async fn short_code_is_rejected_locally() {
    let (mut machine, _, primary) = offline_machine();

    machine.dispatch(FlowEvent::ChooseSignUp).await;
    machine.dispatch(submit_phone("+15551234567")).await;
    let calls_after_send = primary.calls.load(Ordering::SeqCst);

    machine.dispatch(submit_code("123")).await;
    assert_eq!(machine.state(), FlowState::CodeVerification);
    assert!(machine.error().unwrap().message.contains("6 digits"));
    // No verify attempt went out.
    assert_eq!(primary.calls.load(Ordering::SeqCst), calls_after_send);
}

#[tokio::test]
async fn inapplicable_intents_are_ignored() {
    let (mut machine, _, _) = offline_machine();

    machine.dispatch(FlowEvent::Continue).await;
    assert_eq!(machine.state(), FlowState::Landing);
    assert!(machine.error().is_none());

    machine.dispatch(FlowEvent::ChooseSignUp).await;
    machine.dispatch(FlowEvent::ConnectContacts).await;
    assert_eq!(machine.state(), FlowState::PhoneEntry);
    assert!(machine.error().is_none());
}

#[tokio::test]
async fn pending_identity_survives_reentry() {
    let client = VerificationClient::new(Arc::new(RateLimitedService));
    let store = Arc::new(MemorySessionStore::new());
    let mut machine =
        FlowMachine::new(client, Arc::clone(&store) as Arc<dyn SessionStore>, test_config());

    machine.dispatch(FlowEvent::ChooseSignUp).await;
    machine.dispatch(submit_phone("+15551234567")).await;

    // send_code was rate limited; the normalized phone is still held for
    // the retry.
    assert_eq!(machine.state(), FlowState::PhoneEntry);
    assert_eq!(machine.pending().canonical_phone, "+15551234567");
    assert_eq!(machine.pending().country_code, "US");
}

#[tokio::test]
async fn abandon_resets_without_touching_the_store() {
    let (mut machine, store, _) = offline_machine();

    machine.dispatch(FlowEvent::ChooseSignUp).await;
    machine.dispatch(submit_phone("+15551234567")).await;

    assert!(matches!(machine.abandon(), FlowOutcome::Abandoned));
    assert_eq!(machine.state(), FlowState::Landing);
    assert_eq!(machine.mode(), FlowMode::Unset);
    assert!(machine.pending().canonical_phone.is_empty());
    assert!(store.get(keys::ACCESS_TOKEN).await.unwrap().is_none());
}

#[tokio::test]
async fn handoff_is_a_no_op_before_terminal() {
    let (mut machine, _, _) = offline_machine();
    assert!(machine.handoff().await.is_none());

    machine.dispatch(FlowEvent::ChooseSignIn).await;
    assert!(machine.handoff().await.is_none());
}

#[tokio::test]
async fn skip_paths_reach_complete() {
    let (mut machine, store, _) = offline_machine();

    machine.dispatch(FlowEvent::ChooseSignUp).await;
    machine.dispatch(submit_phone("+15551234567")).await;
    machine.dispatch(submit_code("123456")).await;
    machine.dispatch(profile("Sam", "sam42")).await;
    machine.dispatch(FlowEvent::Continue).await; // interests
    machine.dispatch(FlowEvent::Skip).await; // socials
    assert_eq!(machine.dispatch(FlowEvent::Skip).await, FlowState::Complete);

    let user = store.get(keys::USER).await.unwrap().unwrap();
    assert_eq!(user["username"], "sam42");
    assert_eq!(user["interests"], serde_json::json!([]));
}
