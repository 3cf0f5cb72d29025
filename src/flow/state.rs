//! Flow states, modes, and the single step table.
//!
//! The step table is the one source of truth for both the per-mode
//! transition order and the progress display — the two cannot drift.

use serde::{Deserialize, Serialize};

/// The states of the verification and onboarding flow.
///
/// Sign-in traverses `Landing → PhoneEntry → CodeVerification →
/// SignInSuccess`; sign-up continues through the onboarding steps to
/// `Complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    Landing,
    PhoneEntry,
    CodeVerification,
    ProfileCreation,
    InterestsStep,
    SocialsStep,
    FriendsStep,
    Complete,
    SignInSuccess,
}

impl FlowState {
    /// Whether this state ends the flow (handoff to the host follows).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::SignInSuccess)
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Landing => "landing",
            Self::PhoneEntry => "phone_entry",
            Self::CodeVerification => "code_verification",
            Self::ProfileCreation => "profile_creation",
            Self::InterestsStep => "interests_step",
            Self::SocialsStep => "socials_step",
            Self::FriendsStep => "friends_step",
            Self::Complete => "complete",
            Self::SignInSuccess => "sign_in_success",
        };
        write!(f, "{s}")
    }
}

/// Which entry path the user chose from `Landing`.
///
/// Set once, immutable for the rest of the session; only a full reset back
/// to `Landing` clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMode {
    #[default]
    Unset,
    SignIn,
    SignUp,
}

/// The phone identity being verified.
///
/// `canonical_phone` is derived from country + digits via the normalizer,
/// never hand-edited. Re-entering a step after an error overwrites only the
/// fields the user edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingIdentity {
    pub country_code: String,
    pub local_digits: String,
    pub canonical_phone: String,
    pub verification_code: String,
}

/// Which modes a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepModes {
    Both,
    SignInOnly,
    SignUpOnly,
}

impl StepModes {
    fn includes(self, mode: FlowMode) -> bool {
        match (self, mode) {
            (_, FlowMode::Unset) => false,
            (Self::Both, _) => true,
            (Self::SignInOnly, FlowMode::SignIn) => true,
            (Self::SignUpOnly, FlowMode::SignUp) => true,
            _ => false,
        }
    }
}

/// One row of the step table.
#[derive(Debug, Clone, Copy)]
pub struct StepRow {
    pub state: FlowState,
    pub label: &'static str,
    modes: StepModes,
}

/// The ordered step table for both modes.
const STEP_TABLE: &[StepRow] = &[
    StepRow { state: FlowState::Landing, label: "Welcome", modes: StepModes::Both },
    StepRow { state: FlowState::PhoneEntry, label: "Your number", modes: StepModes::Both },
    StepRow { state: FlowState::CodeVerification, label: "Verify", modes: StepModes::Both },
    StepRow { state: FlowState::ProfileCreation, label: "Create your profile", modes: StepModes::SignUpOnly },
    StepRow { state: FlowState::InterestsStep, label: "Pick your interests", modes: StepModes::SignUpOnly },
    StepRow { state: FlowState::SocialsStep, label: "Link your socials", modes: StepModes::SignUpOnly },
    StepRow { state: FlowState::FriendsStep, label: "Find friends", modes: StepModes::SignUpOnly },
    StepRow { state: FlowState::Complete, label: "All set", modes: StepModes::SignUpOnly },
    StepRow { state: FlowState::SignInSuccess, label: "Welcome back", modes: StepModes::SignInOnly },
];

/// The ordered step sequence for a mode. Empty for `Unset`.
pub fn steps_for(mode: FlowMode) -> impl Iterator<Item = &'static StepRow> {
    STEP_TABLE.iter().filter(move |row| row.modes.includes(mode))
}

/// The state following `state` in the mode's sequence, if any.
///
/// Pure; the machine applies it only after guards and side effects succeed.
pub fn next_in_sequence(state: FlowState, mode: FlowMode) -> Option<FlowState> {
    let mut steps = steps_for(mode);
    steps.find(|row| row.state == state)?;
    steps.next().map(|row| row.state)
}
