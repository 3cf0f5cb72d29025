//! User intents the flow machine consumes.

use serde::{Deserialize, Serialize};

/// Profile fields collected on the profile-creation step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileFields {
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// A user intent, dispatched one at a time into the flow machine.
///
/// Which intents apply depends on the current state; an intent that does
/// not apply is ignored. Accumulating intents (`ToggleInterest`,
/// `SetSocialHandle`, `RemoveSocialHandle`) mutate the onboarding draft
/// without leaving the current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowEvent {
    ChooseSignIn,
    ChooseSignUp,
    SubmitPhone { country: String, raw_input: String },
    SubmitCode { code: String },
    SubmitProfile(ProfileFields),
    ToggleInterest { name: String },
    SetSocialHandle { platform: String, handle: String },
    RemoveSocialHandle { platform: String },
    /// Advance from the interests or socials step.
    Continue,
    /// Skip the socials or friends step.
    Skip,
    /// Import contacts on the friends step.
    ConnectContacts,
}
