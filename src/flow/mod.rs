//! The identity-verification and onboarding flow.
//!
//! A visitor becomes an authenticated, onboarded user by walking a
//! mode-dependent step sequence: sign-in verifies a phone and hands the
//! session off; sign-up continues through profile creation and the
//! enrichment steps. The machine consumes intents; the rendering layer
//! reads only `(FlowState, FlowMode)` plus the progress projection.

pub mod event;
pub mod machine;
pub mod progress;
pub mod state;

pub use event::{FlowEvent, ProfileFields};
pub use machine::{ErrorSignal, FlowMachine, FlowOutcome};
pub use progress::{project, Progress};
pub use state::{next_in_sequence, steps_for, FlowMode, FlowState, PendingIdentity};
