//! Progress projection — a pure read of (state, mode) for display.

use super::state::{self, FlowMode, FlowState};

/// What the progress chrome shows for the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// 1-based index within the mode's sequence; 0 when hidden/unknown.
    pub step_number: usize,
    pub total_steps: usize,
    /// `round(100 * step_number / total_steps)`.
    pub percentage: u8,
    pub label: &'static str,
    /// False at the flow boundaries (landing and the terminal states) and
    /// for any (state, mode) pair outside the mode's sequence.
    pub visible: bool,
}

impl Progress {
    fn hidden() -> Self {
        Self {
            step_number: 0,
            total_steps: 0,
            percentage: 0,
            label: "",
            visible: false,
        }
    }
}

/// Project the progress display for a state and mode.
///
/// Inconsistent pairs (state not in the mode's sequence) yield a zeroed,
/// hidden projection rather than failing.
pub fn project(state: FlowState, mode: FlowMode) -> Progress {
    let steps: Vec<_> = state::steps_for(mode).collect();
    let Some(index) = steps.iter().position(|row| row.state == state) else {
        return Progress::hidden();
    };

    let step_number = index + 1;
    let total_steps = steps.len();
    let percentage = (100.0 * step_number as f64 / total_steps as f64).round() as u8;
    let visible = !matches!(
        state,
        FlowState::Landing | FlowState::SignInSuccess | FlowState::Complete
    );

    Progress {
        step_number,
        total_steps,
        percentage,
        label: steps[index].label,
        visible,
    }
}
