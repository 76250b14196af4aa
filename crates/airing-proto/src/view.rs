//! ViewStateMachine: which of the two views is on screen.
//!
//! ```text
//!   Live  ──toggle / force_show──▶  Schedule
//!   Live  ◀──toggle / force_hide──  Schedule
//! ```
//!
//! The machine does not care who asked; gesture handlers and the evaluation
//! cycle both go through `apply`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Live content (or standby placeholder) is shown.
    Live,
    /// The weekly schedule grid is shown.
    Schedule,
}

impl ViewState {
    pub fn schedule_visible(self) -> bool {
        self == ViewState::Schedule
    }
}

/// Normalised input: every gesture ends up as one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Toggle,
    ForceShow,
    ForceHide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewStateMachine {
    state: ViewState,
}

impl ViewStateMachine {
    /// Until the first evaluation cycle forces a state, the machine sits in
    /// `Live`; that cycle always renders and decides the real initial view.
    pub fn new() -> Self {
        Self {
            state: ViewState::Live,
        }
    }

    pub fn with_state(state: ViewState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn schedule_visible(&self) -> bool {
        self.state.schedule_visible()
    }

    pub fn toggle(&mut self) {
        self.state = match self.state {
            ViewState::Live => ViewState::Schedule,
            ViewState::Schedule => ViewState::Live,
        };
    }

    pub fn force_show(&mut self) {
        self.state = ViewState::Schedule;
    }

    pub fn force_hide(&mut self) {
        self.state = ViewState::Live;
    }

    /// Applies a trigger.  Returns true if the visible view changed.
    pub fn apply(&mut self, trigger: Trigger) -> bool {
        let before = self.state;
        match trigger {
            Trigger::Toggle => self.toggle(),
            Trigger::ForceShow => self.force_show(),
            Trigger::ForceHide => self.force_hide(),
        }
        self.state != before
    }
}

impl Default for ViewStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips() {
        let mut vsm = ViewStateMachine::new();
        assert!(!vsm.schedule_visible());
        assert!(vsm.apply(Trigger::Toggle));
        assert_eq!(vsm.state(), ViewState::Schedule);
        assert!(vsm.apply(Trigger::Toggle));
        assert_eq!(vsm.state(), ViewState::Live);
    }

    #[test]
    fn test_force_is_unconditional() {
        let mut vsm = ViewStateMachine::with_state(ViewState::Schedule);
        assert!(!vsm.apply(Trigger::ForceShow));
        assert!(vsm.schedule_visible());
        assert!(vsm.apply(Trigger::ForceHide));
        assert!(!vsm.apply(Trigger::ForceHide));
        assert_eq!(vsm.state(), ViewState::Live);
    }

    #[test]
    fn test_trigger_wire_names() {
        let t: Trigger = serde_json::from_str("\"force_show\"").unwrap();
        assert_eq!(t, Trigger::ForceShow);
        assert_eq!(serde_json::to_string(&ViewState::Schedule).unwrap(), "\"schedule\"");
    }
}
