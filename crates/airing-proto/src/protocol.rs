use serde::{Deserialize, Serialize};

use crate::input::Gesture;
use crate::render::RenderFrame;
use crate::view::Trigger;

/// Current protocol version.  Bump this when the wire format changes in a
/// breaking way.
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages sent from clients to the guide core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    Toggle,
    Show,
    Hide,
    /// Raw gesture, routed through the input adapter's deadzones.
    Gesture { gesture: Gesture },
    /// Pick a co-airing entry of the current slot.
    Select { index: usize },
    /// Back to the selection list of a co-airing slot.
    ClearSelection,
    /// Run an evaluation cycle now (still subject to change detection).
    Reevaluate,
}

impl Command {
    /// Commands that map directly onto a view trigger.
    pub fn trigger(&self) -> Option<Trigger> {
        match self {
            Command::Toggle => Some(Trigger::Toggle),
            Command::Show => Some(Trigger::ForceShow),
            Command::Hide => Some(Trigger::ForceHide),
            _ => None,
        }
    }
}

/// Messages pushed from the guide core to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "broadcast", rename_all = "snake_case")]
pub enum Broadcast {
    /// Sent first on every new subscription.
    Hello {
        protocol_version: u32,
        state: GuideState,
    },
    State {
        data: GuideState,
    },
    Log {
        message: String,
    },
}

/// What the guide is currently able to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GuideStatus {
    /// Timetable not loaded yet.
    #[default]
    Loading,
    Ready { frame: Box<RenderFrame> },
    /// Timetable could not be loaded; shown in place of content.
    Failed { message: String },
}

/// Full state of the guide.  `rev` increases on every change so clients can
/// tell whether they missed an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GuideState {
    #[serde(default)]
    pub rev: u64,
    pub status: GuideStatus,
    /// `HHMM` when running on simulated time.
    #[serde(default)]
    pub simulated_time: Option<String>,
}

impl GuideState {
    pub fn frame(&self) -> Option<&RenderFrame> {
        match &self.status {
            GuideStatus::Ready { frame } => Some(frame.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let cmd: Command = serde_json::from_str(r#"{"cmd":"select","index":1}"#).unwrap();
        assert_eq!(cmd, Command::Select { index: 1 });

        let cmd: Command =
            serde_json::from_str(r#"{"cmd":"gesture","gesture":{"gesture":"wheel","delta":-80}}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::Gesture {
                gesture: Gesture::Wheel { delta: -80.0 }
            }
        );
        assert_eq!(Command::Hide.trigger(), Some(Trigger::ForceHide));
        assert_eq!(Command::Reevaluate.trigger(), None);
    }

    #[test]
    fn test_failed_state_serializes_message() {
        let state = GuideState {
            rev: 3,
            status: GuideStatus::Failed {
                message: "Unable to load the timetable.".into(),
            },
            simulated_time: None,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"]["status"], "failed");
        assert_eq!(json["status"]["message"], "Unable to load the timetable.");
        assert!(state.frame().is_none());
    }
}
