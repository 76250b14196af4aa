//! Input adapter: collapses heterogeneous gestures into a `Trigger`.
//!
//! Pointer gestures carry only their deltas.  Movements inside the deadzone
//! are ignored so that a resting thumb or a trackpad's inertial tail does not
//! flip the view.

use serde::{Deserialize, Serialize};

use crate::config::InputConfig;
use crate::view::Trigger;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gesture", rename_all = "snake_case")]
pub enum Gesture {
    SidebarActivated,
    FooterActivated,
    /// Touch swipe; the dominant axis must clear the swipe threshold.
    Swipe { dx: f64, dy: f64 },
    /// Scroll wheel / trackpad, accumulated vertical delta.
    Wheel { delta: f64 },
    /// Mouse drag; the dominant axis must clear the drag threshold.
    Drag { dx: f64, dy: f64 },
    /// Explicit request for the schedule grid.
    ScheduleRequested,
    CloseControl,
    Escape,
    /// The highlighted "now" cell in the grid was picked.
    NowCellSelected,
    /// The alternate action offered on the standby placeholder.
    StandbyAlternate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deadzones {
    pub swipe: f64,
    pub wheel: f64,
    pub drag: f64,
}

impl Default for Deadzones {
    fn default() -> Self {
        Self::from(&InputConfig::default())
    }
}

impl From<&InputConfig> for Deadzones {
    fn from(cfg: &InputConfig) -> Self {
        Self {
            swipe: cfg.swipe_threshold,
            wheel: cfg.wheel_threshold,
            drag: cfg.drag_threshold,
        }
    }
}

impl Deadzones {
    /// `None` when the gesture is too small to count.
    pub fn trigger_for(&self, gesture: Gesture) -> Option<Trigger> {
        match gesture {
            Gesture::SidebarActivated | Gesture::FooterActivated => Some(Trigger::Toggle),
            Gesture::Swipe { dx, dy } => dominant_beyond(dx, dy, self.swipe),
            Gesture::Drag { dx, dy } => dominant_beyond(dx, dy, self.drag),
            Gesture::Wheel { delta } => (delta.abs() > self.wheel).then_some(Trigger::Toggle),
            Gesture::ScheduleRequested => Some(Trigger::ForceShow),
            Gesture::CloseControl
            | Gesture::Escape
            | Gesture::NowCellSelected
            | Gesture::StandbyAlternate => Some(Trigger::ForceHide),
        }
    }
}

/// Toggle if one axis strictly dominates and exceeds `threshold`.
fn dominant_beyond(dx: f64, dy: f64, threshold: f64) -> Option<Trigger> {
    let (ax, ay) = (dx.abs(), dy.abs());
    let dominant = if ay > ax {
        ay
    } else if ax > ay {
        ax
    } else {
        return None;
    };
    (dominant > threshold).then_some(Trigger::Toggle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones() -> Deadzones {
        Deadzones {
            swipe: 50.0,
            wheel: 30.0,
            drag: 40.0,
        }
    }

    #[test]
    fn test_clicks_toggle() {
        assert_eq!(zones().trigger_for(Gesture::SidebarActivated), Some(Trigger::Toggle));
        assert_eq!(zones().trigger_for(Gesture::FooterActivated), Some(Trigger::Toggle));
    }

    #[test]
    fn test_swipe_deadzone() {
        let z = zones();
        assert_eq!(z.trigger_for(Gesture::Swipe { dx: 3.0, dy: -80.0 }), Some(Trigger::Toggle));
        assert_eq!(z.trigger_for(Gesture::Swipe { dx: 51.0, dy: 10.0 }), Some(Trigger::Toggle));
        assert_eq!(z.trigger_for(Gesture::Swipe { dx: 0.0, dy: 50.0 }), None);
        // Diagonal with no dominant axis.
        assert_eq!(z.trigger_for(Gesture::Swipe { dx: 90.0, dy: -90.0 }), None);
    }

    #[test]
    fn test_wheel_and_drag_deadzones() {
        let z = zones();
        assert_eq!(z.trigger_for(Gesture::Wheel { delta: -12.0 }), None);
        assert_eq!(z.trigger_for(Gesture::Wheel { delta: 31.0 }), Some(Trigger::Toggle));
        assert_eq!(z.trigger_for(Gesture::Drag { dx: 0.0, dy: 39.0 }), None);
        assert_eq!(z.trigger_for(Gesture::Drag { dx: 0.0, dy: -41.0 }), Some(Trigger::Toggle));
    }

    #[test]
    fn test_close_actions_force_live() {
        for g in [
            Gesture::CloseControl,
            Gesture::Escape,
            Gesture::NowCellSelected,
            Gesture::StandbyAlternate,
        ] {
            assert_eq!(zones().trigger_for(g), Some(Trigger::ForceHide));
        }
        assert_eq!(zones().trigger_for(Gesture::ScheduleRequested), Some(Trigger::ForceShow));
    }

    #[test]
    fn test_gesture_json() {
        let g: Gesture = serde_json::from_str(r#"{"gesture":"swipe","dx":0,"dy":120}"#).unwrap();
        assert_eq!(g, Gesture::Swipe { dx: 0.0, dy: 120.0 });
        let g: Gesture = serde_json::from_str(r#"{"gesture":"escape"}"#).unwrap();
        assert_eq!(g, Gesture::Escape);
    }
}
