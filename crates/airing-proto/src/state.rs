use std::sync::Arc;
use tokio::sync::RwLock;

use crate::protocol::{GuideState, GuideStatus};
use crate::render::RenderFrame;

/// Shared, read-mostly view of the guide state.  The core loop is the only
/// writer; HTTP handlers read snapshots.
pub struct StateManager {
    state: Arc<RwLock<GuideState>>,
}

impl StateManager {
    pub fn new(simulated_time: Option<String>) -> Self {
        let state = GuideState {
            rev: 1,
            status: GuideStatus::Loading,
            simulated_time,
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn get_state(&self) -> GuideState {
        self.state.read().await.clone()
    }

    pub async fn frame(&self) -> Option<RenderFrame> {
        self.state.read().await.frame().cloned()
    }

    pub async fn set_frame(&self, frame: RenderFrame) {
        let mut state = self.state.write().await;
        state.status = GuideStatus::Ready {
            frame: Box::new(frame),
        };
        state.rev += 1;
    }

    pub async fn set_failed(&self, message: String) {
        let mut state = self.state.write().await;
        state.status = GuideStatus::Failed { message };
        state.rev += 1;
    }

    pub async fn rev(&self) -> u64 {
        self.state.read().await.rev
    }
}
