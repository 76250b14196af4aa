//! GuideCore: single-owner event loop for all mutable guide state.
//!
//! Owns the loaded schedule, the time resolver and the `SessionState`
//! exclusively.  The ticker and the HTTP API only send `GuideEvent`s; after
//! each event that changes what should be on screen, GuideCore rebuilds the
//! `RenderFrame`, stores it in the `StateManager` and broadcasts
//! `BroadcastMessage::StateUpdated`.
use std::sync::Arc;

use airing_proto::clock::{Clock, SystemClock, TimeResolver};
use airing_proto::config::Config;
use airing_proto::input::Deadzones;
use airing_proto::lookup::EmbedPolicy;
use airing_proto::protocol::Command;
use airing_proto::render::RenderFrame;
use airing_proto::schedule::Schedule;
use airing_proto::session::{evaluate, RenderPlan, SessionState};
use airing_proto::state::StateManager;
use airing_proto::timetable::{self, TimetableSource};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::BroadcastMessage;

// ── GuideEvent ────────────────────────────────────────────────────────────────

/// All inputs into the GuideCore loop.
#[derive(Debug)]
pub enum GuideEvent {
    /// Timer fired (or start-up): run an evaluation cycle.
    Evaluate,
    /// A command from the HTTP API.
    Command(Command),
    /// Shutdown requested.
    Shutdown,
}

// ── GuideCore ─────────────────────────────────────────────────────────────────

pub struct GuideCore {
    /// Loaded once per session.  `Err` holds the message already published.
    schedule: Result<Schedule, String>,
    resolver: TimeResolver,
    clock: Box<dyn Clock>,
    session: SessionState,
    policy: EmbedPolicy,
    deadzones: Deadzones,
    state_manager: Arc<StateManager>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
}

impl GuideCore {
    pub async fn new(
        config: &Config,
        source: &TimetableSource,
        resolver: TimeResolver,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
    ) -> Self {
        let schedule = timetable::load(source).await.map_err(|e| {
            error!("Timetable load from {} failed: {}", source.describe(), e);
            format!("Unable to load the timetable: {}", e)
        });
        Self::with_schedule(schedule, config, resolver, Box::new(SystemClock), broadcast_tx).await
    }

    pub async fn with_schedule(
        schedule: Result<Schedule, String>,
        config: &Config,
        resolver: TimeResolver,
        clock: Box<dyn Clock>,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
    ) -> Self {
        let simulated = resolver
            .simulated_time()
            .map(|t| format!("{:02}{:02}", t.hour(), t.minute()));
        let state_manager = Arc::new(StateManager::new(simulated));

        if let Err(message) = &schedule {
            state_manager.set_failed(message.clone()).await;
        }

        Self {
            schedule,
            resolver,
            clock,
            session: SessionState::new(),
            policy: EmbedPolicy::new(
                config.policy.external_only_channels.iter().cloned(),
                config.policy.autoplay,
            ),
            deadzones: Deadzones::from(&config.input),
            state_manager,
            broadcast_tx,
        }
    }

    /// Borrow the state manager (for use by the HTTP server).
    pub fn state_manager(&self) -> Arc<StateManager> {
        Arc::clone(&self.state_manager)
    }

    /// Run the core event loop.  Returns when a `Shutdown` event is received
    /// or every sender is gone.
    pub async fn run(mut self, mut event_rx: mpsc::Receiver<GuideEvent>) -> anyhow::Result<()> {
        info!("GuideCore: starting event loop");

        loop {
            match event_rx.recv().await {
                None => {
                    info!("GuideCore: event channel closed, shutting down");
                    break;
                }
                Some(evt) => {
                    if !self.handle_event(evt).await {
                        info!("GuideCore: shutdown requested");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Returns false when the loop should stop.
    async fn handle_event(&mut self, evt: GuideEvent) -> bool {
        match evt {
            GuideEvent::Shutdown => return false,
            GuideEvent::Evaluate => self.evaluate().await,
            GuideEvent::Command(cmd) => {
                debug!("GuideCore: command {:?}", cmd);
                self.handle_command(cmd).await;
            }
        }
        true
    }

    // ── evaluation ────────────────────────────────────────────────────────────

    async fn evaluate(&mut self) {
        let Ok(schedule) = &self.schedule else {
            debug!("GuideCore: no timetable, nothing to evaluate");
            return;
        };
        let moment = self.resolver.resolve_with(self.clock.as_ref());
        let session = std::mem::take(&mut self.session);
        let (session, plan) = evaluate(schedule, moment, session);
        self.session = session;

        if let Some(plan) = plan {
            info!("GuideCore: now {} ({} entries)", plan.moment, plan.slot.len());
            self.publish(&plan).await;
        }
    }

    // ── command handlers ──────────────────────────────────────────────────────

    async fn handle_command(&mut self, cmd: Command) {
        let changed = match cmd {
            Command::Reevaluate => {
                self.evaluate().await;
                return;
            }
            Command::Gesture { gesture } => match self.deadzones.trigger_for(gesture) {
                Some(trigger) => self.session.apply(trigger),
                None => {
                    debug!("GuideCore: {:?} inside deadzone", gesture);
                    false
                }
            },
            Command::Select { index } => {
                let picked = self.session.select(index);
                if !picked {
                    warn!("GuideCore: no entry {} in the current slot", index);
                }
                picked
            }
            Command::ClearSelection => self.session.clear_selection(),
            other => match other.trigger() {
                Some(trigger) => self.session.apply(trigger),
                None => false,
            },
        };

        if changed {
            self.republish().await;
        }
    }

    // ── publishing ────────────────────────────────────────────────────────────

    /// Rebuild the frame for the current slot after a user action.
    async fn republish(&self) {
        let Ok(schedule) = &self.schedule else {
            return;
        };
        if let Some(plan) = self.session.plan(schedule) {
            self.publish(&plan).await;
        }
    }

    async fn publish(&self, plan: &RenderPlan) {
        let Ok(schedule) = &self.schedule else {
            return;
        };
        let frame = RenderFrame::build(plan, schedule, &self.policy);
        self.state_manager.set_frame(frame).await;
        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
    }
}
