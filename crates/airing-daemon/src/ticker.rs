//! TokioScheduler: drives `HourlyScheduler` with tokio timers.
//!
//! Every firing is an `Evaluate` event sent into the core loop; the loop
//! decides whether anything actually changed.
use std::time::Duration;

use airing_proto::scheduler::Scheduler;
use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::core::GuideEvent;

pub struct TokioScheduler {
    event_tx: mpsc::Sender<GuideEvent>,
    /// Deadline of the last one-shot; the periodic timer starts from here.
    anchor: Option<Instant>,
    tasks: Vec<JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(event_tx: mpsc::Sender<GuideEvent>) -> Self {
        Self {
            event_tx,
            anchor: None,
            tasks: Vec::new(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn run_now(&mut self) {
        if let Err(e) = self.event_tx.try_send(GuideEvent::Evaluate) {
            warn!("Ticker: immediate evaluation dropped: {}", e);
        }
    }

    fn schedule_at(&mut self, instant: DateTime<Local>) {
        let delay = (instant - Local::now()).to_std().unwrap_or(Duration::ZERO);
        let deadline = Instant::now() + delay;
        self.anchor = Some(deadline);

        let tx = self.event_tx.clone();
        self.tasks.push(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            debug!("Ticker: boundary reached");
            let _ = tx.send(GuideEvent::Evaluate).await;
        }));
    }

    fn schedule_every(&mut self, period: Duration) {
        let start = self.anchor.unwrap_or_else(Instant::now) + period;
        let tx = self.event_tx.clone();
        self.tasks.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                debug!("Ticker: periodic tick");
                if tx.send(GuideEvent::Evaluate).await.is_err() {
                    break;
                }
            }
        }));
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airing_proto::scheduler::HourlyScheduler;

    async fn expect_evaluate(rx: &mut mpsc::Receiver<GuideEvent>) {
        let evt = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for tick");
        assert!(matches!(evt, Some(GuideEvent::Evaluate)));
    }

    #[tokio::test]
    async fn test_run_now_is_immediate() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut ticker = TokioScheduler::new(tx);
        ticker.run_now();
        assert!(matches!(rx.try_recv(), Ok(GuideEvent::Evaluate)));
    }

    #[tokio::test]
    async fn test_one_shot_then_period() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut ticker = TokioScheduler::new(tx);
        ticker.schedule_at(Local::now() + chrono::Duration::milliseconds(50));
        ticker.schedule_every(Duration::from_millis(50));

        assert!(rx.try_recv().is_err());
        expect_evaluate(&mut rx).await;
        expect_evaluate(&mut rx).await;
        expect_evaluate(&mut rx).await;
    }

    #[tokio::test]
    async fn test_past_instant_fires_right_away() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut ticker = TokioScheduler::new(tx);
        ticker.schedule_at(Local::now() - chrono::Duration::seconds(30));
        expect_evaluate(&mut rx).await;
    }

    #[tokio::test]
    async fn test_simulated_start_schedules_nothing_periodic() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut ticker = TokioScheduler::new(tx);
        HourlyScheduler::new(Duration::ZERO, Duration::from_millis(10)).start(
            Local::now(),
            true,
            &mut ticker,
        );
        expect_evaluate(&mut rx).await;
        assert!(ticker.tasks.is_empty());
        let quiet = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(quiet.is_err());
    }

    #[tokio::test]
    async fn test_drop_aborts_timers() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut ticker = TokioScheduler::new(tx);
        ticker.schedule_every(Duration::from_millis(10));
        drop(ticker);
        // Every sender is gone once the aborted task is dropped.
        tokio::time::timeout(Duration::from_secs(2), async {
            while rx.recv().await.is_some() {}
        })
        .await
        .expect("channel should close");
    }
}
