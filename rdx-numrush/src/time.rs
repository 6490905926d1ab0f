//! Time sources for the engine.
//!
//! Two layers live here:
//!
//! - [`Clock`] is the logical, fixed-step clock a `GameSession` owns. It knows
//!   whether it is running and hands out a constant delta per tick, which keeps
//!   countdown arithmetic deterministic.
//! - [`SystemClock`] is the host scheduling primitive: a tokio task that wakes
//!   on a fixed period and emits [`TickEvent`]s tagged with the session that
//!   started it. The engine feeds those ticks back into the logical clock.

use crate::common::SessionId;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// A single beat emitted by a running `SystemClock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    /// The session whose clock produced this tick.
    pub session: SessionId,
    /// Ticks emitted by this clock so far, starting at 1.
    pub tick_count: u64,
}

/// The logical, fixed-step session clock.
///
/// Starting a running clock and stopping a stopped clock are both no-ops.
#[derive(Debug, Clone)]
pub struct Clock {
    step: Duration,
    running: bool,
    tick_count: u64,
}

impl Clock {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            running: false,
            tick_count: 0,
        }
    }

    /// Starts the clock. Returns `true` if it was not already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Stops the clock. Returns `true` if it was running.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    /// Clears the tick counter, leaving the running state untouched.
    pub fn reset(&mut self) {
        self.tick_count = 0;
    }

    /// Consumes one tick, returning the fixed delta, or `None` when stopped.
    pub fn advance(&mut self) -> Option<Duration> {
        if !self.running {
            return None;
        }
        self.tick_count += 1;
        Some(self.step)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

/// A periodic ticker that runs as an independent asynchronous task.
pub struct SystemClock {
    period: Duration,
    session: SessionId,
    tick_sender: mpsc::Sender<TickEvent>,
}

impl SystemClock {
    pub fn new(period: Duration, session: SessionId, tick_sender: mpsc::Sender<TickEvent>) -> Self {
        Self {
            period,
            session,
            tick_sender,
        }
    }

    /// Spawns the clock loop and returns a handle that stops it.
    pub fn spawn(self) -> ClockHandle {
        let session = self.session;
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(stop_rx));
        ClockHandle {
            session,
            stop_tx: Some(stop_tx),
            task,
        }
    }

    /// Ticks every `period` until `stop_rx` resolves or the receiver is gone.
    ///
    /// The first tick arrives one full period after start.
    pub async fn run(self, mut stop_rx: oneshot::Receiver<()>) {
        debug!(session = %self.session, period = ?self.period, "system clock started");
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick_count = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {
                    tick_count += 1;
                    trace!(session = %self.session, tick_count, "tick");
                    let tick = TickEvent { session: self.session, tick_count };
                    if self.tick_sender.send(tick).await.is_err() {
                        break;
                    }
                }
            }
        }
        debug!(session = %self.session, tick_count, "system clock stopped");
    }
}

/// Owner's handle to a spawned `SystemClock`.
pub struct ClockHandle {
    session: SessionId,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ClockHandle {
    /// The session this clock ticks for.
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Signals the clock task to exit. Ticks it already queued are left for
    /// the consumer to discard.
    pub fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            stop_tx.send(()).ok();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ClockHandle {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            stop_tx.send(()).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut clock = Clock::new(Duration::from_millis(100));
        assert!(clock.start());
        assert!(!clock.start());
        assert!(clock.stop());
        assert!(!clock.stop());
    }

    #[test]
    fn stopped_clock_yields_no_ticks() {
        let mut clock = Clock::new(Duration::from_millis(100));
        assert_eq!(clock.advance(), None);
        clock.start();
        assert_eq!(clock.advance(), Some(Duration::from_millis(100)));
        assert_eq!(clock.advance(), Some(Duration::from_millis(100)));
        assert_eq!(clock.tick_count(), 2);
        clock.stop();
        assert_eq!(clock.advance(), None);
        assert_eq!(clock.tick_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn system_clock_ticks_on_its_period_until_stopped() {
        let (tx, mut rx) = mpsc::channel(16);
        let handle = SystemClock::new(Duration::from_millis(100), SessionId(3), tx).spawn();

        tokio::time::sleep(Duration::from_millis(350)).await;
        let mut received = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            received.push(tick);
        }
        assert_eq!(received.len(), 3);
        assert!(received.iter().all(|t| t.session == SessionId(3)));
        assert_eq!(received.last().map(|t| t.tick_count), Some(3));

        handle.stop();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(rx.try_recv().is_err());
    }
}
