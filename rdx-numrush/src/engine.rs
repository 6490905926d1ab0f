//! The async engine that hosts a game session.
//!
//! The session itself is synchronous. The engine gives it a home on a single
//! dispatcher task: inbound commands and clock ticks are multiplexed through
//! one `select!` loop, so no two operations ever touch the session at the same
//! time. After every mutation the dispatcher keeps the host clock in step with
//! the session's phase and republishes the snapshot.

use crate::common::SessionId;
use crate::config::NumrushConfig;
use crate::error::GameError;
use crate::events::{EventBus, GameEvent, SystemEvent};
use crate::game::{ClickOutcome, GameSession};
use crate::snapshot::Snapshot;
use crate::time::{ClockHandle, SystemClock, TickEvent};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

const COMMAND_CAPACITY: usize = 64;
const TICK_CAPACITY: usize = 256;
const EVENT_CAPACITY: usize = 256;

/// Inbound requests from the presentation layer.
#[doc(hidden)]
enum Command {
    Configure {
        point_count: u32,
        reply: oneshot::Sender<Result<(), GameError>>,
    },
    Start {
        reply: oneshot::Sender<Result<SessionId, GameError>>,
    },
    Click {
        value: u32,
        reply: oneshot::Sender<ClickOutcome>,
    },
    SetAutoplay {
        enabled: bool,
        reply: oneshot::Sender<()>,
    },
    ToggleAutoplay {
        reply: oneshot::Sender<bool>,
    },
}

/// Handle to a running numrush engine.
///
/// This is the boundary the presentation layer talks to: it submits events
/// and reads snapshots. The handle is cheap to clone; every clone drives the
/// same session.
#[derive(Clone)]
pub struct NumrushEngine {
    command_sender: mpsc::Sender<Command>,
    snapshot_receiver: watch::Receiver<Snapshot>,
    shutdown_sender: broadcast::Sender<()>,
    bus: EventBus,
}

impl NumrushEngine {
    /// Creates the session and spawns its dispatcher on the current tokio
    /// runtime.
    ///
    /// Fails with `InvalidConfig` if the configured point count is zero.
    pub fn start(config: NumrushConfig) -> Result<Self, GameError> {
        let bus = EventBus::new(EVENT_CAPACITY);
        let tick_period = config.clock.tick();
        let session = GameSession::new(config, bus.clone())?;

        let (command_sender, command_receiver) = mpsc::channel(COMMAND_CAPACITY);
        let (tick_sender, tick_receiver) = mpsc::channel(TICK_CAPACITY);
        let (snapshot_sender, snapshot_receiver) = watch::channel(session.snapshot());
        let (shutdown_sender, shutdown_receiver) = broadcast::channel(1);

        let dispatcher = Dispatcher {
            session,
            tick_period,
            command_receiver,
            tick_sender,
            tick_receiver,
            clock: None,
            snapshot_sender,
            bus: bus.clone(),
        };
        tokio::spawn(dispatcher.run(shutdown_receiver));
        info!("NumrushEngine started");

        Ok(Self {
            command_sender,
            snapshot_receiver,
            shutdown_sender,
            bus,
        })
    }

    /// Sets the number of targets for the next game.
    pub async fn configure(&self, point_count: u32) -> Result<(), GameError> {
        self.request(|reply| Command::Configure { point_count, reply })
            .await?
    }

    /// Starts a new game, or restarts the current one from scratch.
    pub async fn start_game(&self) -> Result<SessionId, GameError> {
        self.request(|reply| Command::Start { reply }).await?
    }

    /// Submits a click on the target holding `value`.
    pub async fn click(&self, value: u32) -> Result<ClickOutcome, GameError> {
        self.request(|reply| Command::Click { value, reply }).await
    }

    /// Stores the autoplay preference, starting or stopping the driver at once
    /// if a game is in progress.
    pub async fn set_autoplay_enabled(&self, enabled: bool) -> Result<(), GameError> {
        self.request(|reply| Command::SetAutoplay { enabled, reply })
            .await
    }

    /// Flips the autoplay preference and returns the new value.
    pub async fn toggle_autoplay(&self) -> Result<bool, GameError> {
        self.request(|reply| Command::ToggleAutoplay { reply }).await
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_receiver.borrow().clone()
    }

    /// A receiver that is notified whenever the snapshot changes.
    pub fn watch_snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_receiver.clone()
    }

    /// Subscribes to the `GameEvent` stream.
    pub fn subscribe_game_events(&self) -> broadcast::Receiver<GameEvent> {
        self.bus.subscribe_game_events()
    }

    /// Subscribes to the `SystemEvent` stream.
    pub fn subscribe_system_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.bus.subscribe_system_events()
    }

    /// Stops the dispatcher and waits until it has exited.
    pub async fn shutdown(&self) {
        if self.shutdown_sender.send(()).is_err() {
            debug!("dispatcher already gone");
        }
        self.command_sender.closed().await;
    }

    /// Runs until Ctrl+C, then shuts the engine down.
    pub async fn run_until_ctrl_c(&self) -> anyhow::Result<()> {
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received.");
        self.shutdown().await;
        Ok(())
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, GameError> {
        let (reply, response) = oneshot::channel();
        self.command_sender
            .send(command(reply))
            .await
            .map_err(|_| GameError::EngineStopped)?;
        response.await.map_err(|_| GameError::EngineStopped)
    }
}

/// Owns the session and everything that may mutate it.
#[doc(hidden)]
struct Dispatcher {
    session: GameSession,
    tick_period: Duration,
    command_receiver: mpsc::Receiver<Command>,
    tick_sender: mpsc::Sender<TickEvent>,
    tick_receiver: mpsc::Receiver<TickEvent>,
    clock: Option<ClockHandle>,
    snapshot_sender: watch::Sender<Snapshot>,
    bus: EventBus,
}

impl Dispatcher {
    async fn run(mut self, mut shutdown_receiver: broadcast::Receiver<()>) {
        self.bus.emit_system(SystemEvent::EngineStarted);
        loop {
            tokio::select! {
                biased;
                _ = shutdown_receiver.recv() => break,
                command = self.command_receiver.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(tick) = self.tick_receiver.recv() => {
                    if self.session.handle_tick(tick) {
                        self.settle();
                    }
                }
            }
        }

        if let Some(clock) = self.clock.take() {
            clock.stop();
        }
        self.bus.emit_system(SystemEvent::EngineShutdown);
        info!("NumrushEngine has shut down.");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Configure { point_count, reply } => {
                let result = self.session.configure(point_count);
                if let Err(err) = &result {
                    warn!(%err, "configure rejected");
                }
                self.settle();
                reply.send(result).ok();
            }
            Command::Start { reply } => {
                let result = self.session.start();
                if let Err(err) = &result {
                    warn!(%err, "start rejected");
                }
                self.settle();
                reply.send(result).ok();
            }
            Command::Click { value, reply } => {
                let outcome = self.session.submit_click(value);
                self.settle();
                reply.send(outcome).ok();
            }
            Command::SetAutoplay { enabled, reply } => {
                self.session.set_autoplay_enabled(enabled);
                self.settle();
                reply.send(()).ok();
            }
            Command::ToggleAutoplay { reply } => {
                let enabled = self.session.toggle_autoplay();
                self.settle();
                reply.send(enabled).ok();
            }
        }
    }

    /// Brings the host clock in line with the session, then publishes.
    fn settle(&mut self) {
        self.sync_clock();
        let next = self.session.snapshot();
        self.snapshot_sender.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    /// Runs a host clock exactly while the session's logical clock runs, and
    /// only ever for the current session.
    fn sync_clock(&mut self) {
        let wanted = self
            .session
            .clock()
            .is_running()
            .then(|| self.session.id());
        let running = self.clock.as_ref().map(ClockHandle::session);
        if wanted == running {
            return;
        }
        if let Some(clock) = self.clock.take() {
            debug!(session = %clock.session(), "stopping host clock");
            clock.stop();
        }
        if let Some(session) = wanted {
            debug!(%session, period = ?self.tick_period, "starting host clock");
            let clock = SystemClock::new(self.tick_period, session, self.tick_sender.clone());
            self.clock = Some(clock.spawn());
        }
    }
}
