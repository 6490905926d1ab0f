//! The game state machine.
//!
//! A [`GameSession`] owns everything with a lifetime tied to one play-through:
//! the target pool, the logical clock, the autoplay driver and the deferred
//! timers. All mutation goes through its operations, which are synchronous
//! and never block; the async engine merely decides *when* to call them.
//!
//! ```text
//! Idle ──start──▶ Playing ──all hit + grace──▶ Cleared
//!                    │  ▲                          │
//!                    │  └──────────start───────────┤
//!                    └──wrong click──▶ GameOver ───┘
//! ```

use crate::common::{SessionId, TimerId};
use crate::components::autoplay::{AutoplayDriver, AutoplayStep};
use crate::components::pool::{Reveal, TargetPool};
use crate::components::timer::{TimerAction, TimerQueue};
use crate::config::{check_point_count, NumrushConfig};
use crate::error::GameError;
use crate::events::{EventBus, GameEvent, SystemEvent};
use crate::time::{Clock, TickEvent};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Banner shown before and at the start of every session.
pub const MESSAGE_READY: &str = "LET'S PLAY";
/// Banner shown once every target was clicked in order.
pub const MESSAGE_CLEARED: &str = "ALL CLEARED";
/// Banner shown after a wrong click.
pub const MESSAGE_GAME_OVER: &str = "GAME OVER";

/// Overall phase of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Playing,
    Cleared,
    GameOver,
}

impl Phase {
    /// `Cleared` and `GameOver` end a session; only `start()` leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Cleared | Phase::GameOver)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::Playing => "playing",
            Phase::Cleared => "cleared",
            Phase::GameOver => "over",
        };
        f.write_str(label)
    }
}

/// What a submitted click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The session was not playing; nothing changed.
    Ignored,
    /// Correct click; `expected_next` moved on.
    Hit { value: u32, expected_next: u32 },
    /// Correct final click; the clear transition is now pending.
    Completed { value: u32 },
    /// Wrong click; the session is over.
    Miss { value: u32, expected: u32 },
}

/// One game, from configuration through any number of restarts.
pub struct GameSession {
    config: NumrushConfig,
    id: SessionId,
    phase: Phase,
    point_count: u32,
    expected_next: u32,
    elapsed: Duration,
    message: String,
    has_started: bool,
    pool: TargetPool,
    clock: Clock,
    autoplay: AutoplayDriver,
    timers: TimerQueue,
    pending_clear: Option<TimerId>,
    rng: Pcg32,
    bus: EventBus,
}

impl GameSession {
    /// Creates an idle session from `config`, publishing on `bus`.
    pub fn new(config: NumrushConfig, bus: EventBus) -> Result<Self, GameError> {
        check_point_count(config.point_count)?;
        let seed = config.seed.unwrap_or_else(rand::random);
        debug!(seed, "placement rng seeded");

        Ok(Self {
            id: SessionId::default(),
            phase: Phase::Idle,
            point_count: config.point_count,
            expected_next: 1,
            elapsed: Duration::ZERO,
            message: MESSAGE_READY.to_string(),
            has_started: false,
            pool: TargetPool::empty(&config.targets),
            clock: Clock::new(config.clock.tick()),
            autoplay: AutoplayDriver::new(config.autoplay.cadence(), config.autoplay.enabled),
            timers: TimerQueue::new(),
            pending_clear: None,
            rng: Pcg32::seed_from_u64(seed),
            bus,
            config,
        })
    }

    /// Sets the number of targets for the next `start()`.
    ///
    /// Rejected while a game is in progress.
    pub fn configure(&mut self, point_count: u32) -> Result<(), GameError> {
        if self.phase == Phase::Playing {
            return Err(GameError::InvalidState {
                operation: "configure",
                phase: self.phase,
            });
        }
        check_point_count(point_count)?;
        self.point_count = point_count;
        debug!(point_count, "point count configured");
        Ok(())
    }

    /// Starts a fresh session, discarding whatever the previous one left.
    ///
    /// Valid from any phase. A start while playing is a full restart, never a
    /// resume.
    pub fn start(&mut self) -> Result<SessionId, GameError> {
        let pool = TargetPool::generate(
            self.point_count,
            &self.config.frame,
            &self.config.targets,
            &mut self.rng,
        )?;

        self.halt_timers();

        self.id = self.id.next();
        self.phase = Phase::Playing;
        self.expected_next = 1;
        self.elapsed = Duration::ZERO;
        self.message = MESSAGE_READY.to_string();
        self.has_started = true;
        self.pool = pool;

        self.clock.reset();
        if self.clock.start() {
            self.bus.emit_system(SystemEvent::ClockStarted { session: self.id });
        }
        if self.autoplay.is_enabled() && self.autoplay.activate() {
            self.bus.emit_system(SystemEvent::AutoplayStarted { session: self.id });
        }

        info!(session = %self.id, point_count = self.point_count, "session started");
        self.bus.emit_game(GameEvent::SessionStarted {
            session: self.id,
            point_count: self.point_count,
            started_at: chrono::Utc::now(),
        });
        Ok(self.id)
    }

    /// Applies a click on `value`.
    ///
    /// Outside `Playing` this is a no-op. Otherwise the click either matches
    /// `expected_next` exactly or ends the game, whether the value is ahead,
    /// behind, already removed or out of range. Once every target is hit,
    /// `expected_next` is past the last value and nothing matches it.
    pub fn submit_click(&mut self, value: u32) -> ClickOutcome {
        if self.phase != Phase::Playing {
            trace!(value, phase = %self.phase, "click ignored");
            return ClickOutcome::Ignored;
        }

        if value != self.expected_next || value > self.point_count {
            let expected = self.expected_next;
            self.pool.reveal(value, Reveal::Miss);
            debug!(session = %self.id, value, expected, "wrong target clicked");
            self.bus.emit_game(GameEvent::TargetMissed {
                session: self.id,
                value,
                expected,
            });
            self.finish(Phase::GameOver, MESSAGE_GAME_OVER);
            return ClickOutcome::Miss { value, expected };
        }

        self.pool.reveal(value, Reveal::Hit);
        self.pool.begin_fade(value);
        self.expected_next += 1;
        debug!(session = %self.id, value, expected_next = self.expected_next, "target hit");
        self.bus.emit_game(GameEvent::TargetHit {
            session: self.id,
            value,
        });

        if self.expected_next <= self.point_count {
            return ClickOutcome::Hit {
                value,
                expected_next: self.expected_next,
            };
        }

        if self.autoplay.deactivate() {
            self.bus.emit_system(SystemEvent::AutoplayStopped { session: self.id });
        }
        let grace = self.config.targets.clear_grace();
        self.pending_clear = Some(self.timers.schedule(self.id, grace, TimerAction::ClearSession));
        info!(session = %self.id, ?grace, "all targets hit; clear pending");
        self.bus.emit_game(GameEvent::AllTargetsHit { session: self.id });
        ClickOutcome::Completed { value }
    }

    /// Feeds a tick from the host clock.
    ///
    /// Ticks from any session but the current one, or arriving after the
    /// clock was stopped, are dropped. Returns whether the tick was applied.
    pub fn handle_tick(&mut self, tick: TickEvent) -> bool {
        if tick.session != self.id {
            trace!(stale = %tick.session, current = %self.id, "stale tick dropped");
            self.bus.emit_system(SystemEvent::StaleTickDropped {
                session: tick.session,
            });
            return false;
        }
        self.advance_clock()
    }

    /// Advances the logical clock by one fixed step, if it is running.
    pub fn advance_clock(&mut self) -> bool {
        match self.clock.advance() {
            Some(delta) => {
                self.on_tick(delta);
                true
            }
            None => false,
        }
    }

    /// Advances game time by `delta`.
    ///
    /// Within one tick the order is fixed: countdown decay, then the sweep of
    /// expired fades, then deferred timers, then the autoplay click.
    pub fn on_tick(&mut self, delta: Duration) {
        if self.phase != Phase::Playing {
            return;
        }
        self.elapsed += delta;

        self.pool.tick(delta);
        for value in self.pool.sweep() {
            self.bus.emit_game(GameEvent::TargetRemoved {
                session: self.id,
                value,
            });
        }

        for fired in self.timers.advance(delta, self.id) {
            match fired.action {
                TimerAction::ClearSession => {
                    self.pending_clear = None;
                    self.finish(Phase::Cleared, MESSAGE_CLEARED);
                }
            }
        }
        if self.phase != Phase::Playing {
            return;
        }

        match self
            .autoplay
            .process_tick(delta, self.expected_next, self.point_count)
        {
            AutoplayStep::Wait => {}
            AutoplayStep::Click(value) => {
                trace!(session = %self.id, value, "autoplay click");
                self.submit_click(value);
            }
            AutoplayStep::Finished => {
                self.bus.emit_system(SystemEvent::AutoplayStopped { session: self.id });
            }
        }
    }

    /// Stores the autoplay preference. While playing, the driver starts or
    /// stops immediately; otherwise it takes effect on the next `start()`.
    pub fn set_autoplay_enabled(&mut self, enabled: bool) {
        self.autoplay.set_enabled(enabled);
        if self.phase != Phase::Playing {
            return;
        }
        if enabled {
            if self.autoplay.activate() {
                self.bus.emit_system(SystemEvent::AutoplayStarted { session: self.id });
            }
        } else if self.autoplay.deactivate() {
            self.bus.emit_system(SystemEvent::AutoplayStopped { session: self.id });
        }
    }

    /// Flips the autoplay preference and returns the new value.
    pub fn toggle_autoplay(&mut self) -> bool {
        let enabled = !self.autoplay.is_enabled();
        self.set_autoplay_enabled(enabled);
        enabled
    }

    fn finish(&mut self, phase: Phase, message: &str) {
        self.phase = phase;
        self.message = message.to_string();
        self.halt_timers();

        info!(session = %self.id, %phase, elapsed = ?self.elapsed, "session ended");
        let event = match phase {
            Phase::Cleared => GameEvent::Cleared {
                session: self.id,
                elapsed: self.elapsed,
            },
            _ => GameEvent::GameOver {
                session: self.id,
                elapsed: self.elapsed,
            },
        };
        self.bus.emit_game(event);
    }

    /// Stops the clock and autoplay and drops every pending timer.
    fn halt_timers(&mut self) {
        if self.clock.stop() {
            self.bus.emit_system(SystemEvent::ClockStopped { session: self.id });
        }
        if self.autoplay.deactivate() {
            self.bus.emit_system(SystemEvent::AutoplayStopped { session: self.id });
        }
        self.timers.cancel_all();
        self.pending_clear = None;
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    pub fn expected_next(&self) -> u32 {
        self.expected_next
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn pool(&self) -> &TargetPool {
        &self.pool
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn autoplay(&self) -> &AutoplayDriver {
        &self.autoplay
    }

    /// Whether the deferred "Cleared" transition is scheduled.
    pub fn clear_pending(&self) -> bool {
        self.pending_clear.is_some_and(|id| self.timers.is_pending(id))
    }

    pub fn config(&self) -> &NumrushConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }
}
