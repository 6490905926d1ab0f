//! Defines all configuration structures for the numrush engine.
//!
//! These structs are designed to be deserialized from a configuration file
//! (e.g., a TOML file) using `serde`. Every field has a default, so an empty
//! file, a missing file, or no file at all all yield a playable setup. The
//! clock step, autoplay cadence, fade timings and frame geometry can then be
//! tuned externally from the application code.

use crate::error::GameError;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Upper bound on the number of targets in one session.
pub const MAX_POINT_COUNT: u32 = 1_000;

/// Checks that `point_count` is within `1..=MAX_POINT_COUNT`.
pub fn check_point_count(point_count: u32) -> Result<(), GameError> {
    if (1..=MAX_POINT_COUNT).contains(&point_count) {
        Ok(())
    } else {
        Err(GameError::InvalidConfig { point_count })
    }
}

/// The top-level configuration for the `NumrushEngine`.
///
/// This struct is the entry point for all engine settings. It is typically
/// loaded with [`NumrushConfig::load`] at application startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NumrushConfig {
    /// How many numbered targets a new session generates.
    pub point_count: u32,

    /// Seed for target placement. `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,

    /// Settings for the fixed-step session clock.
    pub clock: ClockConfig,

    /// Settings for the autoplay driver.
    pub autoplay: AutoplayConfig,

    /// Target fade and removal timings.
    pub targets: TargetConfig,

    /// How target positions are fitted into the play frame.
    pub frame: FramePolicy,
}

/// Defines the step of the session clock.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Milliseconds between ticks. Each tick also advances game time by
    /// exactly this amount, independent of scheduler jitter.
    pub tick_ms: u64,
}

/// Defines the autoplay preference and cadence.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AutoplayConfig {
    /// Whether autoplay is switched on before the first game.
    pub enabled: bool,
    /// Milliseconds between synthesized clicks.
    pub cadence_ms: u64,
}

/// Timings for the cosmetic lifecycle of a clicked target.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Countdown shown on a target once it has been clicked.
    pub fade_display_secs: f64,
    /// Time from the start of a fade until the target is swept away.
    pub removal_delay_ms: u64,
    /// Delay between the final correct click and the "Cleared" transition.
    pub clear_grace_ms: u64,
}

/// Describes the play frame that target positions must fit inside.
///
/// Both variants reduce to a maximum x/y fraction: a target placed at that
/// fraction still has its whole footprint inside the frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FramePolicy {
    /// Positions are raw fractions capped at `max_fraction` on both axes.
    Fractional { max_fraction: f64 },
    /// A fixed frame of `width` x `height` units holding targets of
    /// `target_size` units across.
    Fixed {
        width: f64,
        height: f64,
        target_size: f64,
    },
}

impl FramePolicy {
    /// Returns the largest x and y fraction a target may be placed at.
    pub fn max_fractions(&self) -> (f64, f64) {
        match *self {
            FramePolicy::Fractional { max_fraction } => {
                let f = max_fraction.clamp(0.0, 1.0);
                (f, f)
            }
            FramePolicy::Fixed {
                width,
                height,
                target_size,
            } => (
                fit_fraction(width, target_size),
                fit_fraction(height, target_size),
            ),
        }
    }
}

fn fit_fraction(extent: f64, target_size: f64) -> f64 {
    if extent <= 0.0 {
        return 0.0;
    }
    ((extent - target_size) / extent).clamp(0.0, 1.0)
}

impl NumrushConfig {
    /// Loads configuration from defaults, an optional TOML file and the
    /// environment, in that order of precedence (later wins).
    ///
    /// Environment keys use the `NUMRUSH_` prefix and `__` between nested
    /// sections, e.g. `NUMRUSH_POINT_COUNT=8` or `NUMRUSH_AUTOPLAY__ENABLED=true`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("NUMRUSH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let cfg: NumrushConfig = builder
            .build()
            .context("failed to read numrush configuration")?
            .try_deserialize()
            .context("failed to parse numrush configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        check_point_count(self.point_count)?;
        if self.clock.tick_ms == 0 {
            bail!("clock.tick_ms must be positive");
        }
        if self.autoplay.cadence_ms == 0 {
            bail!("autoplay.cadence_ms must be positive");
        }
        if !(self.targets.fade_display_secs.is_finite() && self.targets.fade_display_secs >= 0.0) {
            bail!("targets.fade_display_secs must be non-negative");
        }
        if self.targets.removal_delay_ms == 0 {
            bail!("targets.removal_delay_ms must be positive");
        }
        if self.targets.clear_grace_ms == 0 {
            bail!("targets.clear_grace_ms must be positive");
        }
        Ok(())
    }
}

impl ClockConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl AutoplayConfig {
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }
}

impl TargetConfig {
    pub fn removal_delay(&self) -> Duration {
        Duration::from_millis(self.removal_delay_ms)
    }

    pub fn clear_grace(&self) -> Duration {
        Duration::from_millis(self.clear_grace_ms)
    }
}

// --- Default values ---

impl Default for NumrushConfig {
    fn default() -> Self {
        Self {
            point_count: 5,
            seed: None,
            clock: ClockConfig::default(),
            autoplay: AutoplayConfig::default(),
            targets: TargetConfig::default(),
            frame: FramePolicy::default(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { tick_ms: 100 }
    }
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cadence_ms: 500,
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            fade_display_secs: 3.0,
            removal_delay_ms: 1000,
            clear_grace_ms: 500,
        }
    }
}

impl Default for FramePolicy {
    fn default() -> Self {
        FramePolicy::Fractional { max_fraction: 0.8 }
    }
}
