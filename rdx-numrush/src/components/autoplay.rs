//! The autoplay driver: synthesizes correctly-ordered clicks on a cadence.

use std::time::Duration;

/// What the driver wants done on a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoplayStep {
    /// Nothing is due yet, or the driver is inactive.
    Wait,
    /// Submit a click on this value.
    Click(u32),
    /// The sequence is complete; the driver has stopped itself.
    Finished,
}

/// Watches clock time and fires a click every `cadence` while active.
///
/// `enabled` is the user's preference and survives across sessions; `active`
/// tracks whether the cadence timer is actually running right now.
#[derive(Debug, Clone)]
pub struct AutoplayDriver {
    cadence: Duration,
    enabled: bool,
    active: bool,
    since_last: Duration,
}

impl AutoplayDriver {
    pub fn new(cadence: Duration, enabled: bool) -> Self {
        Self {
            cadence,
            enabled,
            active: false,
            since_last: Duration::ZERO,
        }
    }

    /// Stores the preference. Does not start or stop the cadence by itself.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Starts the cadence from zero. Returns `true` if it was not running.
    ///
    /// Activating a running driver leaves its cadence untouched.
    pub fn activate(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.since_last = Duration::ZERO;
        self.active = true;
        true
    }

    /// Stops the cadence. Returns `true` if it was running.
    pub fn deactivate(&mut self) -> bool {
        self.since_last = Duration::ZERO;
        std::mem::replace(&mut self.active, false)
    }

    /// Advances the cadence timer by `delta`.
    ///
    /// Once `expected_next` has moved past `point_count` the driver stops
    /// itself and reports `Finished` instead of clicking.
    pub fn process_tick(&mut self, delta: Duration, expected_next: u32, point_count: u32) -> AutoplayStep {
        if !self.active {
            return AutoplayStep::Wait;
        }
        if expected_next > point_count {
            self.deactivate();
            return AutoplayStep::Finished;
        }
        self.since_last += delta;
        if self.since_last < self.cadence {
            return AutoplayStep::Wait;
        }
        self.since_last -= self.cadence;
        AutoplayStep::Click(expected_next)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(100);

    fn driver() -> AutoplayDriver {
        let mut driver = AutoplayDriver::new(Duration::from_millis(500), true);
        driver.activate();
        driver
    }

    #[test]
    fn clicks_once_per_cadence() {
        let mut driver = driver();
        let steps: Vec<AutoplayStep> = (0..10).map(|_| driver.process_tick(STEP, 1, 5)).collect();
        let clicks = steps
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, AutoplayStep::Click(1)))
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        assert_eq!(clicks, vec![4, 9]);
    }

    #[test]
    fn inactive_driver_waits() {
        let mut driver = AutoplayDriver::new(Duration::from_millis(500), true);
        for _ in 0..20 {
            assert_eq!(driver.process_tick(STEP, 1, 5), AutoplayStep::Wait);
        }
    }

    #[test]
    fn stops_itself_past_the_last_value() {
        let mut driver = driver();
        assert_eq!(driver.process_tick(STEP, 6, 5), AutoplayStep::Finished);
        assert!(!driver.is_active());
        assert!(driver.is_enabled());
        assert_eq!(driver.process_tick(STEP, 6, 5), AutoplayStep::Wait);
    }

    #[test]
    fn reactivation_restarts_the_cadence() {
        let mut driver = driver();
        for _ in 0..4 {
            driver.process_tick(STEP, 1, 5);
        }
        assert!(driver.deactivate());
        assert!(!driver.deactivate());
        assert!(driver.activate());
        for _ in 0..4 {
            assert_eq!(driver.process_tick(STEP, 1, 5), AutoplayStep::Wait);
        }
        assert_eq!(driver.process_tick(STEP, 1, 5), AutoplayStep::Click(1));
    }

    #[test]
    fn activating_a_running_driver_keeps_its_cadence() {
        let mut driver = driver();
        for _ in 0..4 {
            assert_eq!(driver.process_tick(STEP, 1, 5), AutoplayStep::Wait);
        }
        assert!(!driver.activate());
        assert_eq!(driver.process_tick(STEP, 1, 5), AutoplayStep::Click(1));
    }
}
