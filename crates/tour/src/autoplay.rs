//! Autoplay: one recurring timer that advances the tour, paused by user
//! interaction and resumed after a delay.
//!
//! The scheduler never owns more than one tick timer and one resume timer.
//! Every transition that replaces a timer cancels the old one first, so no
//! orphaned timer can advance the tour a second time within an interval.

use foundation::time::TimeMs;
use runtime::TimerId;
use serde::Serialize;
use tracing::debug;

use crate::config::AutoplayConfig;
use crate::timer::{TourTimer, TourTimers};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum AutoplayState {
    Stopped,
    Running,
    PausedPendingResume,
}

#[derive(Debug)]
pub struct AutoplayScheduler {
    config: AutoplayConfig,
    state: AutoplayState,
    tick: Option<TimerId>,
    resume: Option<TimerId>,
    hidden: bool,
    /// Whether autoplay was active when the host went hidden.
    resume_on_visible: bool,
}

impl AutoplayScheduler {
    pub fn new(config: AutoplayConfig) -> Self {
        Self {
            config,
            state: AutoplayState::Stopped,
            tick: None,
            resume: None,
            hidden: false,
            resume_on_visible: false,
        }
    }

    pub fn state(&self) -> AutoplayState {
        self.state
    }

    pub fn config(&self) -> &AutoplayConfig {
        &self.config
    }

    pub fn tick_timer(&self) -> Option<TimerId> {
        self.tick
    }

    pub fn resume_timer(&self) -> Option<TimerId> {
        self.resume
    }

    /// Starts the recurring timer. Idempotent while running.
    pub fn start(&mut self, timers: &mut TourTimers, now: TimeMs) {
        if self.state == AutoplayState::Running {
            return;
        }
        if self.hidden {
            self.resume_on_visible = true;
            return;
        }
        self.cancel_resume(timers);
        self.arm_tick(timers, now);
        self.state = AutoplayState::Running;
        debug!(interval_ms = self.config.interval_ms, "autoplay started");
    }

    pub fn stop(&mut self, timers: &mut TourTimers) {
        self.cancel_tick(timers);
        self.cancel_resume(timers);
        if self.state != AutoplayState::Stopped {
            debug!("autoplay stopped");
        }
        self.state = AutoplayState::Stopped;
    }

    /// Routes an interaction through the pause policy.
    ///
    /// While a resume is already pending the delay restarts from `now`.
    pub fn pause(&mut self, timers: &mut TourTimers, now: TimeMs) {
        if !self.config.pause_on_interaction {
            return;
        }
        match self.state {
            AutoplayState::Running => {
                self.cancel_tick(timers);
                match self.config.resume_delay_ms {
                    Some(delay) => {
                        self.arm_resume(timers, now, delay);
                        self.state = AutoplayState::PausedPendingResume;
                        debug!(resume_delay_ms = delay, "autoplay paused");
                    }
                    None => {
                        self.state = AutoplayState::Stopped;
                        debug!("autoplay paused without resume");
                    }
                }
            }
            AutoplayState::PausedPendingResume => {
                if let Some(delay) = self.config.resume_delay_ms {
                    self.arm_resume(timers, now, delay);
                }
            }
            AutoplayState::Stopped => {}
        }
    }

    /// Handles a fired tick. Returns `true` when the tour should advance.
    pub fn on_tick(&mut self, id: TimerId, timers: &mut TourTimers, now: TimeMs) -> bool {
        if self.tick != Some(id) || self.state != AutoplayState::Running {
            return false;
        }
        self.tick = None;
        self.arm_tick(timers, now);
        true
    }

    /// Handles a fired resume timer. Returns `true` when the tour should
    /// advance immediately.
    pub fn on_resume(&mut self, id: TimerId, timers: &mut TourTimers, now: TimeMs) -> bool {
        if self.resume != Some(id) || self.state != AutoplayState::PausedPendingResume {
            return false;
        }
        self.resume = None;
        if !self.config.enabled {
            self.state = AutoplayState::Stopped;
            return false;
        }
        self.start(timers, now);
        true
    }

    pub fn set_visible(&mut self, visible: bool, timers: &mut TourTimers, now: TimeMs) {
        if !visible {
            if self.hidden {
                return;
            }
            self.resume_on_visible = self.state != AutoplayState::Stopped;
            self.stop(timers);
            self.hidden = true;
            return;
        }

        if !self.hidden {
            return;
        }
        self.hidden = false;
        if std::mem::take(&mut self.resume_on_visible) && self.config.enabled {
            self.start(timers, now);
        }
    }

    /// Replaces the configuration without arming or cancelling anything.
    pub fn set_config(&mut self, config: AutoplayConfig) {
        self.config = config;
    }

    /// Applies a new configuration.
    ///
    /// A running scheduler gets exactly one fresh tick timer on the new
    /// interval. A pending resume is kept as armed. A stopped scheduler
    /// starts again when the new configuration is enabled.
    pub fn reconfigure(&mut self, config: AutoplayConfig, timers: &mut TourTimers, now: TimeMs) {
        self.config = config;

        if !self.config.enabled {
            self.stop(timers);
            self.resume_on_visible = false;
            return;
        }

        match self.state {
            AutoplayState::Running => {
                self.cancel_tick(timers);
                self.arm_tick(timers, now);
            }
            AutoplayState::PausedPendingResume => {}
            AutoplayState::Stopped => self.start(timers, now),
        }
    }

    /// Forgets all timers without touching the queue, used after the queue
    /// itself has been cleared.
    pub fn reset(&mut self) {
        self.tick = None;
        self.resume = None;
        self.state = AutoplayState::Stopped;
        self.resume_on_visible = false;
    }

    fn arm_tick(&mut self, timers: &mut TourTimers, now: TimeMs) {
        self.cancel_tick(timers);
        let interval = self.config.interval_ms.max(1) as f64;
        self.tick = Some(timers.schedule_after(now, interval, TourTimer::AutoplayTick));
    }

    fn arm_resume(&mut self, timers: &mut TourTimers, now: TimeMs, delay_ms: u64) {
        self.cancel_resume(timers);
        self.resume = Some(timers.schedule_after(now, delay_ms as f64, TourTimer::AutoplayResume));
    }

    fn cancel_tick(&mut self, timers: &mut TourTimers) {
        if let Some(id) = self.tick.take() {
            timers.cancel(id);
        }
    }

    fn cancel_resume(&mut self, timers: &mut TourTimers) {
        if let Some(id) = self.resume.take() {
            timers.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(resume_delay_ms: Option<u64>) -> AutoplayConfig {
        AutoplayConfig {
            enabled: true,
            interval_ms: 5000,
            pause_on_interaction: true,
            resume_delay_ms,
        }
    }

    /// Drives the queue up to `until`, returning the times at which the
    /// scheduler asked to advance.
    fn run(
        sched: &mut AutoplayScheduler,
        timers: &mut TourTimers,
        until: f64,
    ) -> Vec<f64> {
        let mut advances = Vec::new();
        while let Some(fired) = timers.pop_due(TimeMs(until)) {
            let now = fired.deadline;
            let advance = match fired.payload {
                TourTimer::AutoplayTick => sched.on_tick(fired.id, timers, now),
                TourTimer::AutoplayResume => sched.on_resume(fired.id, timers, now),
                _ => false,
            };
            if advance {
                advances.push(now.0);
            }
        }
        advances
    }

    #[test]
    fn ticks_once_per_interval() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(None));
        sched.start(&mut timers, TimeMs(0.0));
        assert_eq!(run(&mut sched, &mut timers, 15_000.0), vec![5000.0, 10_000.0, 15_000.0]);
    }

    #[test]
    fn double_start_keeps_a_single_timer() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(None));
        sched.start(&mut timers, TimeMs(0.0));
        sched.start(&mut timers, TimeMs(1000.0));
        assert_eq!(timers.len(), 1);
        assert_eq!(run(&mut sched, &mut timers, 10_000.0), vec![5000.0, 10_000.0]);
    }

    #[test]
    fn interaction_pauses_until_resume_delay() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(Some(60_000)));
        sched.start(&mut timers, TimeMs(0.0));
        assert_eq!(run(&mut sched, &mut timers, 12_000.0), vec![5000.0, 10_000.0]);

        sched.pause(&mut timers, TimeMs(12_000.0));
        assert_eq!(sched.state(), AutoplayState::PausedPendingResume);
        assert!(run(&mut sched, &mut timers, 71_999.0).is_empty());

        assert_eq!(run(&mut sched, &mut timers, 72_000.0), vec![72_000.0]);
        assert_eq!(sched.state(), AutoplayState::Running);
        assert_eq!(run(&mut sched, &mut timers, 77_000.0), vec![77_000.0]);
    }

    #[test]
    fn pause_without_resume_delay_stops() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(None));
        sched.start(&mut timers, TimeMs(0.0));
        sched.pause(&mut timers, TimeMs(100.0));
        assert_eq!(sched.state(), AutoplayState::Stopped);
        assert!(timers.is_empty());
    }

    #[test]
    fn pause_is_ignored_when_interaction_does_not_pause() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(AutoplayConfig {
            pause_on_interaction: false,
            ..config(Some(1000))
        });
        sched.start(&mut timers, TimeMs(0.0));
        sched.pause(&mut timers, TimeMs(100.0));
        assert_eq!(sched.state(), AutoplayState::Running);
    }

    #[test]
    fn repeated_interaction_restarts_resume_delay() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(Some(1000)));
        sched.start(&mut timers, TimeMs(0.0));
        sched.pause(&mut timers, TimeMs(100.0));
        sched.pause(&mut timers, TimeMs(900.0));
        assert_eq!(timers.len(), 1);
        assert!(run(&mut sched, &mut timers, 1800.0).is_empty());
        assert_eq!(run(&mut sched, &mut timers, 1900.0), vec![1900.0]);
    }

    #[test]
    fn stop_cancels_everything() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(Some(1000)));
        sched.start(&mut timers, TimeMs(0.0));
        sched.pause(&mut timers, TimeMs(10.0));
        sched.stop(&mut timers);
        assert!(timers.is_empty());
        assert_eq!(sched.state(), AutoplayState::Stopped);
    }

    #[test]
    fn hidden_then_visible_restores_running() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(None));
        sched.start(&mut timers, TimeMs(0.0));

        sched.set_visible(false, &mut timers, TimeMs(1000.0));
        assert_eq!(sched.state(), AutoplayState::Stopped);
        assert!(timers.is_empty());

        sched.set_visible(true, &mut timers, TimeMs(2000.0));
        assert_eq!(sched.state(), AutoplayState::Running);
        assert_eq!(run(&mut sched, &mut timers, 7000.0), vec![7000.0]);
    }

    #[test]
    fn visible_does_not_start_when_previously_stopped() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(None));
        sched.set_visible(false, &mut timers, TimeMs(0.0));
        sched.set_visible(true, &mut timers, TimeMs(10.0));
        assert_eq!(sched.state(), AutoplayState::Stopped);
    }

    #[test]
    fn visible_does_not_start_when_disabled_meanwhile() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(None));
        sched.start(&mut timers, TimeMs(0.0));
        sched.set_visible(false, &mut timers, TimeMs(10.0));
        sched.reconfigure(
            AutoplayConfig {
                enabled: false,
                ..config(None)
            },
            &mut timers,
            TimeMs(20.0),
        );
        sched.set_visible(true, &mut timers, TimeMs(30.0));
        assert_eq!(sched.state(), AutoplayState::Stopped);
    }

    #[test]
    fn reconfigure_replaces_the_tick_timer() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(None));
        sched.start(&mut timers, TimeMs(0.0));
        for t in [100.0, 200.0, 300.0] {
            sched.reconfigure(
                AutoplayConfig {
                    interval_ms: 1000,
                    ..config(None)
                },
                &mut timers,
                TimeMs(t),
            );
        }
        assert_eq!(timers.len(), 1);
        assert_eq!(run(&mut sched, &mut timers, 2300.0), vec![1300.0, 2300.0]);
    }

    #[test]
    fn reconfigure_keeps_pending_resume() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(Some(1000)));
        sched.start(&mut timers, TimeMs(0.0));
        sched.pause(&mut timers, TimeMs(0.0));
        let resume = sched.resume_timer().unwrap();

        sched.reconfigure(
            AutoplayConfig {
                interval_ms: 2000,
                ..config(Some(1000))
            },
            &mut timers,
            TimeMs(500.0),
        );
        assert_eq!(sched.resume_timer(), Some(resume));
        assert!(timers.is_pending(resume));
        assert_eq!(run(&mut sched, &mut timers, 3000.0), vec![1000.0, 3000.0]);
    }

    #[test]
    fn hiding_while_paused_drops_the_resume_and_showing_runs_again() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(Some(60_000)));
        sched.start(&mut timers, TimeMs(0.0));
        sched.pause(&mut timers, TimeMs(1000.0));
        let resume = sched.resume_timer().unwrap();

        sched.set_visible(false, &mut timers, TimeMs(2000.0));
        assert_eq!(sched.state(), AutoplayState::Stopped);
        assert!(!timers.is_pending(resume));
        assert!(timers.is_empty());

        sched.set_visible(true, &mut timers, TimeMs(3000.0));
        assert_eq!(sched.state(), AutoplayState::Running);
        assert_eq!(sched.resume_timer(), None);
        assert_eq!(run(&mut sched, &mut timers, 61_000.0)[0], 8000.0);
    }

    #[test]
    fn pause_while_stopped_changes_nothing() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(Some(1000)));
        sched.pause(&mut timers, TimeMs(10.0));
        assert_eq!(sched.state(), AutoplayState::Stopped);
        assert!(timers.is_empty());
    }

    #[test]
    fn reconfigure_restarts_a_stopped_scheduler() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(None));
        sched.start(&mut timers, TimeMs(0.0));
        sched.pause(&mut timers, TimeMs(100.0));
        assert_eq!(sched.state(), AutoplayState::Stopped);

        sched.reconfigure(config(None), &mut timers, TimeMs(200.0));
        assert_eq!(sched.state(), AutoplayState::Running);
        assert_eq!(run(&mut sched, &mut timers, 5200.0), vec![5200.0]);
    }

    #[test]
    fn set_config_arms_nothing() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(AutoplayConfig {
            enabled: false,
            ..config(None)
        });
        sched.set_config(config(None));
        assert_eq!(sched.state(), AutoplayState::Stopped);
        assert!(timers.is_empty());
        assert!(sched.config().enabled);
        sched.start(&mut timers, TimeMs(0.0));
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn stale_tick_ids_are_ignored() {
        let mut timers = TourTimers::new();
        let mut sched = AutoplayScheduler::new(config(None));
        sched.start(&mut timers, TimeMs(0.0));
        let stale = sched.tick_timer().unwrap();
        sched.stop(&mut timers);
        assert!(!sched.on_tick(stale, &mut timers, TimeMs(5000.0)));
    }
}
