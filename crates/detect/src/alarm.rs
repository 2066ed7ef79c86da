//! Alarm policies: turn per-frame motion readings into alerts.
//!
//! Two policies exist and exactly one is active per run, picked by
//! `alarm.policy` in the configuration:
//!
//! - [`EdgePolicy`] alerts once when motion starts and once when the scene
//!   has been quiet for a grace period.
//! - [`CounterPolicy`] integrates motion into a counter and alerts when it
//!   crosses a trigger, rate-limited by a global cooldown.
//!
//! Both keep their state in a plain `Copy` struct advanced by a pure
//! transition function, so the monitor owns all mutable state.

use vigil_common::config::{AlarmConfig, PolicyKind};

/// A per-frame motion reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEvent {
    pub motion: bool,
    /// Monotonic seconds since the monitor clock epoch.
    pub at_secs: f64,
    /// Binarized difference sum behind the reading.
    pub changed: u64,
}

impl MotionEvent {
    pub fn new(motion: bool, at_secs: f64) -> Self {
        Self {
            motion,
            at_secs,
            changed: 0,
        }
    }
}

/// What the alarm wants the notifier to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    /// Motion began after a quiet period.
    MotionStarted,
    /// The scene has been quiet for the grace period.
    MotionStopped,
    /// Motion persisted long enough to cross the counter trigger.
    MotionSustained,
}

/// A debouncing policy fed one [`MotionEvent`] per analysed frame.
pub trait AlarmPolicy: Send {
    /// Advance the state and return an alert if one is due.
    fn observe(&mut self, event: MotionEvent) -> Option<Alert>;

    /// Return to the clean initial state.
    fn reset(&mut self);

    /// Whether the policy currently considers the scene alarmed.
    fn is_alarmed(&self) -> bool;

    /// Policy name for logging.
    fn name(&self) -> &'static str;
}

/// Build the policy selected in the configuration.
pub fn policy_from_config(config: &AlarmConfig) -> Box<dyn AlarmPolicy> {
    match config.policy {
        PolicyKind::Edge => Box::new(EdgePolicy::new(config.stop_grace_secs)),
        PolicyKind::Counter => Box::new(CounterPolicy::new(
            config.counter_trigger,
            config.cooldown_secs,
        )),
    }
}

// Edge policy

/// State of the start/stop edge detector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AlarmState {
    pub motion_detected: bool,
    pub last_motion_secs: Option<f64>,
    pub stop_notified: bool,
}

/// Alerts on the rising edge of motion and after a quiet grace period.
#[derive(Debug, Clone)]
pub struct EdgePolicy {
    stop_grace_secs: f64,
    state: AlarmState,
}

impl EdgePolicy {
    pub fn new(stop_grace_secs: f64) -> Self {
        Self {
            stop_grace_secs,
            state: AlarmState::default(),
        }
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }
}

/// Pure edge-policy transition.
pub fn edge_transition(
    state: AlarmState,
    event: MotionEvent,
    stop_grace_secs: f64,
) -> (AlarmState, Option<Alert>) {
    if event.motion {
        if state.motion_detected {
            let next = AlarmState {
                last_motion_secs: Some(event.at_secs),
                ..state
            };
            return (next, None);
        }
        let next = AlarmState {
            motion_detected: true,
            last_motion_secs: Some(event.at_secs),
            stop_notified: false,
        };
        return (next, Some(Alert::MotionStarted));
    }

    let quiet_for = state
        .last_motion_secs
        .map(|last| event.at_secs - last)
        .unwrap_or(0.0);

    if state.motion_detected && !state.stop_notified && quiet_for >= stop_grace_secs {
        let next = AlarmState {
            motion_detected: false,
            stop_notified: true,
            ..state
        };
        return (next, Some(Alert::MotionStopped));
    }

    (state, None)
}

impl AlarmPolicy for EdgePolicy {
    fn observe(&mut self, event: MotionEvent) -> Option<Alert> {
        let (next, alert) = edge_transition(self.state, event, self.stop_grace_secs);
        self.state = next;
        alert
    }

    fn reset(&mut self) {
        self.state = AlarmState::default();
    }

    fn is_alarmed(&self) -> bool {
        self.state.motion_detected
    }

    fn name(&self) -> &'static str {
        "edge"
    }
}

// Counter policy

/// State of the motion-intensity counter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CounterState {
    pub counter: u32,
    pub last_alert_secs: Option<f64>,
}

/// Alerts when sustained motion pushes a counter over a trigger value.
#[derive(Debug, Clone)]
pub struct CounterPolicy {
    trigger: u32,
    cooldown_secs: f64,
    state: CounterState,
}

impl CounterPolicy {
    pub fn new(trigger: u32, cooldown_secs: f64) -> Self {
        Self {
            trigger,
            cooldown_secs,
            state: CounterState::default(),
        }
    }

    pub fn state(&self) -> CounterState {
        self.state
    }
}

/// Pure counter-policy transition.
///
/// Crossing the trigger always resets the counter; the alert itself is
/// suppressed while the cooldown since the previous alert is running.
pub fn counter_transition(
    state: CounterState,
    event: MotionEvent,
    trigger: u32,
    cooldown_secs: f64,
) -> (CounterState, Option<Alert>) {
    let counter = if event.motion {
        state.counter.saturating_add(1)
    } else {
        state.counter.saturating_sub(1)
    };

    if counter <= trigger {
        return (CounterState { counter, ..state }, None);
    }

    let cooled_down = state
        .last_alert_secs
        .map_or(true, |last| event.at_secs - last > cooldown_secs);

    if cooled_down {
        let next = CounterState {
            counter: 0,
            last_alert_secs: Some(event.at_secs),
        };
        (next, Some(Alert::MotionSustained))
    } else {
        (CounterState { counter: 0, ..state }, None)
    }
}

impl AlarmPolicy for CounterPolicy {
    fn observe(&mut self, event: MotionEvent) -> Option<Alert> {
        let (next, alert) =
            counter_transition(self.state, event, self.trigger, self.cooldown_secs);
        self.state = next;
        alert
    }

    /// Clears the counter and the cooldown, so re-enabled monitoring can
    /// alert straight away.
    fn reset(&mut self) {
        self.state = CounterState::default();
    }

    fn is_alarmed(&self) -> bool {
        self.state.counter > 0
    }

    fn name(&self) -> &'static str {
        "counter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: f64 = 30.0;

    fn motion(at: f64) -> MotionEvent {
        MotionEvent::new(true, at)
    }

    fn quiet(at: f64) -> MotionEvent {
        MotionEvent::new(false, at)
    }

    #[test]
    fn idle_to_alarmed() {
        let (state, alert) = edge_transition(AlarmState::default(), motion(1.0), GRACE);
        assert_eq!(alert, Some(Alert::MotionStarted));
        assert!(state.motion_detected);
        assert!(!state.stop_notified);
        assert_eq!(state.last_motion_secs, Some(1.0));
    }

    #[test]
    fn continued_motion_only_updates_timestamp() {
        let mut policy = EdgePolicy::new(GRACE);
        assert_eq!(policy.observe(motion(0.0)), Some(Alert::MotionStarted));
        for i in 1..10 {
            assert_eq!(policy.observe(motion(i as f64)), None);
        }
        assert_eq!(policy.state().last_motion_secs, Some(9.0));
    }

    #[test]
    fn stop_fires_once_after_grace() {
        let mut policy = EdgePolicy::new(GRACE);
        policy.observe(motion(0.0));
        assert_eq!(policy.observe(quiet(29.9)), None);
        assert_eq!(policy.observe(quiet(30.0)), Some(Alert::MotionStopped));
        assert_eq!(policy.observe(quiet(45.0)), None);
        assert_eq!(policy.observe(quiet(120.0)), None);
        assert!(!policy.is_alarmed());
        assert!(policy.state().stop_notified);
    }

    #[test]
    fn brief_gap_does_not_restart_episode() {
        let mut policy = EdgePolicy::new(GRACE);
        assert_eq!(policy.observe(motion(0.0)), Some(Alert::MotionStarted));
        assert_eq!(policy.observe(quiet(10.0)), None);
        assert_eq!(policy.observe(motion(20.0)), None);
        // The grace period restarts from the latest motion.
        assert_eq!(policy.observe(quiet(45.0)), None);
        assert_eq!(policy.observe(quiet(50.0)), Some(Alert::MotionStopped));
    }

    #[test]
    fn new_episode_after_stop_alerts_again() {
        let mut policy = EdgePolicy::new(GRACE);
        policy.observe(motion(0.0));
        policy.observe(quiet(31.0));
        assert_eq!(policy.observe(motion(40.0)), Some(Alert::MotionStarted));
        assert!(!policy.state().stop_notified);
    }

    #[test]
    fn quiet_from_idle_never_alerts() {
        let mut policy = EdgePolicy::new(GRACE);
        for i in 0..100 {
            assert_eq!(policy.observe(quiet(i as f64)), None);
        }
    }

    #[test]
    fn edge_reset_clears_everything() {
        let mut policy = EdgePolicy::new(GRACE);
        policy.observe(motion(0.0));
        policy.observe(quiet(31.0));
        policy.reset();
        assert_eq!(policy.state(), AlarmState::default());
    }

    #[test]
    fn counter_needs_sustained_motion() {
        let mut policy = CounterPolicy::new(20, 60.0);
        for i in 0..20 {
            assert_eq!(policy.observe(motion(i as f64 * 0.03)), None);
        }
        assert_eq!(policy.state().counter, 20);
        assert_eq!(policy.observe(motion(0.63)), Some(Alert::MotionSustained));
        assert_eq!(policy.state().counter, 0);
    }

    #[test]
    fn counter_decays_without_motion() {
        let mut policy = CounterPolicy::new(20, 60.0);
        for i in 0..5 {
            policy.observe(motion(i as f64));
        }
        for i in 5..20 {
            policy.observe(quiet(i as f64));
        }
        assert_eq!(policy.state().counter, 0);
    }

    #[test]
    fn counter_cooldown_suppresses_repeat_alerts() {
        let mut policy = CounterPolicy::new(20, 60.0);
        let mut t = 0.0;
        let mut alerts = Vec::new();
        // 90 seconds of continuous motion at ~30 fps.
        while t < 90.0 {
            if let Some(alert) = policy.observe(motion(t)) {
                alerts.push((alert, t));
            }
            t += 0.03;
        }
        assert_eq!(alerts.len(), 2);
        assert!(alerts[1].1 - alerts[0].1 > 60.0);
    }

    #[test]
    fn counter_reset_clears_cooldown() {
        let mut policy = CounterPolicy::new(2, 60.0);
        for t in [0.0, 0.1, 0.2] {
            policy.observe(motion(t));
        }
        assert_eq!(policy.state().last_alert_secs, Some(0.2));
        policy.observe(motion(0.3));
        policy.reset();
        assert_eq!(policy.state(), CounterState::default());

        // Within the old cooldown window, but the slate is clean.
        let alerts: Vec<_> = [1.0, 1.1, 1.2]
            .into_iter()
            .filter_map(|t| policy.observe(motion(t)))
            .collect();
        assert_eq!(alerts, vec![Alert::MotionSustained]);
    }

    #[test]
    fn policy_factory_honours_kind() {
        let mut config = AlarmConfig::default();
        assert_eq!(policy_from_config(&config).name(), "edge");
        config.policy = PolicyKind::Counter;
        assert_eq!(policy_from_config(&config).name(), "counter");
    }
}
