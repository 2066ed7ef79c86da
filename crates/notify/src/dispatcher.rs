//! Turns alerts into background notification and sound tasks.

use std::time::Duration;

use tokio::runtime::Handle;

use vigil_common::config::{AlarmConfig, NotifyConfig};
use vigil_detect::{Alert, MotionEvent};
use vigil_monitor::AlertSink;

use crate::sound::{SoundCue, SoundPlayer};
use crate::telegram::TelegramNotifier;

/// What to deliver for one alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPlan {
    pub text: String,
    pub cue: Option<SoundCue>,
}

/// Maps alerts to message text and sound cues.
#[derive(Debug, Clone)]
pub struct AlertPlanner {
    started_text: String,
    stopped_text: String,
    sustained_text: String,
    sustained_cue: SoundCue,
}

impl AlertPlanner {
    pub fn new(notify: &NotifyConfig, alarm: &AlarmConfig) -> Self {
        Self {
            started_text: notify.started_text.clone(),
            stopped_text: notify.stopped_text.clone(),
            sustained_text: notify.sustained_text.clone(),
            sustained_cue: SoundCue::repeated(
                alarm.beep_repeats.max(1),
                Duration::from_millis(alarm.beep_interval_ms),
            ),
        }
    }

    pub fn plan(&self, alert: Alert) -> AlertPlan {
        match alert {
            Alert::MotionStarted => AlertPlan {
                text: self.started_text.clone(),
                cue: Some(SoundCue::once()),
            },
            Alert::MotionStopped => AlertPlan {
                text: self.stopped_text.clone(),
                cue: None,
            },
            Alert::MotionSustained => AlertPlan {
                text: self.sustained_text.clone(),
                cue: Some(self.sustained_cue),
            },
        }
    }
}

/// [`AlertSink`] that hands every alert to the runtime and returns at once.
///
/// Each spawned task owns clones of what it needs; nothing is shared with
/// the monitoring loop after `dispatch` returns.
pub struct AlertDispatcher {
    runtime: Handle,
    telegram: TelegramNotifier,
    sound: Option<SoundPlayer>,
    planner: AlertPlanner,
}

impl AlertDispatcher {
    pub fn new(
        runtime: Handle,
        telegram: TelegramNotifier,
        sound: Option<SoundPlayer>,
        planner: AlertPlanner,
    ) -> Self {
        Self {
            runtime,
            telegram,
            sound,
            planner,
        }
    }

    /// Interrupt running sound playback and refuse new playback.
    /// In-flight messages are left to the runtime's shutdown.
    pub fn shutdown(&self) {
        if let Some(sound) = &self.sound {
            sound.shutdown();
        }
    }
}

impl AlertSink for AlertDispatcher {
    fn dispatch(&self, alert: Alert, event: &MotionEvent) {
        let plan = self.planner.plan(alert);
        tracing::debug!(?alert, at_secs = event.at_secs, "Dispatching alert");

        if let (Some(player), Some(cue)) = (&self.sound, plan.cue) {
            let player = player.clone();
            self.runtime.spawn_blocking(move || match player.play(cue) {
                Ok(played) => tracing::debug!(played, "Alarm sound finished"),
                Err(e) => tracing::warn!(error = %e, "Alarm sound failed"),
            });
        }

        let telegram = self.telegram.clone();
        let text = plan.text;
        self.runtime.spawn(async move {
            telegram.notify(&text).await;
        });
    }
}
