//! The monitoring loop.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use vigil_common::clock::MonitorClock;
use vigil_common::error::{VigilError, VigilResult};
use vigil_detect::{AlarmPolicy, Alert, Frame, MotionDetector, MotionEvent};

use crate::source::{AlertSink, CapturedFrame, Display, FrameSource, KeyCommand};

/// Consecutive empty reads tolerated before the camera is considered gone.
pub const MAX_EMPTY_READS: u32 = 50;

/// Mutable loop state owned by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorState {
    /// Monitoring enabled. When false frames are shown but not analysed.
    pub active: bool,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self { active: true }
    }
}

/// Counters reported when the loop exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub frames_read: u64,
    pub frames_analysed: u64,
    pub empty_reads: u64,
    pub alerts: u64,
    pub toggles: u64,
}

/// What one tick produced.
#[derive(Debug, Clone)]
pub struct Tick {
    /// Frame to hand to the display.
    pub view: Frame,
    /// The motion reading, if the frame was analysed.
    pub event: Option<MotionEvent>,
    /// Alert raised by the policy, already dispatched to the sink.
    pub alert: Option<Alert>,
}

/// Owns the detector, the alarm policy and the loop state.
pub struct Monitor {
    detector: MotionDetector,
    policy: Box<dyn AlarmPolicy>,
    sink: Box<dyn AlertSink>,
    clock: MonitorClock,
    state: MonitorState,
    stats: MonitorStats,
    interrupted: Arc<AtomicBool>,
}

impl Monitor {
    pub fn new(
        detector: MotionDetector,
        policy: Box<dyn AlarmPolicy>,
        sink: Box<dyn AlertSink>,
        clock: MonitorClock,
    ) -> Self {
        Self {
            detector,
            policy,
            sink,
            clock,
            state: MonitorState::default(),
            stats: MonitorStats::default(),
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn policy(&self) -> &dyn AlarmPolicy {
        self.policy.as_ref()
    }

    /// Flag that makes [`Monitor::run`] leave its loop at the next
    /// iteration, e.g. from a Ctrl+C handler on another thread.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    /// Make `frame` the detector baseline.
    pub fn prime(&mut self, frame: Frame) {
        self.detector.prime(frame);
    }

    /// Per-frame update at monotonic time `now_secs`.
    pub fn tick(&mut self, captured: CapturedFrame, now_secs: f64) -> VigilResult<Tick> {
        self.stats.frames_read += 1;

        if !self.state.active {
            return Ok(Tick {
                view: captured.preview,
                event: None,
                alert: None,
            });
        }

        self.stats.frames_analysed += 1;
        let detection = self.detector.process(captured.analysis)?;
        let event = MotionEvent {
            motion: detection.motion,
            at_secs: now_secs,
            changed: detection.changed,
        };
        tracing::trace!(changed = detection.changed, motion = detection.motion, "Frame analysed");

        let alert = self.policy.observe(event);
        if let Some(alert) = alert {
            self.stats.alerts += 1;
            tracing::info!(
                ?alert,
                changed = event.changed,
                at = %self.clock.wall_time_at(now_secs),
                "Alarm raised"
            );
            self.sink.dispatch(alert, &event);
        }

        Ok(Tick {
            view: detection.mask,
            event: Some(event),
            alert,
        })
    }

    /// Apply an operator command.
    pub fn handle_key(&mut self, command: KeyCommand) -> ControlFlow<()> {
        match command {
            KeyCommand::Toggle => {
                self.state.active = !self.state.active;
                self.stats.toggles += 1;
                self.detector.reset();
                self.policy.reset();
                tracing::info!(active = self.state.active, "Monitoring toggled");
                ControlFlow::Continue(())
            }
            KeyCommand::Quit => {
                tracing::info!("Quit requested");
                ControlFlow::Break(())
            }
        }
    }

    /// Run until the operator quits, the interrupt flag is raised, or the
    /// source fails.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        display: &mut dyn Display,
    ) -> VigilResult<MonitorStats> {
        tracing::info!(
            source = %source.name(),
            policy = self.policy.name(),
            epoch = %self.clock.epoch_wall(),
            "Monitoring started"
        );

        let baseline = self.read_with_retries(source, true)?;
        self.prime(baseline.analysis);

        loop {
            if self.interrupted.load(Ordering::SeqCst) {
                tracing::info!("Interrupted");
                break;
            }

            let captured = self.read_with_retries(source, false)?;
            let now = self.clock.elapsed_secs();
            let tick = self.tick(captured, now)?;
            display.show(&tick.view)?;

            if let Some(command) = display.poll_key()? {
                if self.handle_key(command).is_break() {
                    break;
                }
            }
        }

        tracing::info!(
            frames = self.stats.frames_read,
            analysed = self.stats.frames_analysed,
            alerts = self.stats.alerts,
            "Monitoring stopped"
        );
        Ok(self.stats)
    }

    fn read_with_retries(
        &mut self,
        source: &mut dyn FrameSource,
        baseline: bool,
    ) -> VigilResult<CapturedFrame> {
        let mut empty = 0;
        loop {
            let read = if baseline {
                source.read_baseline()?
            } else {
                source.read()?
            };
            match read {
                Some(captured) => return Ok(captured),
                None => {
                    empty += 1;
                    self.stats.empty_reads += 1;
                    tracing::debug!(consecutive = empty, "Empty frame from source");
                    if empty >= MAX_EMPTY_READS {
                        return Err(VigilError::camera(format!(
                            "{} delivered {empty} empty frames in a row",
                            source.name()
                        )));
                    }
                }
            }
        }
    }
}
