//! Alarm sound playback through GStreamer.
//!
//! Playback is blocking and meant to run on a blocking worker thread. A
//! shutdown flag lets the process tear audio down while a beep sequence is
//! still running.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use gst::prelude::*;
use gstreamer as gst;

use vigil_common::error::{VigilError, VigilResult};

/// Longest a single playback may take before it is cut off.
const MAX_CLIP_DURATION: Duration = Duration::from_secs(30);

/// Bus polling step; bounds how long shutdown takes to be noticed.
const POLL_STEP: Duration = Duration::from_millis(50);

/// How a sound should be played. Copied into the playback task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundCue {
    pub repeats: u32,
    pub interval: Duration,
}

impl SoundCue {
    pub fn once() -> Self {
        Self {
            repeats: 1,
            interval: Duration::ZERO,
        }
    }

    pub fn repeated(repeats: u32, interval: Duration) -> Self {
        Self { repeats, interval }
    }
}

/// Plays one sound file on the default audio sink.
#[derive(Debug, Clone)]
pub struct SoundPlayer {
    path: PathBuf,
    shutdown: Arc<AtomicBool>,
}

impl SoundPlayer {
    /// Prepare a player for `path`.
    ///
    /// A missing file or an unusable audio stack disables sound with a
    /// warning instead of failing startup.
    pub fn load(path: &Path) -> Option<Self> {
        if !path.is_file() {
            tracing::warn!(path = %path.display(), "Sound file not found; alarms will be silent");
            return None;
        }
        if let Err(e) = init_gstreamer() {
            tracing::warn!(error = %e, "Audio unavailable; alarms will be silent");
            return None;
        }
        tracing::info!(path = %path.display(), "Alarm sound loaded");
        Some(Self {
            path: path.to_path_buf(),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Stop any running and future playback.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Play the cue, blocking until done. Returns how many times the sound
    /// actually played.
    pub fn play(&self, cue: SoundCue) -> VigilResult<u32> {
        let mut played = 0;
        for i in 0..cue.repeats {
            if self.is_shut_down() {
                break;
            }
            if i > 0 && !self.wait(cue.interval) {
                break;
            }
            tracing::info!(repeat = i + 1, of = cue.repeats, "ALARM");
            self.play_once()?;
            played += 1;
        }
        Ok(played)
    }

    /// Sleep for `duration` unless shut down first. Returns false if
    /// interrupted.
    fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        while Instant::now() < deadline {
            if self.is_shut_down() {
                return false;
            }
            std::thread::sleep(POLL_STEP.min(deadline.saturating_duration_since(Instant::now())));
        }
        !self.is_shut_down()
    }

    fn play_once(&self) -> VigilResult<()> {
        let launch = format!(
            "filesrc location=\"{}\" ! decodebin ! audioconvert ! audioresample ! autoaudiosink",
            escape_path(&self.path)
        );
        let pipeline = gst::parse::launch(&launch)
            .map_err(|e| VigilError::audio(format!("Failed to build playback pipeline: {e}")))?
            .dynamic_cast::<gst::Pipeline>()
            .map_err(|_| VigilError::audio("Launch string did not produce a pipeline"))?;

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| VigilError::audio(format!("Failed to start playback: {e:?}")))?;

        let result = self.drain(&pipeline);

        if let Err(e) = pipeline.set_state(gst::State::Null) {
            tracing::warn!(error = ?e, "Failed to stop playback pipeline");
        }
        result
    }

    /// Wait for end-of-stream, an error, shutdown, or the clip deadline.
    fn drain(&self, pipeline: &gst::Pipeline) -> VigilResult<()> {
        let Some(bus) = pipeline.bus() else {
            return Err(VigilError::audio("Playback pipeline has no bus"));
        };

        let start = Instant::now();
        while start.elapsed() < MAX_CLIP_DURATION {
            if self.is_shut_down() {
                tracing::debug!("Playback interrupted by shutdown");
                return Ok(());
            }
            let step = gst::ClockTime::from_nseconds(POLL_STEP.as_nanos() as u64);
            let Some(msg) = bus.timed_pop(step) else {
                continue;
            };
            match msg.view() {
                gst::MessageView::Eos(_) => return Ok(()),
                gst::MessageView::Error(e) => {
                    return Err(VigilError::audio(format!("Playback failed: {}", e.error())));
                }
                _ => {}
            }
        }

        tracing::warn!(
            limit_secs = MAX_CLIP_DURATION.as_secs(),
            "Playback cut off at clip limit"
        );
        Ok(())
    }
}

fn init_gstreamer() -> VigilResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(VigilError::audio(format!("Failed to initialize GStreamer: {e}"))),
    }
}

fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('"', "\\\"")
}
