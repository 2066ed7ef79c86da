//! Frame-differencing motion detector with a rolling baseline.
//!
//! Every processed frame becomes the baseline for the next one, so slow
//! lighting drift never accumulates into a false alarm.

use vigil_common::config::DetectionConfig;
use vigil_common::error::VigilResult;

use crate::frame::Frame;

/// Result of comparing one frame against the baseline.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Whether the binarized difference sum exceeded the motion threshold.
    pub motion: bool,

    /// Sum of the binarized difference (each changed pixel contributes 255).
    pub changed: u64,

    /// Binarized difference mask, suitable for display.
    pub mask: Frame,
}

/// Compares each frame with the previous one.
#[derive(Debug)]
pub struct MotionDetector {
    config: DetectionConfig,
    baseline: Option<Frame>,
}

impl MotionDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            baseline: None,
        }
    }

    /// Set the baseline without comparing.
    pub fn prime(&mut self, frame: Frame) {
        self.baseline = Some(frame);
    }

    /// Forget the baseline; the next processed frame re-primes it.
    pub fn reset(&mut self) {
        self.baseline = None;
    }

    /// Compare `frame` against the baseline, then make it the new baseline.
    ///
    /// Errors come only from the image backend; the baseline is left as it
    /// was.
    pub fn process(&mut self, frame: Frame) -> VigilResult<Detection> {
        let detection = match self.baseline.as_ref() {
            Some(baseline) if baseline.same_shape(&frame) => {
                let mask = frame
                    .abs_diff(baseline)?
                    .threshold(self.config.pixel_threshold)?;
                let changed = mask.pixel_sum()?;
                Detection {
                    motion: changed > self.config.motion_threshold,
                    changed,
                    mask,
                }
            }
            Some(baseline) => {
                tracing::warn!(
                    width = frame.width(),
                    height = frame.height(),
                    baseline_width = baseline.width(),
                    baseline_height = baseline.height(),
                    "Frame shape changed; re-priming baseline"
                );
                Self::still(&frame)?
            }
            None => Self::still(&frame)?,
        };

        self.baseline = Some(frame);
        Ok(detection)
    }

    /// No-motion result with an empty mask the size of `frame`.
    fn still(frame: &Frame) -> VigilResult<Detection> {
        Ok(Detection {
            motion: false,
            changed: 0,
            mask: Frame::filled(frame.width(), frame.height(), 0)?,
        })
    }
}
