//! Capability traits at the hardware boundary.
//!
//! The monitor only talks to cameras, windows and notifiers through these
//! traits; `vigil-camera` and `vigil-notify` provide the real
//! implementations.

use std::time::Duration;

use vigil_common::error::VigilResult;
use vigil_detect::{Alert, Frame, MotionEvent};

/// One capture, already normalized by the source.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Resized color frame shown while monitoring is disabled.
    pub preview: Frame,
    /// Resized, grayscale, blurred frame fed to the detector.
    pub analysis: Frame,
}

/// Abstract camera.
pub trait FrameSource {
    /// Read the next frame. `Ok(None)` means the device delivered nothing
    /// this time; the caller decides how long to tolerate that.
    fn read(&mut self) -> VigilResult<Option<CapturedFrame>>;

    /// Read the frame used as the initial baseline. Sources may preprocess
    /// it differently (e.g. a heavier blur).
    fn read_baseline(&mut self) -> VigilResult<Option<CapturedFrame>> {
        self.read()
    }

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Operator commands read from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Flip monitoring on or off.
    Toggle,
    /// Leave the loop.
    Quit,
}

impl KeyCommand {
    /// Map a key code as returned by a HighGUI-style `wait_key`.
    ///
    /// Only lowercase `t` and `q` are commands. `wait_key` already truncates
    /// special keys to their low byte (left arrow 0xff51 arrives as 0x51,
    /// `'Q'`), so uppercase letters and masked codes are never accepted.
    pub fn from_key_code(code: i32) -> Option<Self> {
        match code {
            c if c == 't' as i32 => Some(Self::Toggle),
            c if c == 'q' as i32 => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Abstract operator display.
pub trait Display {
    /// Render a frame.
    fn show(&mut self, frame: &Frame) -> VigilResult<()>;

    /// Wait briefly for a key press. This wait paces the loop.
    fn poll_key(&mut self) -> VigilResult<Option<KeyCommand>>;
}

/// Receives alerts raised by the alarm policy.
///
/// Implementations must return immediately and must never fail the caller;
/// delivery problems stay inside the sink.
pub trait AlertSink {
    fn dispatch(&self, alert: Alert, event: &MotionEvent);
}

/// A display for machines without a GUI: shows nothing, reads no keys,
/// and sleeps for the poll interval to keep the loop cadence.
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    poll_interval: Duration,
}

impl HeadlessDisplay {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl Display for HeadlessDisplay {
    fn show(&mut self, _frame: &Frame) -> VigilResult<()> {
        Ok(())
    }

    fn poll_key(&mut self) -> VigilResult<Option<KeyCommand>> {
        std::thread::sleep(self.poll_interval);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_codes_map_to_commands() {
        assert_eq!(KeyCommand::from_key_code('t' as i32), Some(KeyCommand::Toggle));
        assert_eq!(KeyCommand::from_key_code('q' as i32), Some(KeyCommand::Quit));
        assert_eq!(KeyCommand::from_key_code('x' as i32), None);
        assert_eq!(KeyCommand::from_key_code(-1), None);
    }

    #[test]
    fn uppercase_and_truncated_arrow_keys_are_ignored() {
        // Left and down arrows after wait_key's low-byte truncation.
        assert_eq!(KeyCommand::from_key_code(0xff51 & 0xff), None);
        assert_eq!(KeyCommand::from_key_code(0xff54 & 0xff), None);
        assert_eq!(KeyCommand::from_key_code('Q' as i32), None);
        assert_eq!(KeyCommand::from_key_code('T' as i32), None);
    }

    #[test]
    fn key_codes_with_extra_bits_are_ignored() {
        assert_eq!(KeyCommand::from_key_code(0x10_0000 | 'q' as i32), None);
        assert_eq!(KeyCommand::from_key_code(0xff00 | 't' as i32), None);
    }

    #[test]
    fn headless_display_never_reports_keys() {
        let mut display = HeadlessDisplay::new(Duration::from_millis(1));
        display.show(&Frame::filled(2, 2, 0).unwrap()).unwrap();
        assert_eq!(display.poll_key().unwrap(), None);
    }
}
