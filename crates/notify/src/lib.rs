//! Vigil Notify
//!
//! Alert delivery that never blocks the monitoring loop:
//!
//! - [`telegram::TelegramNotifier`]: `sendMessage` over the Bot API
//! - [`sound::SoundPlayer`]: alarm playback through GStreamer
//! - [`dispatcher::AlertDispatcher`]: the `AlertSink` that spawns both onto
//!   a Tokio runtime

pub mod dispatcher;
pub mod sound;
pub mod telegram;

pub use dispatcher::{AlertDispatcher, AlertPlan, AlertPlanner};
pub use sound::{SoundCue, SoundPlayer};
pub use telegram::{NotificationMessage, TelegramNotifier};
