//! Startup ordering.
//!
//! Credentials are resolved before any device is opened, so a
//! misconfigured process exits without touching the camera or the screen.

use vigil_common::config::TelegramCredentials;
use vigil_common::error::VigilResult;

/// Everything needed to start monitoring.
#[derive(Debug)]
pub struct Prepared<S> {
    pub credentials: TelegramCredentials,
    pub source: S,
}

/// Resolve credentials through `lookup`, then open the camera.
pub fn prepare<S, L, O>(lookup: L, open_camera: O) -> VigilResult<Prepared<S>>
where
    L: Fn(&str) -> Option<String>,
    O: FnOnce() -> VigilResult<S>,
{
    let credentials = TelegramCredentials::from_lookup(lookup)?;
    tracing::debug!(chat_id = %credentials.chat_id, "Telegram credentials resolved");

    let source = open_camera()?;
    Ok(Prepared {
        credentials,
        source,
    })
}
