//! Application configuration.
//!
//! Tunables live in a JSON file; Telegram credentials are only ever read
//! from the process environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{VigilError, VigilResult};

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the Telegram chat id.
pub const CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub detection: DetectionConfig,
    pub alarm: AlarmConfig,
    pub notify: NotifyConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// Camera capture and preprocessing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera device index passed to the capture backend.
    pub device_index: i32,

    /// Requested capture resolution.
    pub capture_width: u32,
    pub capture_height: u32,

    /// Width frames are resized to before analysis (aspect ratio preserved).
    pub frame_width: u32,

    /// Gaussian kernel size for the very first (baseline) frame.
    pub baseline_blur_kernel: u32,

    /// Gaussian kernel size for every later frame.
    pub frame_blur_kernel: u32,
}

/// Frame-differencing thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Per-pixel difference above which a pixel counts as changed.
    pub pixel_threshold: u8,

    /// Binarized difference sum above which a frame counts as motion.
    pub motion_threshold: u64,
}

/// Which debouncing policy turns motion readings into alerts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Start/stop edge detection with a quiet grace period.
    #[default]
    Edge,
    /// Motion-intensity counter with a global cooldown.
    Counter,
}

/// Alarm policy parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    pub policy: PolicyKind,

    /// Quiet time after the last motion before "motion stopped" is sent (edge policy).
    pub stop_grace_secs: f64,

    /// Counter value that must be exceeded to raise an alert (counter policy).
    pub counter_trigger: u32,

    /// Minimum time between two alerts (counter policy).
    pub cooldown_secs: f64,

    /// Number of times the sound plays for a sustained-motion alert.
    pub beep_repeats: u32,

    /// Pause between two beeps of a sustained-motion alert.
    pub beep_interval_ms: u64,
}

/// Notification delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Base URL of the Telegram Bot API.
    pub api_base: String,

    /// HTTP request timeout.
    pub timeout_secs: u64,

    /// Sound played on alerts. A missing file disables audio.
    pub sound_file: PathBuf,

    pub started_text: String,
    pub stopped_text: String,
    pub sustained_text: String,
}

/// Preview window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub window_name: String,

    /// Bounded wait for a key press each iteration.
    pub poll_interval_ms: u64,

    /// Run without a window (no keyboard control).
    pub headless: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "vigil_monitor=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            capture_width: 640,
            capture_height: 480,
            frame_width: 500,
            baseline_blur_kernel: 21,
            frame_blur_kernel: 5,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            pixel_threshold: 25,
            motion_threshold: 300,
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Edge,
            stop_grace_secs: 30.0,
            counter_trigger: 20,
            cooldown_secs: 60.0,
            beep_repeats: 5,
            beep_interval_ms: 1000,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            timeout_secs: 10,
            sound_file: PathBuf::from("sound.ogg"),
            started_text: "Motion detected in your room!".to_string(),
            stopped_text: "Motion stopped.".to_string(),
            sustained_text: "Motion detected in your room!".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_name: "Cam".to_string(),
            poll_interval_ms: 30,
            headless: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl FromStr for PolicyKind {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "edge" => Ok(Self::Edge),
            "counter" => Ok(Self::Counter),
            other => Err(VigilError::config(format!(
                "Unknown alarm policy '{other}' (expected 'edge' or 'counter')"
            ))),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edge => f.write_str("edge"),
            Self::Counter => f.write_str("counter"),
        }
    }
}

impl AppConfig {
    /// Load config from the standard location.
    ///
    /// A missing file yields defaults. A malformed one also yields defaults,
    /// with the parse error handed back so the caller can report it once
    /// logging is up.
    pub fn load() -> (Self, Option<VigilError>) {
        let config_path = config_file_path();
        if !config_path.exists() {
            return (Self::default(), None);
        }
        match Self::load_from(&config_path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load config from an explicit path. A missing or malformed file is an
    /// error.
    pub fn load_from(path: &Path) -> VigilResult<Self> {
        if !path.exists() {
            return Err(VigilError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("vigil").join("config.json")
}

/// Telegram bot credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramCredentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> VigilResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup.
    ///
    /// Unset and empty values are both treated as missing.
    pub fn from_lookup<F>(lookup: F) -> VigilResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        match (read(BOT_TOKEN_VAR), read(CHAT_ID_VAR)) {
            (Some(bot_token), Some(chat_id)) => Ok(Self { bot_token, chat_id }),
            (bot_token, chat_id) => {
                let missing = [
                    (bot_token.is_none(), BOT_TOKEN_VAR),
                    (chat_id.is_none(), CHAT_ID_VAR),
                ]
                .iter()
                .filter(|(absent, _)| *absent)
                .map(|(_, name)| *name)
                .collect::<Vec<_>>()
                .join(", ");
                Err(VigilError::config(format!(
                    "Telegram bot token or chat ID not found in environment (missing: {missing})"
                )))
            }
        }
    }
}

impl fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_constants() {
        let config = AppConfig::default();
        assert_eq!(config.camera.capture_width, 640);
        assert_eq!(config.camera.capture_height, 480);
        assert_eq!(config.camera.frame_width, 500);
        assert_eq!(config.detection.pixel_threshold, 25);
        assert_eq!(config.detection.motion_threshold, 300);
        assert_eq!(config.alarm.policy, PolicyKind::Edge);
        assert_eq!(config.alarm.stop_grace_secs, 30.0);
        assert_eq!(config.display.poll_interval_ms, 30);
        assert_eq!(config.notify.sound_file, PathBuf::from("sound.ogg"));
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"alarm": {"policy": "counter"}, "camera": {"device_index": 2}}"#)
                .unwrap();
        assert_eq!(config.alarm.policy, PolicyKind::Counter);
        assert_eq!(config.alarm.counter_trigger, 20);
        assert_eq!(config.camera.device_index, 2);
        assert_eq!(config.camera.frame_width, 500);
        assert_eq!(config.display.window_name, "Cam");
    }

    #[test]
    fn policy_kind_parses_case_insensitively() {
        assert_eq!("Edge".parse::<PolicyKind>().unwrap(), PolicyKind::Edge);
        assert_eq!("counter".parse::<PolicyKind>().unwrap(), PolicyKind::Counter);
        assert!("sometimes".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn credentials_require_both_values() {
        let creds = TelegramCredentials::from_lookup(lookup_from(&[
            (BOT_TOKEN_VAR, "123:abc"),
            (CHAT_ID_VAR, "42"),
        ]))
        .unwrap();
        assert_eq!(creds.bot_token, "123:abc");
        assert_eq!(creds.chat_id, "42");

        let err = TelegramCredentials::from_lookup(lookup_from(&[(CHAT_ID_VAR, "42")])).unwrap_err();
        assert!(matches!(err, VigilError::Config { .. }));
        assert!(err.to_string().contains(BOT_TOKEN_VAR));
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let err = TelegramCredentials::from_lookup(lookup_from(&[
            (BOT_TOKEN_VAR, "123:abc"),
            (CHAT_ID_VAR, "   "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(CHAT_ID_VAR));
        assert!(!err.to_string().contains(BOT_TOKEN_VAR));
    }

    #[test]
    fn debug_output_hides_token() {
        let creds = TelegramCredentials {
            bot_token: "secret-token".to_string(),
            chat_id: "42".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("42"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = AppConfig::load_from(Path::new("/nonexistent/vigil/config.json")).unwrap_err();
        assert!(matches!(err, VigilError::FileNotFound { .. }));
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let path = std::env::temp_dir().join(format!("vigil-bad-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, VigilError::Json(_)));
    }
}
