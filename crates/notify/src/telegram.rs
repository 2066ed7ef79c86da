//! Telegram Bot API client.

use std::time::Duration;

use serde::Serialize;

use vigil_common::config::{NotifyConfig, TelegramCredentials};
use vigil_common::error::{VigilError, VigilResult};

/// JSON body of `sendMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationMessage {
    pub chat_id: String,
    pub text: String,
}

/// Sends text messages to one chat.
///
/// Cheap to clone: the HTTP client is reference counted, so each spawned
/// delivery task gets its own copy of the endpoint and chat id.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(credentials: &TelegramCredentials, config: &NotifyConfig) -> VigilResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| VigilError::notify(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: send_message_url(&config.api_base, &credentials.bot_token),
            chat_id: credentials.chat_id.clone(),
        })
    }

    pub fn message(&self, text: &str) -> NotificationMessage {
        NotificationMessage {
            chat_id: self.chat_id.clone(),
            text: text.to_string(),
        }
    }

    /// Deliver `text`, reporting failures to the caller.
    pub async fn send(&self, text: &str) -> VigilResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&self.message(text))
            .send()
            .await
            // The URL carries the bot token; keep it out of error messages.
            .map_err(|e| VigilError::notify(e.without_url().to_string()))?;

        response
            .error_for_status()
            .map_err(|e| VigilError::notify(e.without_url().to_string()))?;
        Ok(())
    }

    /// Deliver `text` and log the outcome. Never fails.
    pub async fn notify(&self, text: &str) {
        match self.send(text).await {
            Ok(()) => tracing::info!(chat_id = %self.chat_id, "Telegram notification sent"),
            Err(e) => tracing::warn!(
                chat_id = %self.chat_id,
                error = %e,
                "Failed to send Telegram notification"
            ),
        }
    }
}

fn send_message_url(api_base: &str, bot_token: &str) -> String {
    format!("{}/bot{bot_token}/sendMessage", api_base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> TelegramCredentials {
        TelegramCredentials {
            bot_token: "123:secret".to_string(),
            chat_id: "42".to_string(),
        }
    }

    #[test]
    fn url_embeds_token() {
        assert_eq!(
            send_message_url("https://api.telegram.org/", "123:abc"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn payload_has_chat_id_and_text() {
        let notifier = TelegramNotifier::new(&credentials(), &NotifyConfig::default()).unwrap();
        let json = serde_json::to_value(notifier.message("Motion detected in your room!")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"chat_id": "42", "text": "Motion detected in your room!"})
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error_without_token() {
        let config = NotifyConfig {
            api_base: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..NotifyConfig::default()
        };
        let notifier = TelegramNotifier::new(&credentials(), &config).unwrap();

        let err = notifier.send("hello").await.unwrap_err();
        assert!(matches!(err, VigilError::Notify { .. }));
        assert!(!err.to_string().contains("secret"));

        // The logging wrapper swallows the same failure.
        notifier.notify("hello").await;
    }
}
