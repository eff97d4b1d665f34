//! Telegram outcome notifications.
//!
//! Delivery is best effort: failures are logged and never propagate to the
//! request that triggered the message.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{debug, info, warn};
use tvhook_core::{OrderOutcome, Signal};

use crate::error::{TelemetryError, TelemetryResult};

/// Telegram's hard limit on message length, in characters.
pub const MAX_TELEGRAM_MESSAGE: usize = 4096;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Telegram bot settings. Notifications are disabled unless both the token
/// and chat id are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Numeric chat id, or `@channelname`.
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: default_api_base(),
        }
    }
}

struct Target {
    bot: Bot,
    chat: Recipient,
    token: String,
}

/// Sends plain-text messages to one Telegram chat.
pub struct TelegramNotifier {
    target: Option<Target>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> TelemetryResult<Self> {
        let (token, chat) = match (config.bot_token.as_deref(), config.chat_id.as_deref()) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => (token, chat),
            _ => {
                info!("Telegram token or chat id not set; notifications disabled");
                return Ok(Self { target: None });
            }
        };

        let client = teloxide::net::default_reqwest_settings()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| TelemetryError::Notify(format!("Failed to create HTTP client: {e}")))?;
        let api_url = Url::parse(&config.api_base)
            .map_err(|e| TelemetryError::Notify(format!("Invalid Telegram API base: {e}")))?;

        Ok(Self {
            target: Some(Target {
                bot: Bot::with_client(token, client).set_api_url(api_url),
                chat: parse_recipient(chat)?,
                token: token.to_string(),
            }),
        })
    }

    /// A notifier that never sends.
    pub fn disabled() -> TelemetryResult<Self> {
        Self::new(&TelegramConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Send a message and wait for the result.
    pub async fn send(&self, text: &str) -> TelemetryResult<()> {
        let Some(target) = &self.target else {
            debug!("Telegram disabled; message dropped");
            return Ok(());
        };

        target
            .bot
            .send_message(target.chat.clone(), truncate_message(text))
            .await
            // Network errors embed the request URL, which carries the token.
            .map_err(|e| TelemetryError::Notify(e.to_string().replace(&target.token, "<redacted>")))?;
        Ok(())
    }

    /// Send from a background task; failures are logged at warn level.
    pub fn notify(self: &Arc<Self>, text: String) {
        if !self.is_enabled() {
            return;
        }
        let notifier = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = notifier.send(&text).await {
                warn!(error = %e, "Telegram notification failed");
            }
        });
    }
}

fn parse_recipient(chat: &str) -> TelemetryResult<Recipient> {
    let chat = chat.trim();
    if let Ok(id) = chat.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    if chat.starts_with('@') && chat.len() > 1 {
        return Ok(Recipient::ChannelUsername(chat.to_string()));
    }
    Err(TelemetryError::Notify(format!(
        "chat id must be numeric or @channel: {chat}"
    )))
}

/// Cut a message down to Telegram's limit, marking the cut with `...`.
pub fn truncate_message(text: &str) -> String {
    if text.chars().count() <= MAX_TELEGRAM_MESSAGE {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_TELEGRAM_MESSAGE - 3).collect();
    out.push_str("...");
    out
}

/// Summary of an executed (or dry-run) signal.
pub fn execution_message(signal: &Signal, outcome: &OrderOutcome) -> String {
    let header = if outcome.dry_run {
        "DRY RUN"
    } else if outcome.success {
        "ORDER PLACED"
    } else {
        "ORDER FAILED"
    };
    let mut msg = format!(
        "{header}\n{} {} {} {} @ {}",
        signal.action.as_wire(),
        signal.pair,
        signal.quantity,
        signal.quantity_type,
        signal.reference_price
    );
    if let Some(id) = &outcome.order_id {
        msg.push_str(&format!("\norder_id: {id}"));
    }
    if let Some(detail) = &outcome.error_detail {
        msg.push_str(&format!("\nerror: {detail}"));
    }
    msg
}

/// Summary of a signal that never reached the exchange.
pub fn rejection_message(stage: &str, detail: &str) -> String {
    format!("SIGNAL REJECTED ({stage})\n{detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use tvhook_core::{OrderSide, Price, QuantityType, TradingPair};

    fn signal() -> Signal {
        Signal {
            symbol: "BTCUSD".to_string(),
            pair: TradingPair::new("BTC", "USD"),
            action: OrderSide::Buy,
            quantity_type: QuantityType::Cash,
            quantity: dec!(100),
            reference_price: Price::new(dec!(50000)),
        }
    }

    #[test]
    fn test_truncate_short_message_unchanged() {
        assert_eq!(truncate_message("hello"), "hello");
        let exact = "a".repeat(MAX_TELEGRAM_MESSAGE);
        assert_eq!(truncate_message(&exact), exact);
    }

    #[test]
    fn test_truncate_long_message() {
        let long = "x".repeat(MAX_TELEGRAM_MESSAGE + 100);
        let out = truncate_message(&long);
        assert_eq!(out.chars().count(), MAX_TELEGRAM_MESSAGE);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let long = "é".repeat(MAX_TELEGRAM_MESSAGE + 1);
        let out = truncate_message(&long);
        assert_eq!(out.chars().count(), MAX_TELEGRAM_MESSAGE);
    }

    #[test]
    fn test_disabled_without_chat_id() {
        let notifier = TelegramNotifier::new(&TelegramConfig {
            bot_token: Some("token".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(!notifier.is_enabled());
    }

    #[test]
    fn test_recipient_parsing() {
        assert_eq!(parse_recipient("-1001234").unwrap(), Recipient::Id(ChatId(-1001234)));
        assert_eq!(
            parse_recipient("@alerts").unwrap(),
            Recipient::ChannelUsername("@alerts".to_string())
        );
        assert!(parse_recipient("alerts").is_err());
        assert!(parse_recipient("@").is_err());
    }

    #[test]
    fn test_enabled_with_token_and_chat() {
        let notifier = TelegramNotifier::new(&TelegramConfig {
            bot_token: Some("123:abc".to_string()),
            chat_id: Some("42".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(notifier.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_send_is_noop() {
        let notifier = TelegramNotifier::disabled().unwrap();
        assert!(notifier.send("ignored").await.is_ok());
    }

    #[test]
    fn test_execution_message() {
        let ok = OrderOutcome::accepted("abc-123", json!({}));
        let msg = execution_message(&signal(), &ok);
        assert!(msg.starts_with("ORDER PLACED"));
        assert!(msg.contains("BUY BTC-USD 100 cash @ 50000"));
        assert!(msg.contains("order_id: abc-123"));

        let failed = OrderOutcome::failed("INSUFFICIENT_FUND", json!({}));
        assert!(execution_message(&signal(), &failed).contains("error: INSUFFICIENT_FUND"));

        let dry = OrderOutcome::dry_run(json!({}));
        assert!(execution_message(&signal(), &dry).starts_with("DRY RUN"));
    }
}
