use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::traits::{DeliveryOutcome, MediaServer, Notifier};

const TELEGRAM_API: &str = "https://api.telegram.org";

/// Telegram transport: leads with the item's poster when available,
/// falls back to the fallback item's poster, finally to text-only.
pub struct TelegramNotifier {
    client: Client,
    bot_token: String,
    chat_id: String,
    server: Arc<dyn MediaServer>,
}

impl TelegramNotifier {
    pub fn new(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        server: Arc<dyn MediaServer>,
    ) -> Self {
        Self {
            client: Client::new(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            server,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", TELEGRAM_API, self.bot_token, method)
    }

    async fn send_photo(&self, photo: Vec<u8>, caption: &str) -> Result<(), SourceError> {
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .text("parse_mode", "Markdown")
            .part(
                "photo",
                Part::bytes(photo)
                    .file_name("poster.jpg")
                    .mime_str("image/jpeg")
                    .map_err(|e| SourceError::decode("telegram", e.to_string()))?,
            );
        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::status("telegram", status.as_u16(), "sendPhoto"));
        }
        Ok(())
    }

    async fn send_text(&self, message: &str) -> Result<(), SourceError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .form(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", message),
                ("parse_mode", "Markdown"),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::status(
                "telegram",
                status.as_u16(),
                "sendMessage",
            ));
        }
        Ok(())
    }

    /// Fetch a poster, treating every failure as "no image" so delivery can
    /// continue down the fallback chain.
    async fn poster_bytes(&self, item_id: &str) -> Option<Vec<u8>> {
        match self.server.primary_image(item_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(item_id, error = %e, "Failed to fetch poster, continuing without it");
                None
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(
        &self,
        poster_item_id: Option<&str>,
        fallback_item_id: Option<&str>,
        message: &str,
    ) -> Result<DeliveryOutcome, SourceError> {
        if let Some(item_id) = poster_item_id {
            if let Some(photo) = self.poster_bytes(item_id).await {
                match self.send_photo(photo, message).await {
                    Ok(()) => {
                        return Ok(DeliveryOutcome {
                            delivered: true,
                            primary_image_used: true,
                        })
                    }
                    Err(e) => {
                        warn!(item_id, error = %e, "sendPhoto with primary poster failed");
                    }
                }
            }
        }

        if let Some(item_id) = fallback_item_id {
            if let Some(photo) = self.poster_bytes(item_id).await {
                match self.send_photo(photo, message).await {
                    Ok(()) => {
                        debug!(item_id, "Delivered with fallback poster");
                        return Ok(DeliveryOutcome {
                            delivered: true,
                            primary_image_used: false,
                        });
                    }
                    Err(e) => {
                        warn!(item_id, error = %e, "sendPhoto with fallback poster failed");
                    }
                }
            }
        }

        self.send_text(message).await?;
        Ok(DeliveryOutcome {
            delivered: true,
            primary_image_used: false,
        })
    }
}
