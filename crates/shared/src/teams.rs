use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::info;

use crate::error::BriefingError;
use crate::models::NewsItem;

const HEADLINES_SHOWN: usize = 3;

/// Shape of the webhook payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebhookFormat {
    #[default]
    Card,
    Text,
}

pub struct TeamsNotifier {
    client: Client,
    webhook_url: Option<String>,
    format: WebhookFormat,
}

impl TeamsNotifier {
    /// A blank or missing URL yields a notifier that posts nothing
    pub fn new(webhook_url: Option<String>, format: WebhookFormat) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let webhook_url = webhook_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        Ok(Self {
            client,
            webhook_url,
            format,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Post the top headlines. Returns false when no webhook is configured.
    pub async fn post_headlines(&self, top: &[NewsItem], date: NaiveDate) -> Result<bool> {
        let Some(url) = &self.webhook_url else {
            return Ok(false);
        };

        let payload = match self.format {
            WebhookFormat::Card => card_payload(top, date),
            WebhookFormat::Text => text_payload(top, date),
        };

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .context("Failed to post to Teams webhook")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(BriefingError::Api {
                status: status.as_u16(),
                message: error_text,
            }
            .into());
        }

        info!(headlines = top.len().min(HEADLINES_SHOWN), "Posted briefing to Teams");
        Ok(true)
    }
}

fn title_line(date: NaiveDate) -> String {
    format!("Briefing Tech — {}", date.format("%Y-%m-%d"))
}

/// Adaptive Card message with the first three headlines
pub fn card_payload(top: &[NewsItem], date: NaiveDate) -> Value {
    let mut body = vec![
        json!({
            "type": "TextBlock",
            "text": title_line(date),
            "weight": "Bolder",
            "size": "Large"
        }),
        json!({
            "type": "TextBlock",
            "text": "Top 3 Manchetes",
            "weight": "Bolder",
            "spacing": "Medium"
        }),
    ];

    for (i, item) in top.iter().take(HEADLINES_SHOWN).enumerate() {
        body.push(json!({
            "type": "TextBlock",
            "text": format!("**{}) {}**\n{} — [Ler]({})", i + 1, item.title, item.source, item.url),
            "wrap": true
        }));
    }

    body.push(json!({
        "type": "TextBlock",
        "text": "Resumo completo enviado por e-mail.",
        "isSubtle": true,
        "spacing": "Medium"
    }));

    json!({
        "type": "message",
        "attachments": [{
            "contentType": "application/vnd.microsoft.card.adaptive",
            "content": {
                "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
                "type": "AdaptiveCard",
                "version": "1.4",
                "body": body
            }
        }]
    })
}

/// Simple text message for webhooks that don't render cards
pub fn text_payload(top: &[NewsItem], date: NaiveDate) -> Value {
    let lines: Vec<String> = top
        .iter()
        .take(HEADLINES_SHOWN)
        .enumerate()
        .map(|(i, item)| format!("{}. [{}]({}) ({})", i + 1, item.title, item.url, item.source))
        .collect();

    json!({
        "text": format!(
            "**{}**\n\n{}\n\nResumo completo enviado por e-mail.",
            title_line(date),
            lines.join("\n")
        )
    })
}
