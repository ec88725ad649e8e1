use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AzureSettings;
use crate::error::BriefingError;
use crate::models::{NewsItem, Partition};

pub const API_VERSION: &str = "2024-08-01-preview";

const SYSTEM_PROMPT: &str = "Você é um analista sênior que produz um briefing executivo diário em PT-BR. \
Para cada manchete, gere 2–3 linhas com: o que aconteceu, por que importa e impacto para negócios. \
Use tom direto e cite a fonte entre parênteses com domínio. \
Depois traga 'Pílulas rápidas' (1 linha cada). Finalize com 'Sinais a observar' (3 bullets).";

/// Summary text for the briefing body, either from the model or the fallback listing
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Generated(String),
    Fallback { text: String, error: String },
}

impl Summary {
    pub fn text(&self) -> &str {
        match self {
            Summary::Generated(text) => text,
            Summary::Fallback { text, .. } => text,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    messages: Vec<Message>,
    temperature: f64,
    top_p: f64,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Serialize)]
struct ItemSets<'a> {
    top: &'a [NewsItem],
    quick: &'a [NewsItem],
}

pub struct AzureSummarizer {
    client: Client,
    url: String,
    api_key: String,
}

impl AzureSummarizer {
    pub fn new(settings: AzureSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            settings.endpoint.trim_end_matches('/'),
            settings.deployment,
            API_VERSION
        );

        Ok(Self {
            client,
            url,
            api_key: settings.api_key,
        })
    }

    pub async fn summarize(&self, top: &[NewsItem], quick: &[NewsItem]) -> Result<String> {
        let payload = serde_json::to_string(&ItemSets { top, quick })
            .context("Failed to serialize news items")?;

        let request = ChatRequest {
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: payload,
                },
            ],
            temperature: 0.3,
            top_p: 0.9,
        };

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Azure OpenAI")?;

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

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .context("Failed to parse Azure OpenAI response")?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .context("Azure OpenAI response has no choices")?;

        Ok(content.trim().to_string())
    }
}

/// Ask the model for the summary, substituting the fallback listing on any
/// failure, including missing Azure settings. Never returns an error.
pub async fn summarize_or_fallback(
    settings: Result<AzureSettings>,
    parts: &Partition,
    top_n: usize,
) -> Summary {
    let result = match settings.and_then(AzureSummarizer::new) {
        Ok(summarizer) => summarizer.summarize(&parts.top, &parts.quick).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(text) => Summary::Generated(text),
        Err(e) => {
            let error = format!("{:#}", e);
            warn!(%error, "Summarizer unavailable, using fallback listing");
            Summary::Fallback {
                text: fallback_summary(&parts.top, &parts.quick, top_n, &error),
                error,
            }
        }
    }
}

/// Plain listing used when the model can't be reached
pub fn fallback_summary(top: &[NewsItem], quick: &[NewsItem], top_n: usize, error: &str) -> String {
    let headlines: Vec<String> = top
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}) {}", i + 1, item.link_line()))
        .collect();
    let mentions: Vec<String> = quick
        .iter()
        .map(|item| format!("- {}", item.link_line()))
        .collect();

    format!(
        "## Top {} Manchetes (sem resumo)\n{}\n\n## Pílulas rápidas\n{}\n\n> Falha ao resumir: {}",
        top_n,
        headlines.join("\n"),
        mentions.join("\n"),
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(prefix: &str, n: usize) -> Vec<NewsItem> {
        (0..n)
            .map(|i| {
                NewsItem::new(
                    format!("{} {}", prefix, i),
                    format!("https://example.com/{}/{}", prefix, i),
                    "",
                    "Example",
                    "",
                )
            })
            .collect()
    }

    fn settings(endpoint: String) -> AzureSettings {
        AzureSettings {
            endpoint,
            deployment: "briefing".to_string(),
            api_key: "test-key".to_string(),
        }
    }

    // ==================== Fallback Tests ====================

    #[test]
    fn test_fallback_lists_every_item() {
        let top = items("Headline", 3);
        let quick = items("Quick", 2);

        let text = fallback_summary(&top, &quick, 8, "connection refused");

        let numbered = text
            .lines()
            .filter(|l| l.starts_with(|c: char| c.is_ascii_digit()) && l.contains(") "))
            .count();
        let bullets = text.lines().filter(|l| l.starts_with("- ")).count();

        assert_eq!(numbered, 3);
        assert_eq!(bullets, 2);
        assert!(text.starts_with("## Top 8 Manchetes (sem resumo)\n1) Headline 0 (Example)"));
        assert!(text.contains("## Pílulas rápidas"));
        assert!(text.ends_with("> Falha ao resumir: connection refused"));
    }

    #[test]
    fn test_fallback_with_no_quick_mentions() {
        let text = fallback_summary(&items("Headline", 1), &[], 8, "boom");
        assert!(text.contains("## Pílulas rápidas\n\n\n> Falha ao resumir: boom"));
    }

    // ==================== Request Tests ====================

    #[tokio::test]
    async fn test_summarize_returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/briefing/chat/completions")
            .match_query(mockito::Matcher::UrlEncoded(
                "api-version".into(),
                API_VERSION.into(),
            ))
            .match_header("api-key", "test-key")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"temperature": 0.3}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices": [{"message": {"role": "assistant", "content": "  Resumo do dia  "}}]}"#,
            )
            .create_async()
            .await;

        let parts = Partition {
            top: items("Headline", 2),
            quick: items("Quick", 1),
        };
        let summary = summarize_or_fallback(Ok(settings(format!("{}/", server.url()))), &parts, 8).await;

        assert_eq!(summary, Summary::Generated("Resumo do dia".to_string()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_user_message_carries_item_sets() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/openai/deployments/briefing/chat/completions")
            .match_query(mockito::Matcher::Any)
            .match_body(mockito::Matcher::Regex(r#"\\"top\\":\[\{\\"title\\":\\"Headline 0"#.to_string()))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "ok"}}]}"#)
            .create_async()
            .await;

        let summarizer = AzureSummarizer::new(settings(server.url())).unwrap();
        let text = summarizer
            .summarize(&items("Headline", 1), &[])
            .await
            .unwrap();

        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_error_status_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/openai/deployments/briefing/chat/completions")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let parts = Partition {
            top: items("Headline", 2),
            quick: items("Quick", 3),
        };
        let summary = summarize_or_fallback(Ok(settings(server.url())), &parts, 8).await;

        match summary {
            Summary::Fallback { text, error } => {
                assert!(error.contains("500"));
                assert!(text.contains("> Falha ao resumir:"));
                assert_eq!(text.lines().filter(|l| l.starts_with("- ")).count(), 3);
            }
            other => panic!("expected fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/openai/deployments/briefing/chat/completions")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let parts = Partition {
            top: items("Headline", 1),
            quick: vec![],
        };
        let summary = summarize_or_fallback(Ok(settings(server.url())), &parts, 8).await;

        assert!(matches!(summary, Summary::Fallback { .. }));
        assert!(summary.text().contains("no choices"));
    }

    #[tokio::test]
    async fn test_missing_settings_falls_back() {
        let parts = Partition {
            top: items("Headline", 2),
            quick: vec![],
        };
        let settings = crate::config::Config::default().azure();

        let summary = summarize_or_fallback(settings, &parts, 8).await;

        assert!(summary.text().contains("AZURE_OPENAI_ENDPOINT"));
        assert!(summary.text().contains("1) Headline 0"));
    }
}
