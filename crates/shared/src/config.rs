use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::env;

use crate::error::BriefingError;

pub const DEFAULT_SMTP_HOST: &str = "smtp.office365.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;

/// Environment-sourced settings.
///
/// Credentials are kept optional here and only checked by the accessor of
/// the step that needs them, so a run without SMTP settings still gets as far
/// as writing the briefing file.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub bing_api_key: Option<String>,
    pub azure_endpoint: Option<String>,
    pub azure_deployment: Option<String>,
    pub azure_key: Option<String>,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub recipient_email: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub teams_webhook_url: Option<String>,
    pub feeds: Vec<String>,
    pub utc_offset_hours: i32,
}

/// Connection settings for the Azure OpenAI deployment
#[derive(Debug, Clone)]
pub struct AzureSettings {
    pub endpoint: String,
    pub deployment: String,
    pub api_key: String,
}

/// Login and addressing for the SMTP submission
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub recipient: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        let smtp_port = match non_empty_var("SMTP_PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("SMTP_PORT is not a valid port: {}", port))?,
            None => DEFAULT_SMTP_PORT,
        };

        let utc_offset_hours = match non_empty_var("BRIEFING_UTC_OFFSET") {
            Some(offset) => offset
                .parse()
                .with_context(|| format!("BRIEFING_UTC_OFFSET is not a whole hour: {}", offset))?,
            None => DEFAULT_UTC_OFFSET_HOURS,
        };

        let feeds = non_empty_var("BRIEFING_FEEDS")
            .map(|list| parse_feed_list(&list))
            .unwrap_or_default();

        Ok(Self {
            bing_api_key: non_empty_var("BING_API_KEY"),
            azure_endpoint: non_empty_var("AZURE_OPENAI_ENDPOINT"),
            azure_deployment: non_empty_var("AZURE_OPENAI_DEPLOYMENT"),
            azure_key: non_empty_var("AZURE_OPENAI_KEY"),
            smtp_user: non_empty_var("SMTP_USER"),
            smtp_pass: non_empty_var("SMTP_PASS"),
            recipient_email: non_empty_var("RECIPIENT_EMAIL"),
            smtp_host: non_empty_var("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
            smtp_port,
            teams_webhook_url: non_empty_var("TEAMS_WEBHOOK_URL"),
            feeds,
            utc_offset_hours,
        })
    }

    pub fn bing_api_key(&self) -> Result<&str> {
        required(&self.bing_api_key, "BING_API_KEY")
    }

    pub fn azure(&self) -> Result<AzureSettings> {
        Ok(AzureSettings {
            endpoint: required(&self.azure_endpoint, "AZURE_OPENAI_ENDPOINT")?.to_string(),
            deployment: required(&self.azure_deployment, "AZURE_OPENAI_DEPLOYMENT")?.to_string(),
            api_key: required(&self.azure_key, "AZURE_OPENAI_KEY")?.to_string(),
        })
    }

    pub fn smtp(&self) -> Result<SmtpSettings> {
        Ok(SmtpSettings {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            user: required(&self.smtp_user, "SMTP_USER")?.to_string(),
            password: required(&self.smtp_pass, "SMTP_PASS")?.to_string(),
            recipient: required(&self.recipient_email, "RECIPIENT_EMAIL")?.to_string(),
        })
    }

    /// Local timezone used for dates in titles, subjects and file names
    pub fn timezone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).with_context(|| {
            format!("UTC offset out of range: {} hours", self.utc_offset_hours)
        })
    }

    /// Today's date in the configured timezone
    pub fn today(&self) -> Result<NaiveDate> {
        Ok(local_date(Utc::now(), self.timezone()?))
    }

    fn try_load_dotenv() {
        // Try locations in order of preference:

        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/tech-briefing/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("tech-briefing").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env (home directory)
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

pub fn local_date(now: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Split a comma-separated list of feed URLs, dropping blanks
pub fn parse_feed_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| BriefingError::MissingConfig(name).into())
}
