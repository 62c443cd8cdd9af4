use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub line: LineConfig,
    pub server: ServerConfig,
    pub event_log: EventLogConfig,
}

#[derive(Debug, Clone)]
pub struct LineConfig {
    /// Key for the `x-line-signature` HMAC on inbound webhooks
    pub channel_secret: String,
    /// Bearer token for outbound Messaging API calls
    pub channel_token: String,
    /// Destination of `/push`; unset means the endpoint answers 500
    pub group_id: Option<String>,
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct EventLogConfig {
    pub path: PathBuf,
}

fn default_port() -> u16 {
    5000
}

fn default_event_log_path() -> PathBuf {
    PathBuf::from("events.jsonl")
}

fn default_api_base_url() -> String {
    "https://api.line.me".to_string()
}

impl Config {
    /// Build the configuration from the process environment.
    /// Call `dotenvy::dotenv()` first to seed it from a local `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let channel_secret =
            get("LINE_CHANNEL_SECRET").context("LINE_CHANNEL_SECRET is not set")?;
        let channel_token = get("LINE_CHANNEL_TOKEN").context("LINE_CHANNEL_TOKEN is not set")?;

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT value: {}", raw))?,
            None => default_port(),
        };

        let api_base_url = get("LINE_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(default_api_base_url);

        Ok(Config {
            line: LineConfig {
                channel_secret,
                channel_token,
                group_id: get("LINE_GROUP_ID"),
                api_base_url,
            },
            server: ServerConfig { port },
            event_log: EventLogConfig {
                path: get("EVENT_LOG_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_event_log_path),
            },
        })
    }
}
