use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{domain::ChatId, errors::Error, Result};

/// Typed runtime configuration, sourced from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    /// Chat that receives review notifications and answers commands.
    pub moderation_chat: ChatId,
    /// Optional public channel approved reviews are re-published to.
    pub broadcast_channel: Option<ChatId>,

    // Site API
    pub site_api_url: String,
    /// Shared secret for the site API; also checked on inbound webhooks.
    pub site_api_key: String,

    // Analytics (optional pair; absence means "not configured")
    pub metrics_counter_id: Option<String>,
    pub metrics_token: Option<String>,

    // Runtime
    pub moderation_backend: ModerationBackendKind,
    pub database_path: PathBuf,
    pub webhook_port: u16,
    pub app_env: String,
}

/// Deployment variant: where moderation decisions are applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationBackendKind {
    /// Proxy decisions to the remote site API (the site owns the records).
    Site,
    /// Apply decisions to the embedded review store.
    Local,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = require("TELEGRAM_BOT_TOKEN")?;
        let moderation_chat = ChatId(parse_chat_id("TELEGRAM_CHAT_ID", &require("TELEGRAM_CHAT_ID")?)?);

        let broadcast_channel = match env_str("TELEGRAM_REVIEWS_CHANNEL").and_then(non_empty) {
            Some(raw) => Some(ChatId(parse_chat_id("TELEGRAM_REVIEWS_CHANNEL", &raw)?)),
            None => None,
        };

        let site_api_url = require("SITE_API_URL")?.trim_end_matches('/').to_string();
        let site_api_key = require("REVIEWS_PUBLISH_API_KEY")?;

        let metrics_counter_id = env_str("YM_COUNTER_ID").and_then(non_empty);
        let metrics_token = env_str("YM_OAUTH_TOKEN").and_then(non_empty);

        let moderation_backend = match env_str("MODERATION_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("site") => ModerationBackendKind::Site,
            Some("local") => ModerationBackendKind::Local,
            Some(other) => {
                return Err(Error::Config(format!(
                    "MODERATION_BACKEND must be \"site\" or \"local\", got {other:?}"
                )))
            }
        };

        let database_path = env_str("DATABASE_PATH")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/reviews.db"));

        let webhook_port = match env_str("WEBHOOK_PORT").and_then(non_empty) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config("WEBHOOK_PORT must be a port number".to_string()))?,
            None => 3001,
        };

        let app_env = env_str("APP_ENV").and_then(non_empty).unwrap_or_else(|| "development".to_string());

        Ok(Self {
            telegram_bot_token,
            moderation_chat,
            broadcast_channel,
            site_api_url,
            site_api_key,
            metrics_counter_id,
            metrics_token,
            moderation_backend,
            database_path,
            webhook_port,
            app_env,
        })
    }
}

fn require(key: &str) -> Result<String> {
    env_str(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn parse_chat_id(key: &str, raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| Error::Config(format!("{key} must be a numeric chat id")))
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Minimal `.env` loader; existing process environment always wins.
fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() || env::var_os(key).is_some() {
            continue;
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}
