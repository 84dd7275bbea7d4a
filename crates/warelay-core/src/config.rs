use std::{collections::HashMap, env, fs, io, path::Path};

use crate::{
    codec::DEFAULT_MARKER,
    domain::ChatId,
    errors::Error,
    logging::{LogFormat, LogLevel},
    Result,
};

const DEFAULT_BRIDGE_URL: &str = "ws://localhost:3001";

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub relay: RelayConfig,
    pub whatsapp_bridge_url: String,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

/// Which relay directions this instance runs, and with what.
///
/// Every field is optional on its own; `validate` checks the combination once
/// so the rest of the code only asks `outbound()` / `inbound()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub group_chat_id: Option<ChatId>,
    pub group_title: Option<String>,
    pub messenger: Option<MessengerConfig>,
    pub marker: String,
    pub notify_delivery_failure: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessengerConfig {
    pub url: String,
    /// Skip TLS certificate verification on the messenger endpoint.
    pub tls_insecure: bool,
}

/// Settings for WhatsApp → Telegram.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutboundSettings {
    pub group_chat_id: ChatId,
}

/// Settings for Telegram → messenger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundSettings {
    pub group_title: Option<String>,
    pub messenger: MessengerConfig,
    pub notify_delivery_failure: bool,
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.group_chat_id.is_none() && self.messenger.is_none() {
            return Err(Error::Config(
                "nothing to relay: set TELEGRAM_GROUP_CHAT_ID and/or MESSENGER_URL".to_string(),
            ));
        }
        if self.marker.is_empty() {
            return Err(Error::Config("RELAY_MARKER must not be empty".to_string()));
        }
        if self.marker.contains(['|', '\n', '\r']) {
            return Err(Error::Config(format!(
                "RELAY_MARKER must not contain '|' or line breaks: {:?}",
                self.marker
            )));
        }
        Ok(())
    }

    pub fn outbound(&self) -> Option<OutboundSettings> {
        self.group_chat_id
            .map(|group_chat_id| OutboundSettings { group_chat_id })
    }

    pub fn inbound(&self) -> Option<InboundSettings> {
        self.messenger.clone().map(|messenger| InboundSettings {
            group_title: self.group_title.clone(),
            messenger,
            notify_delivery_failure: self.notify_delivery_failure,
        })
    }
}

impl Config {
    /// Read the process environment, falling back to `./.env` for unset keys.
    pub fn load() -> Result<Self> {
        let dotenv = read_dotenv(Path::new(".env"))?;
        Self::from_source(|key| env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let group_chat_id = match get("TELEGRAM_GROUP_CHAT_ID").and_then(non_empty) {
            Some(raw) => Some(ChatId(raw.trim().parse::<i64>().map_err(|_| {
                Error::Config(format!("TELEGRAM_GROUP_CHAT_ID is not a chat id: {raw}"))
            })?)),
            None => None,
        };
        let group_title = get("TELEGRAM_GROUP_TITLE").and_then(non_empty);

        let messenger = get("MESSENGER_URL")
            .and_then(non_empty)
            .map(|url| MessengerConfig {
                url: url.trim().to_string(),
                tls_insecure: parse_bool(get("MESSENGER_TLS_INSECURE")).unwrap_or(false),
            });

        let relay = RelayConfig {
            group_chat_id,
            group_title,
            messenger,
            marker: get("RELAY_MARKER")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_MARKER.to_string()),
            notify_delivery_failure: parse_bool(get("RELAY_NOTIFY_DELIVERY_FAILURE"))
                .unwrap_or(false),
        };
        relay.validate()?;

        let whatsapp_bridge_url = get("WHATSAPP_BRIDGE_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string());

        let log_level = get("LOG_LEVEL")
            .and_then(non_empty)
            .map(|s| s.parse::<LogLevel>())
            .transpose()?
            .unwrap_or(LogLevel::Info);
        let log_format = get("LOG_FORMAT")
            .and_then(non_empty)
            .map(|s| s.parse::<LogFormat>())
            .transpose()?
            .unwrap_or(LogFormat::Console);

        Ok(Self {
            telegram_bot_token,
            relay,
            whatsapp_bridge_url,
            log_level,
            log_format,
        })
    }
}

/// A missing file is an empty set; any other read failure is an error.
fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(parse_dotenv(&contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e.into()),
    }
}

/// `KEY=value` per line. Blank lines and `#` comments are skipped, an
/// `export ` prefix is allowed and one pair of matching quotes is removed.
fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = ['"', '\'']
                .iter()
                .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
                .unwrap_or(value);
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
