use std::str::FromStr;

use tracing::Span;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn is_debug(self) -> bool {
        self == LogLevel::Debug
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            // tracing has nothing above error; fatal/panic collapse into it.
            "error" | "fatal" | "panic" => Ok(LogLevel::Error),
            other => Err(Error::Config(format!("unknown log level: {other}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Console,
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "console" => Ok(LogFormat::Console),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::Config(format!("unknown log format: {other}"))),
        }
    }
}

/// Install the process-wide subscriber. Call once from `main`.
///
/// `RUST_LOG` overrides the configured level.
pub fn init(service_name: &str, level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(service_name, level)));

    let res = match format {
        LogFormat::Console => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(true)
            .try_init(),
        LogFormat::Json => fmt().json().with_env_filter(filter).try_init(),
    };

    res.map_err(|e| Error::Config(format!("logging init failed: {e}")))
}

fn default_directives(service_name: &str, level: LogLevel) -> String {
    let lvl = level.as_str();
    // Bot API chatter stays at warn unless we are debugging.
    let teloxide = if level.is_debug() { "debug" } else { "warn" };
    format!(
        "{lvl},{service_name}={lvl},warelay_core={lvl},warelay_telegram={lvl},\
         warelay_messenger={lvl},warelay_whatsapp={lvl},teloxide={teloxide}"
    )
}

/// Logging handle handed to a component at construction.
///
/// Everything a component logs is emitted inside its span, so the component
/// name shows up on each line without a global lookup.
pub fn component_span(component: &'static str) -> Span {
    tracing::info_span!("component", name = component)
}
