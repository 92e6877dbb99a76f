use chrono::FixedOffset;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// How often the dispatch loop polls for due messages.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Per-guild cap on live scheduled messages.
pub const DEFAULT_MAX_PER_GUILD: u64 = 200;
/// Fixed UTC offset user-entered timestamps are interpreted in.
pub const DEFAULT_SOURCE_OFFSET: &str = "+01:00";
/// Directory attachment files are written to when none is configured.
pub const DEFAULT_ATTACHMENT_DIR: &str = "attachments";

/// Top-level config (courier.toml + COURIER_* env overrides).
///
/// Loaded once at process start; nothing re-reads it at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierConfig {
    pub bot: BotConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub attachments: AttachmentConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: "change-me".to_string(),
            },
            database: DatabaseConfig::default(),
            attachments: AttachmentConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Chat-platform credential, handed to the platform shim untouched.
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentConfig {
    /// Directory attachment files live in, one standalone file per schedule.
    #[serde(default = "default_attachment_dir")]
    pub dir: String,
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            dir: default_attachment_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Fixed UTC offset for user-entered timestamps, e.g. `+01:00`.
    #[serde(default = "default_source_offset")]
    pub source_offset: String,
    /// Maximum live schedules per guild.
    #[serde(default = "default_max_per_guild")]
    pub max_per_guild: u64,
    /// Dispatch poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            source_offset: default_source_offset(),
            max_per_guild: DEFAULT_MAX_PER_GUILD,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl CourierConfig {
    /// Load config from a TOML file with COURIER_* env var overrides.
    ///
    /// Nested keys use a double underscore in the environment, e.g.
    /// `COURIER_SCHEDULER__MAX_PER_GUILD=50`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path.unwrap_or("courier.toml");

        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("COURIER_").split("__"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }
}

impl SchedulerConfig {
    /// The parsed source offset. Rejected at startup rather than at first use.
    pub fn source_offset(&self) -> Result<FixedOffset> {
        self.source_offset.parse::<FixedOffset>().map_err(|e| {
            CoreError::Config(format!(
                "invalid source offset `{}`: {e}",
                self.source_offset
            ))
        })
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.courier/courier.db", home)
}

fn default_attachment_dir() -> String {
    DEFAULT_ATTACHMENT_DIR.to_string()
}

fn default_source_offset() -> String {
    DEFAULT_SOURCE_OFFSET.to_string()
}

fn default_max_per_guild() -> u64 {
    DEFAULT_MAX_PER_GUILD
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}
