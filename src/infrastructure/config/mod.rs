//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    pub database: DatabaseConfig,
    pub decay: DecayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Schedule of the periodic decay pass
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DecayConfig {
    pub first_delay_seconds: u64,
    pub interval_seconds: u64,
}

impl DecayConfig {
    pub fn first_delay(&self) -> Duration {
        Duration::from_secs(self.first_delay_seconds)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "vehicle-care-bot".to_string(),
                prefix: "/".to_string(),
            },
            telegram: TelegramConfig::default(),
            database: DatabaseConfig {
                path: PathBuf::from("vehicles.db"),
            },
            decay: DecayConfig {
                first_delay_seconds: 10,
                interval_seconds: 60,
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_env() -> Result<Self, ConfigError> {
        Config::default().with_env_overrides()
    }

    /// Apply environment overrides on top of this config
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(token) = var("TELEGRAM_BOT_TOKEN").or_else(|| var("BOT_TOKEN")) {
            self.telegram.token = Some(token);
        }

        if let Some(prefix) = var("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Some(path) = var("VEHICLE_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(secs) = var("DECAY_INTERVAL_SECS") {
            self.decay.interval_seconds = secs
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("DECAY_INTERVAL_SECS={}", secs)))?;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.is_empty() {
            return Err(ConfigError::MissingField("bot.prefix".to_string()));
        }
        if self.decay.interval_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "decay.interval-seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
