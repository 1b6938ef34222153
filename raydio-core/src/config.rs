use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub notifications: NotificationConfig,
    pub logging: LoggingConfig,
    pub sdk: SdkConfig,
}

/// Timing of the playback session recovery paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Pause between two reconnect attempts after the client lost its connection
    pub reconnect_interval_ms: u64,
    /// How long to wait for a disappeared streamer before ending the session
    pub streamer_grace_period_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: 2000,
            streamer_grace_period_ms: 10_000,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    #[must_use]
    pub const fn streamer_grace_period(&self) -> Duration {
        Duration::from_millis(self.streamer_grace_period_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub channel_id: String,
    pub channel_name: String,
    /// Package that scopes the control intents
    pub package_name: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_id: "raydio_livestream_listener_channel_id".to_string(),
            channel_name: "Raydio Livestream Player Service".to_string(),
            package_name: "de.mycrocast.raydio.uefa.example".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    pub club_id: u64,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self { club_id: 235_617 }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    ///
    /// Environment variables use `__` between nesting levels, e.g.
    /// `RAYDIO_SESSION__RECONNECT_INTERVAL_MS=500`.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::from(Path::new(path)));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("RAYDIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Check for values the session cannot run with.
    ///
    /// Returns every problem found, not just the first one.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.session.reconnect_interval_ms == 0 {
            errors.push("session.reconnect_interval_ms must be greater than 0".to_string());
        }
        if self.session.streamer_grace_period_ms == 0 {
            errors.push("session.streamer_grace_period_ms must be greater than 0".to_string());
        }
        if self.notifications.package_name.trim().is_empty() {
            errors.push("notifications.package_name must not be empty".to_string());
        }
        if self.notifications.channel_id.trim().is_empty() {
            errors.push("notifications.channel_id must not be empty".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got \"{}\"",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.session.reconnect_interval(), Duration::from_millis(2000));
        assert_eq!(config.session.streamer_grace_period(), Duration::from_secs(10));
        assert_eq!(config.notifications.package_name, "de.mycrocast.raydio.uefa.example");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let config = Config {
            session: SessionConfig {
                reconnect_interval_ms: 0,
                streamer_grace_period_ms: 0,
            },
            notifications: NotificationConfig {
                package_name: " ".to_string(),
                ..NotificationConfig::default()
            },
            logging: LoggingConfig {
                format: "xml".to_string(),
                ..LoggingConfig::default()
            },
            sdk: SdkConfig::default(),
        };

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("reconnect_interval_ms")));
        assert!(errors.iter().any(|e| e.contains("logging.format")));
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "session:\n  reconnect_interval_ms: 500\nlogging:\n  format: json\n"
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.session.reconnect_interval_ms, 500);
        // Unset fields keep their defaults
        assert_eq!(config.session.streamer_grace_period_ms, 10_000);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::from_file("/nonexistent/raydio.yaml").unwrap();
        assert_eq!(config.sdk.club_id, 235_617);
    }
}
