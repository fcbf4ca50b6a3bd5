use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub paywall: PaywallConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub database_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            database_path: "data/paywall.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaywallConfig {
    /// Rolling window after which free-tier usage counters read as zero.
    pub usage_window_hours: i64,
}

impl Default for PaywallConfig {
    fn default() -> Self {
        Self {
            usage_window_hours: 24,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        match Self::find_config_file() {
            Some(config_path) => {
                let config_content = std::fs::read_to_string(&config_path)?;
                let settings: Settings = toml::from_str(&config_content)?;
                Ok(settings)
            }
            None => Ok(Settings::default()),
        }
    }

    fn find_config_file() -> Option<String> {
        let possible_names = ["custom-config.toml", "config.toml"];

        for name in &possible_names {
            if Path::new(name).exists() {
                return Some(name.to_string());
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.server.port, 8000);
        assert_eq!(s.paywall.usage_window_hours, 24);
        assert_eq!(s.logging.database_path, "data/paywall.db");
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let s: Settings = toml::from_str("[server]\nhost = \"127.0.0.1\"\nport = 9000\n").unwrap();
        assert_eq!(s.server.host, "127.0.0.1");
        assert_eq!(s.server.port, 9000);
        assert_eq!(s.paywall.usage_window_hours, 24);
    }
}
