// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of ChoreBoard Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// ChoreBoard backend connection
    pub backend: BackendConfig,

    /// Polling and monitoring configuration
    #[serde(default)]
    pub system: SystemConfig,

    /// Local HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the ChoreBoard instance (e.g., "http://192.168.1.10:8000")
    pub url: String,

    /// API username the bridge authenticates as
    pub username: String,

    /// Shared HMAC secret for token generation
    pub secret_key: String,
}

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Poll interval (seconds)
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Usernames to build per-user views and arcade state for.
    /// Accepts a TOML list or a comma-separated string (HA addon options).
    #[serde(default, deserialize_with = "monitored_users_list")]
    pub monitored_users: Vec<String>,

    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Local HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on (8099 for HA Ingress)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_scan_interval() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_port() -> u16 {
    8099
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
            monitored_users: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Split a comma-separated username list, dropping empty segments.
pub fn parse_monitored_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn monitored_users_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrString {
        List(Vec<String>),
        CommaSeparated(String),
    }

    Ok(match ListOrString::deserialize(deserializer)? {
        ListOrString::List(list) => list,
        ListOrString::CommaSeparated(value) => parse_monitored_list(&value),
    })
}

/// Load configuration with environment variable fallback for every
/// backend field, so the bridge runs with no config file at all.
pub fn load_config_with_fallback() -> Result<AppConfig> {
    AppConfig::load()
}

impl AppConfig {
    /// Load configuration from HA addon options or config file
    pub fn load() -> Result<Self> {
        // Explicit path wins
        if let Ok(path) = std::env::var("CHOREBOARD_CONFIG") {
            let config_str = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file '{path}'"))?;
            let mut config: AppConfig = toml::from_str(&config_str)
                .with_context(|| format!("Failed to parse config file '{path}'"))?;
            info!("✅ Loaded configuration from {path}");
            config.apply_env_overrides();
            config.validate()?;
            return Ok(config);
        }

        // Try HA addon options (/data/options.json)
        if let Ok(options_str) = std::fs::read_to_string("/data/options.json") {
            let mut config: AppConfig =
                serde_json::from_str(&options_str).context("Failed to parse HA addon options")?;
            info!("✅ Loaded configuration from HA addon options");
            config.apply_env_overrides();
            config.validate()?;
            return Ok(config);
        }

        // Try config.toml for development
        if let Ok(config_str) = std::fs::read_to_string("config.toml") {
            let mut config: AppConfig =
                toml::from_str(&config_str).context("Failed to parse config.toml")?;
            info!("✅ Loaded configuration from config.toml");
            config.apply_env_overrides();
            config.validate()?;
            return Ok(config);
        }

        // Environment variables only
        warn!("No configuration file found, building configuration from environment");
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration purely from environment variables
    fn from_env() -> Result<Self> {
        let url = std::env::var("CHOREBOARD_URL")
            .context("CHOREBOARD_URL is required when no config file exists")?;
        let username = std::env::var("CHOREBOARD_USERNAME")
            .context("CHOREBOARD_USERNAME is required when no config file exists")?;
        let secret_key = std::env::var("CHOREBOARD_SECRET_KEY")
            .context("CHOREBOARD_SECRET_KEY is required when no config file exists")?;

        let mut config = Self {
            backend: BackendConfig {
                url,
                username,
                secret_key,
            },
            system: SystemConfig::default(),
            server: ServerConfig::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment variables override file values field by field
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override logic with an injected variable lookup so tests run
    /// without touching the process environment.
    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(url) = get("CHOREBOARD_URL") {
            self.backend.url = url;
        }
        if let Some(username) = get("CHOREBOARD_USERNAME") {
            self.backend.username = username;
        }
        if let Some(secret_key) = get("CHOREBOARD_SECRET_KEY") {
            self.backend.secret_key = secret_key;
        }
        if let Some(users) = get("CHOREBOARD_MONITORED_USERS") {
            self.system.monitored_users = parse_monitored_list(&users);
        }
        if let Some(interval) = get("CHOREBOARD_SCAN_INTERVAL_SECS")
            && let Ok(secs) = interval.parse::<u64>()
        {
            self.system.scan_interval_secs = secs;
        }
        if let Some(port) = get("CHOREBOARD_PORT")
            && let Ok(port) = port.parse::<u16>()
        {
            self.server.port = port;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend.url.is_empty() {
            anyhow::bail!("backend.url cannot be empty");
        }
        if !self.backend.url.starts_with("http://") && !self.backend.url.starts_with("https://") {
            anyhow::bail!(
                "backend.url must start with http:// or https://, got '{}'",
                self.backend.url
            );
        }
        if self.backend.username.is_empty() {
            anyhow::bail!("backend.username cannot be empty");
        }
        if self.backend.secret_key.is_empty() {
            anyhow::bail!("backend.secret_key cannot be empty");
        }

        if self.system.scan_interval_secs < 5 {
            anyhow::bail!("system.scan_interval_secs must be at least 5 seconds");
        }
        if self.system.scan_interval_secs > 600 {
            warn!(
                "scan_interval_secs is very high ({}s), data will be stale between polls",
                self.system.scan_interval_secs
            );
        }
        if self.system.monitored_users.is_empty() {
            warn!("No monitored users configured, per-user views and arcade state stay empty");
        }

        if self.server.port == 0 {
            anyhow::bail!("server.port cannot be 0");
        }

        Ok(())
    }

    /// Get scan interval as Duration
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.system.scan_interval_secs)
    }
}
