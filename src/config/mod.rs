//! # Configuration Management Module
//!
//! TOML configuration for the discussion board, loaded once at startup.
//!
//! - [`DiscussionConfig`] - page title, URL roots, listing and form limits
//! - [`StorageConfig`] - location of the board file
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use discussion::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("Topics per page: {}", config.discussion.topics_per_page);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [discussion]
//! title = "Discussion"
//! topics_per_page = 20
//! base_href = "/discussion"
//! admin_href = "/admin/discussion"
//! max_body_bytes = 65536
//!
//! [storage]
//! board_file = "./data/board.json"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key has a default, so a partial file (or an empty section) is accepted.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub discussion: DiscussionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_topics_per_page")]
    pub topics_per_page: usize,
    /// Root of the public pages.
    #[serde(default = "default_base_href")]
    pub base_href: String,
    /// Root of the administration pages.
    #[serde(default = "default_admin_href")]
    pub admin_href: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_title() -> String {
    "Discussion".to_string()
}

fn default_topics_per_page() -> usize {
    20
}

fn default_base_href() -> String {
    "/discussion".to_string()
}

fn default_admin_href() -> String {
    "/admin/discussion".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for DiscussionConfig {
    fn default() -> Self {
        DiscussionConfig {
            title: default_title(),
            topics_per_page: default_topics_per_page(),
            base_href: default_base_href(),
            admin_href: default_admin_href(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_board_file")]
    pub board_file: String,
}

fn default_board_file() -> String {
    "./data/board.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            board_file: default_board_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.discussion.topics_per_page == 0 {
            return Err(anyhow!("discussion.topics_per_page must be at least 1"));
        }
        for (key, href) in [
            ("discussion.base_href", &self.discussion.base_href),
            ("discussion.admin_href", &self.discussion.admin_href),
        ] {
            if !href.starts_with('/') || href.len() < 2 || href.ends_with('/') {
                return Err(anyhow!(
                    "{} must be a path below '/' without a trailing '/': {}",
                    key,
                    href
                ));
            }
        }
        Ok(())
    }
}
