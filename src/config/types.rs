//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::defaults::{
    default_author, default_capabilities, default_log_level, default_mention, default_name,
    default_page_budget, default_prefix, default_true,
};
use crate::command::MentionSetting;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// How lines are recognized as commands.
    #[serde(default)]
    pub reader: ReaderConfig,
    /// Built-in converter options.
    #[serde(default)]
    pub conversion: ConversionConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// The interactive console binary.
    #[serde(default)]
    pub console: ConsoleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

/// Command recognition settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ReaderConfig {
    /// Bot name, used as the help title.
    #[serde(default = "default_name")]
    pub name: String,
    /// Text every command line starts with.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Mention requirement for commands that do not set their own.
    #[serde(default = "default_mention")]
    pub mention: MentionSetting,
    /// Register `help` and `helpwith`.
    #[serde(default = "default_true")]
    pub default_help: bool,
    /// Text shown under the title on every help page.
    #[serde(default)]
    pub help_description: String,
    /// Characters per help page, header included.
    #[serde(default = "default_page_budget")]
    pub help_page_budget: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            prefix: default_prefix(),
            mention: default_mention(),
            default_help: true,
            help_description: String::new(),
            help_page_budget: default_page_budget(),
        }
    }
}

/// Built-in converter options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionConfig {
    /// `char` parameters take the first character of longer tokens.
    #[serde(default)]
    pub char_drop_silently: bool,
    /// Extra words read as `true` by `bool` parameters.
    #[serde(default)]
    pub true_words: Vec<String>,
    /// Extra words read as `false` by `bool` parameters.
    #[serde(default)]
    pub false_words: Vec<String>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Settings for the interactive console binary.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Author name given to console lines.
    #[serde(default = "default_author")]
    pub author: String,
    /// Capabilities the console user holds.
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            author: default_author(),
            capabilities: default_capabilities(),
        }
    }
}
