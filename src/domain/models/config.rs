//! Application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure for the reconciler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Reference resolution settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// A2A agent settings
    #[serde(default)]
    pub a2a: A2aConfig,

    /// Tool validation settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Reference resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResolverConfig {
    /// Timeout for each backing store call, in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Reject model/engine references that omit their namespace
    #[serde(default)]
    pub require_explicit_namespace: bool,

    /// Model used when an agent has no modelRef
    #[serde(default = "default_model")]
    pub default_model: Option<String>,
}

const fn default_timeout_ms() -> u64 {
    5000
}

#[allow(clippy::unnecessary_wraps)]
fn default_model() -> Option<String> {
    Some("default".to_string())
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            require_explicit_namespace: false,
            default_model: default_model(),
        }
    }
}

/// A2A configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct A2aConfig {
    /// Execution engines that run agents on external A2A servers
    #[serde(default = "default_a2a_engines")]
    pub engines: Vec<String>,
}

fn default_a2a_engines() -> Vec<String> {
    vec!["a2a".to_string()]
}

impl Default for A2aConfig {
    fn default() -> Self {
        Self {
            engines: default_a2a_engines(),
        }
    }
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolsConfig {
    /// Names accepted for `built-in` tools
    #[serde(default = "default_built_in_tools")]
    pub built_in: Vec<String>,
}

fn default_built_in_tools() -> Vec<String> {
    vec!["noop".to_string(), "terminate".to_string()]
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            built_in: default_built_in_tools(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log file rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
