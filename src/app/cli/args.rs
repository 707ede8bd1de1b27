//! Core CLI arguments structure and basic functionality
//!
//! Flags cover logging, configuration file discovery and queue tuning.
//! Values resolve in the usual order: CLI flag, then configuration file,
//! then built-in default.

use crate::app::cli::config::FileConfig;
use crate::queue::QueueConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Resolved logging settings after merging CLI, file and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
    pub format: String,
    pub file: Option<String>,
    pub color: bool,
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "dispatchq")]
#[command(about = "Priority/delay-aware work queue demo broker")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<String>,

    /// Force colored log output
    #[arg(long = "color")]
    pub color: bool,

    /// Disable colored log output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Delivery attempts before a failing message is dead-lettered
    #[arg(long = "max-retries", value_name = "N")]
    pub max_retries: Option<u32>,

    /// Visibility timeout in milliseconds
    #[arg(long = "visibility-timeout-ms", value_name = "MS")]
    pub visibility_timeout_ms: Option<u64>,

    /// Base retry backoff in milliseconds (doubles per attempt)
    #[arg(long = "retry-backoff-ms", value_name = "MS")]
    pub retry_backoff_ms: Option<u64>,

    /// Requeue delay after a visibility timeout, in milliseconds
    #[arg(long = "reclaim-delay-ms", value_name = "MS")]
    pub reclaim_delay_ms: Option<u64>,
}

impl Args {
    /// Queue tuning merged from CLI flags, file config and defaults
    pub fn queue_config(&self, file: &FileConfig) -> QueueConfig {
        let defaults = QueueConfig::default();
        QueueConfig {
            max_retries: self
                .max_retries
                .or(file.max_retries)
                .unwrap_or(defaults.max_retries),
            visibility_timeout: merge_millis(
                self.visibility_timeout_ms,
                file.visibility_timeout_ms,
                defaults.visibility_timeout,
            ),
            retry_backoff: merge_millis(
                self.retry_backoff_ms,
                file.retry_backoff_ms,
                defaults.retry_backoff,
            ),
            reclaim_delay: merge_millis(
                self.reclaim_delay_ms,
                file.reclaim_delay_ms,
                defaults.reclaim_delay,
            ),
        }
    }

    /// Logging settings merged from CLI flags and file config
    pub fn log_settings(&self, file: &FileConfig) -> LogSettings {
        LogSettings {
            level: self
                .log_level
                .clone()
                .or_else(|| file.log_level.clone())
                .unwrap_or_else(|| "info".to_string()),
            format: self
                .log_format
                .clone()
                .or_else(|| file.log_format.clone())
                .unwrap_or_else(|| "text".to_string()),
            file: self.log_file.clone().or_else(|| file.log_file.clone()),
            color: self.color && !self.no_color,
        }
    }
}

fn merge_millis(cli: Option<u64>, file: Option<u64>, default: Duration) -> Duration {
    cli.or(file).map(Duration::from_millis).unwrap_or(default)
}
