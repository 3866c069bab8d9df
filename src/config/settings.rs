use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

use crate::notification::Status;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values applied to notification fields the caller left unset
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub status: Status,
    #[serde(default = "default_dismissible")]
    pub dismissible: bool,
    /// Auto-dismiss delay in milliseconds (0 disables auto-dismiss)
    #[serde(default = "default_dismiss_after_ms")]
    pub dismiss_after_ms: i64,
}

/// Class names used when rendering a notification
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeConfig {
    #[serde(default = "default_main_class")]
    pub main: String,
    #[serde(default = "default_icon_class")]
    pub icon: String,
    #[serde(default = "default_title_class")]
    pub title: String,
    #[serde(default)]
    pub message: String,
}

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_dismissible() -> bool {
    true
}

fn default_dismiss_after_ms() -> i64 {
    5000 // 5 seconds
}

fn default_main_class() -> String {
    "notification".to_string()
}

fn default_icon_class() -> String {
    "fa notification-icon".to_string()
}

fn default_title_class() -> String {
    "notification-title".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("defaults.status", "info")?
            .set_default("defaults.dismissible", true)?
            .set_default("defaults.dismiss_after_ms", 5000)?
            .set_default("theme.main", default_main_class())?
            .set_default("theme.icon", default_icon_class())?
            .set_default("theme.title", default_title_class())?
            .set_default("theme.message", "")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // TOAST_DEFAULTS__DISMISS_AFTER_MS, TOAST_THEME__MAIN, etc.
            .add_source(
                Environment::with_prefix("TOAST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            status: Status::default(),
            dismissible: default_dismissible(),
            dismiss_after_ms: default_dismiss_after_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            main: default_main_class(),
            icon: default_icon_class(),
            title: default_title_class(),
            message: String::new(),
        }
    }
}
