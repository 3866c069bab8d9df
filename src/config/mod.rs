mod settings;

pub use settings::{DefaultsConfig, LoggingConfig, Settings, ThemeConfig};
