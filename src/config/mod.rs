/// Settings loading from config.toml
pub mod settings;

pub use settings::{BotSettings, InteractiveSettings, Settings, load_default_settings, load_settings};
