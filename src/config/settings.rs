//! Settings loading from config.toml
//!
//! Every field carries a serde default, so a partial file (or no file at all) still
//! produces a usable configuration. The Discord token never lives here; it is read
//! from the environment right before the client starts.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "BEASTIARY_CONFIG";

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Settings {
    /// Defaults applied to every interactive message
    pub interactive: InteractiveSettings,
    /// Bot client settings
    pub bot: BotSettings,
}

/// Defaults for interactive messages.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InteractiveSettings {
    /// How long a message stays live without presses, in milliseconds
    pub lifetime_ms: u64,
    /// Whether a button press restarts the lifetime countdown
    pub reset_timer_on_button_press: bool,
    /// Text appended to the footer on deactivation
    pub deactivation_text: String,
    /// Lifetime used by paged messages, in milliseconds
    pub page_lifetime_ms: u64,
}

impl Default for InteractiveSettings {
    fn default() -> Self {
        Self {
            lifetime_ms: 60_000,
            reset_timer_on_button_press: true,
            deactivation_text: "(message deactivated)".to_string(),
            page_lifetime_ms: 300_000,
        }
    }
}

impl InteractiveSettings {
    /// Default lifetime as a `Duration`.
    #[must_use]
    pub const fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }

    /// Paged message lifetime as a `Duration`.
    #[must_use]
    pub const fn page_lifetime(&self) -> Duration {
        Duration::from_millis(self.page_lifetime_ms)
    }
}

/// Bot client settings.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BotSettings {
    /// Prefix for text commands
    pub prefix: String,
    /// Guild to register slash commands in during development
    pub dev_guild_id: Option<u64>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            prefix: "b/".to_string(),
            dev_guild_id: None,
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read (`Io`)
/// - The TOML syntax is invalid (`Config`)
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref)
        .inspect_err(|e| error!("Failed to read config file {}: {}", path_ref.display(), e))?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path_ref.display()),
    })
}

/// Loads settings from `$BEASTIARY_CONFIG` or `./config.toml`.
///
/// A missing file is not an error: the defaults are used instead.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if !Path::new(&path).exists() {
        info!("No config file at {path}, using default settings.");
        return Ok(Settings::default());
    }
    load_settings(&path)
}
