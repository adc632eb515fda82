//! Settings parser for loading and layering configuration.
//!
//! Settings come from an optional YAML file, then environment variables,
//! then command-line flags (applied by the caller). A missing settings file
//! is not an error: every field has a default.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result, VlanSyncError};

use super::spec::Settings;

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "VLANSYNC_CONFIG";

/// Environment variable holding the login username.
pub const USERNAME_ENV: &str = "VLANSYNC_USERNAME";

/// Environment variable holding the login password.
pub const PASSWORD_ENV: &str = "VLANSYNC_PASSWORD";

/// Environment variable holding the enable secret.
pub const SECRET_ENV: &str = "VLANSYNC_ENABLE_SECRET";

/// Configuration parser for loading run settings.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for locating `.env`.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path used to locate `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads settings from a YAML file.
    ///
    /// A relative `inventory` path is resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Settings> {
        let path = path.as_ref();
        info!("Loading settings from: {}", path.display());

        if !path.exists() {
            return Err(VlanSyncError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::parse(
                "settings",
                format!("Failed to read file: {e}"),
                Some(path.display().to_string()),
            )
        })?;

        let mut settings = self.parse_yaml(&content, Some(path))?;

        if settings.inventory.is_relative()
            && let Some(parent) = path.parent()
        {
            settings.inventory = parent.join(&settings.inventory);
        }

        Ok(settings)
    }

    /// Parses settings from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<Settings> {
        debug!("Parsing YAML settings");

        // An empty file means "all defaults"
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        let settings: Settings = serde_yaml::from_str(content).map_err(|e| {
            ConfigError::parse(
                "settings",
                format!("YAML parse error: {e}"),
                source.map(|p| p.display().to_string()),
            )
        })?;

        Ok(settings)
    }

    /// Resolves settings: an explicit file, else the nearest `vlansync.yaml`,
    /// else defaults; environment overrides are applied on top.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file exists but is invalid, or an
    /// environment override cannot be parsed.
    pub fn resolve(&self, explicit: Option<&Path>) -> Result<Settings> {
        let found = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file("."),
        };

        let mut settings = match found {
            Some(path) => self.load_file(path)?,
            None => {
                debug!("No settings file found, using defaults");
                Settings::default()
            }
        };

        Self::apply_env_overrides(&mut settings, |name| std::env::var(name).ok())?;
        Ok(settings)
    }

    /// Applies environment variable overrides to the settings.
    ///
    /// `lookup` resolves a variable name to its value.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric override is not a number.
    pub fn apply_env_overrides(
        settings: &mut Settings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(inventory) = lookup("VLANSYNC_INVENTORY") {
            debug!("Overriding inventory from environment");
            settings.inventory = PathBuf::from(inventory);
        }

        if let Some(port) = lookup("VLANSYNC_PORT") {
            debug!("Overriding session.port from environment");
            settings.session.port = parse_env("VLANSYNC_PORT", &port)?;
        }

        if let Some(secs) = lookup("VLANSYNC_CONNECT_TIMEOUT") {
            debug!("Overriding session.connect_timeout_secs from environment");
            settings.session.connect_timeout_secs = parse_env("VLANSYNC_CONNECT_TIMEOUT", &secs)?;
        }

        if let Some(secs) = lookup("VLANSYNC_SESSION_TIMEOUT") {
            debug!("Overriding session.session_timeout_secs from environment");
            settings.session.session_timeout_secs = parse_env("VLANSYNC_SESSION_TIMEOUT", &secs)?;
        }

        if let Some(workers) = lookup("VLANSYNC_WORKERS") {
            debug!("Overriding run.workers from environment");
            settings.run.workers = parse_env("VLANSYNC_WORKERS", &workers)?;
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ConfigError::parse(
                    ".env",
                    format!("Failed to load .env file: {e}"),
                    Some(env_path.display().to_string()),
                )
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }

    /// Reads a non-empty environment variable.
    #[must_use]
    pub fn env_var(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        VlanSyncError::Config(ConfigError::validation(
            format!("{name} must be a number, got '{value}'"),
            name,
        ))
    })
}

/// Default settings file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["vlansync.yaml", "vlansync.yml"];

/// Finds the settings file in the given directory or its parents.
#[must_use]
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut current = start_dir.as_ref().to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found settings file: {}", config_path.display());
                return Some(config_path);
            }
        }

        if !current.pop() {
            return None;
        }
    }
}
