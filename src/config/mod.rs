//! Configuration management for `plantlink.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── render     # [render]
//! │   └── serve      # [serve]
//! ├── error          # ConfigError
//! ├── util           # config file lookup, URL checks
//! └── mod.rs         # Config (this file)
//! ```
//!
//! The file is optional. Values are resolved in order: built-in defaults,
//! then `plantlink.toml`, then command-line flags.

mod error;
pub mod section;
mod util;

pub use error::ConfigError;
pub use section::{RenderConfig, ServeConfig};

use crate::{
    cli::{BuildArgs, Cli, Commands, ServeArgs},
    log,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::{find_config_file, is_http_url};

/// Default config file name, searched upward from the working directory.
pub const CONFIG_FILE: &str = "plantlink.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing plantlink.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Path of the loaded config file, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Render service settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl Config {
    /// Load configuration for a CLI invocation.
    ///
    /// An explicit `--config` must exist; otherwise `plantlink.toml` is
    /// searched upward from cwd and defaults are used when none is found.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = match &cli.config {
            Some(path) if path.is_file() => Some(path.clone()),
            Some(path) => return Err(ConfigError::NotFound(path.clone()).into()),
            None => {
                let cwd =
                    std::env::current_dir().context("Failed to get current working directory")?;
                find_config_file(&cwd, Path::new(CONFIG_FILE))
            }
        };

        let mut config = match &config_path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.config_path = config_path;

        config.apply_command_options(&cli.command);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        crate::debug!("config"; "loaded {}", path.display());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        log!("warning"; "unknown fields in {}, ignoring: {}", path.display(), fields.join(", "));
    }

    /// Let command-line flags override file values.
    fn apply_command_options(&mut self, command: &Commands) {
        match command {
            Commands::Build { args } => self.apply_build_args(args),
            Commands::Serve { args } => self.apply_serve_args(args),
            Commands::Version => {}
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        if let Some(format) = args.format {
            self.render.format = format;
        }
        if let Some(style) = args.style {
            self.render.style = style;
        }
        if let Some(server) = &args.server {
            self.render.server.clone_from(server);
        }
    }

    fn apply_serve_args(&mut self, args: &ServeArgs) {
        if let Some(port) = args.port {
            self.serve.port = port;
        }
        if let Some(interface) = args.interface {
            self.serve.interface = interface;
        }
        if let Some(server) = &args.server {
            self.render.server.clone_from(server);
        }
        if let Some(timeout) = args.poll_timeout {
            self.serve.poll_timeout = timeout;
        }
    }

    /// Check values that parse fine but can't work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.render.server) {
            return Err(ConfigError::validation(
                "render.server",
                format!("`{}` is not an http(s) URL", self.render.server),
            ));
        }
        if self.render.timeout == 0 {
            return Err(ConfigError::validation(
                "render.timeout",
                "must be greater than 0",
            ));
        }
        if self.serve.poll_timeout == 0 {
            return Err(ConfigError::validation(
                "serve.poll_timeout",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> Config {
    let (parsed, ignored) = Config::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
