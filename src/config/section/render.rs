//! `[render]` section configuration.
//!
//! Where diagrams are rendered and what `build` produces by default.
//!
//! # Example
//!
//! ```toml
//! [render]
//! server = "https://www.plantuml.com/plantuml"
//! format = "png"      # png | svg | txt
//! style = "link"      # file | link | out
//! timeout = 30        # seconds per render fetch
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::render::{DEFAULT_SERVER, Format, Style};

/// Render service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Base URL; links are `{server}/{format}/{token}`.
    pub server: String,
    pub format: Format,
    pub style: Style,
    /// Render fetch timeout in seconds.
    pub timeout: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            format: Format::default(),
            style: Style::default(),
            timeout: 30,
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_render_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.render.server, DEFAULT_SERVER);
        assert_eq!(config.render.format, Format::Svg);
        assert_eq!(config.render.style, Style::File);
        assert_eq!(config.render.timeout().as_secs(), 30);
    }

    #[test]
    fn test_render_config_values() {
        let config = test_parse_config(
            "[render]\nserver = \"http://localhost:8000/plantuml\"\nformat = \"png\"\nstyle = \"link\"",
        );
        assert_eq!(config.render.server, "http://localhost:8000/plantuml");
        assert_eq!(config.render.format, Format::Png);
        assert_eq!(config.render.style, Style::Link);
    }

    #[test]
    fn test_render_config_rejects_unknown_format() {
        let result: Result<crate::config::Config, _> = toml::from_str("[render]\nformat = \"pdf\"");
        assert!(result.is_err());
    }
}
