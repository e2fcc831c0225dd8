//! Render service links and fetching.
//!
//! A render service accepts `{server}/{format}/{token}` where `token` is the
//! PlantUML text encoding of the diagram source.

mod fetch;
#[cfg(test)]
pub(crate) mod stub;

pub use fetch::{FetchError, RenderClient};

use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;

/// Default public render service.
pub const DEFAULT_SERVER: &str = "https://www.plantuml.com/plantuml";

/// Output format requested from the render service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Raster image
    Png,
    /// Vector image
    #[default]
    Svg,
    /// ASCII art
    Txt,
}

impl Format {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Txt => "txt",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `build` emits its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Fetch the render and write it next to the source file
    #[default]
    File,
    /// Print the render link
    Link,
    /// Fetch the render and write it to stdout
    Out,
}

impl Style {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Link => "link",
            Self::Out => "out",
        }
    }

    /// Whether this style needs the render service.
    pub const fn fetches(self) -> bool {
        matches!(self, Self::File | Self::Out)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build `{server}/{format}/{token}`.
pub fn render_link(server: &str, format: Format, token: &str) -> String {
    debug_assert!(crate::encode::is_token(token), "not an encoded token: {token}");
    format!("{}/{}/{}", server.trim_end_matches('/'), format, token)
}
