//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::render::{Format, Style};

/// Compiles PlantUML files
#[derive(Parser, Debug, Clone)]
#[command(name = "plantlink", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: plantlink.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compiles PlantUML files
    ///
    /// Reads the diagram from stdin when no files are given.
    #[command(
        visible_alias = "b",
        after_help = "Examples:\n  plantlink build example.puml\n  plantlink build -f png --style link example.puml"
    )]
    Build {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Starts a web server which serves compiled UML files on a live-reloading HTML page
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },

    /// Show current version
    Version,
}

/// `build` arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// PlantUML files to compile
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// The format of the compiled files
    #[arg(short, long, value_enum)]
    pub format: Option<Format>,

    /// The style in which to compile the files
    #[arg(long, value_enum)]
    pub style: Option<Style>,

    /// Render server URL; must support "<server_url>/<format>/<plantuml_text_encoding>"
    #[arg(long, value_hint = clap::ValueHint::Url)]
    pub server: Option<String>,
}

/// `serve` arguments.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// PlantUML files to watch and serve
    #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// The port to use to serve the HTML page
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(short, long)]
    pub interface: Option<IpAddr>,

    /// Render server URL used for the page's images and links
    #[arg(long, value_hint = clap::ValueHint::Url)]
    pub server: Option<String>,

    /// Seconds a reload poll is held open before answering 304
    #[arg(long, value_name = "SECS")]
    pub poll_timeout: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::parse_from([
            "plantlink", "build", "-f", "png", "--style", "link", "--server", "http://x", "a.puml",
        ]);
        let Commands::Build { args } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.format, Some(Format::Png));
        assert_eq!(args.style, Some(Style::Link));
        assert_eq!(args.server.as_deref(), Some("http://x"));
        assert_eq!(args.files, [PathBuf::from("a.puml")]);
    }

    #[test]
    fn test_parse_build_without_files() {
        let cli = Cli::parse_from(["plantlink", "b"]);
        let Commands::Build { args } = cli.command else {
            panic!("expected build");
        };
        assert!(args.files.is_empty());
        assert!(args.format.is_none());
        assert!(args.style.is_none());
    }

    #[test]
    fn test_parse_serve_port() {
        let cli = Cli::parse_from(["plantlink", "serve", "-p", "9000", "a.puml", "b.puml"]);
        let Commands::Serve { args } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.files.len(), 2);
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["plantlink", "build", "-f", "pdf"]).is_err());
    }

    #[test]
    fn test_parse_version_and_global_flags() {
        let cli = Cli::parse_from(["plantlink", "version", "-v"]);
        assert!(matches!(cli.command, Commands::Version));
        assert!(cli.verbose);
    }
}
