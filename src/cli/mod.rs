//! Command-line interface module.

mod args;
pub mod build;
pub mod serve;

pub use args::{BuildArgs, Cli, Commands, ServeArgs};

/// `plantlink version`
pub fn print_version() {
    println!("plantlink version is: {}", env!("CARGO_PKG_VERSION"));
}
