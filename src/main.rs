//! resnames CLI entry point
//!
//! Parses arguments, runs the selected command and turns failures into a colored
//! message with a suggestion. Commands:
//! - `env` - print the merged environment
//! - `render` - print the service definition with names injected
//! - `resolve` - resolve `name:` and `topic:` addresses
//! - `names` - list named resources

use anyhow::Result;
use clap::Parser;
use resnames_cli::cli;
use resnames_cli::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
