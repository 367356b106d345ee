//! Command-line interface for resnames.
//!
//! # Available Commands
//!
//! - `env` - Print the final merged environment as `KEY=value` lines
//! - `render` - Print (or write) the service definition with names injected and
//!   variables resolved
//! - `resolve` - Resolve `name:` and `topic:` addresses
//! - `names` - List every named resource with its environment key
//!
//! # Global Options
//!
//! All commands support these global options:
//! - `--service <PATH>` - Service definition file (default: discovered in the current
//!   directory)
//! - `--stage <STAGE>` / `--region <REGION>` - Override provider settings
//! - `--config <PATH>` - Global configuration file
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - No logging
//!
//! # Examples
//!
//! ```bash
//! resnames env
//! resnames --stage prod render --format json --output build/service.json
//! resnames resolve name:UserTable topic:OrderTopic.arn
//! resnames names --format json
//! ```

pub mod common;
mod env;
mod names;
mod render;
mod resolve;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Overrides;

/// Runtime configuration derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log level for this crate; `None` disables logging
    pub log_level: Option<String>,
    /// Explicit service definition path
    pub service_path: Option<PathBuf>,
    /// Explicit global config path
    pub config_path: Option<PathBuf>,
    /// Stage and region overrides
    pub overrides: Overrides,
}

impl CliConfig {
    /// Install the tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` wins over the level chosen by `--verbose`/`--quiet`. Safe to call
    /// more than once; later calls are ignored.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = &self.log_level {
            EnvFilter::new(format!("resnames_cli={level}"))
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .without_time()
            .with_target(false)
            .try_init();
    }
}

/// Main CLI structure for resnames
#[derive(Parser)]
#[command(
    name = "resnames",
    about = "Deterministic resource names for serverless services",
    version,
    long_about = "resnames computes conventional physical names for the resources declared in a \
                  service definition, writes them into the resources, and exposes them as \
                  environment variables."
)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to the service definition
    #[arg(long, global = true, value_name = "PATH")]
    service: Option<PathBuf>,

    /// Deployment stage (overrides provider.stage)
    #[arg(short, long, global = true)]
    stage: Option<String>,

    /// Deployment region (overrides provider.region)
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Path to the global configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print all environment variables
    Env(env::EnvCommand),

    /// Render the service definition with names injected
    Render(render::RenderCommand),

    /// Resolve name: and topic: references
    Resolve(resolve::ResolveCommand),

    /// List resolved resource names
    Names(names::NamesCommand),
}

impl Cli {
    /// Execute the selected command.
    ///
    /// # Errors
    ///
    /// Returns the command's failure; `main` turns it into a user-facing message.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Derive the runtime configuration from the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            service_path: self.service.clone(),
            config_path: self.config.clone(),
            overrides: Overrides {
                stage: self.stage.clone(),
                region: self.region.clone(),
            },
        }
    }

    /// Execute with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns the command's failure.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Env(cmd) => cmd.execute(&config).await,
            Commands::Render(cmd) => cmd.execute(&config).await,
            Commands::Resolve(cmd) => cmd.execute(&config).await,
            Commands::Names(cmd) => cmd.execute(&config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_levels() {
        let cli = Cli::parse_from(["resnames", "env"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("info"));

        let cli = Cli::parse_from(["resnames", "-v", "env"]);
        assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));

        let cli = Cli::parse_from(["resnames", "env", "--quiet"]);
        assert_eq!(cli.build_config().log_level, None);
    }

    #[test]
    fn test_overrides_are_collected() {
        let cli = Cli::parse_from(["resnames", "--stage", "prod", "names", "--region", "eu-west-1"]);
        let config = cli.build_config();
        assert_eq!(config.overrides.stage.as_deref(), Some("prod"));
        assert_eq!(config.overrides.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["resnames", "-v", "-q", "env"]).is_err());
    }

    #[test]
    fn test_resolve_requires_an_address() {
        assert!(Cli::try_parse_from(["resnames", "resolve"]).is_err());
    }
}
