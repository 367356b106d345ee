//! Render the service definition with names injected.
//!
//! Runs the validate hook (which injects names), substitutes every variable outside
//! `resources`, and prints the result or writes it to a file.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use colored::Colorize;
use tokio::fs;

use super::CliConfig;
use super::common::CommandContext;
use crate::hooks::LifecycleEvent;

/// Render the service definition with names injected
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Output format: yaml or json
    #[arg(short = 'f', long, default_value = "yaml")]
    format: String,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

impl RenderCommand {
    /// Execute the render command.
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        self.validate_arguments()?;
        let context = CommandContext::load(config).await?;

        context
            .plugin
            .dispatch(LifecycleEvent::AwsCommonValidate.as_str(), &mut std::io::sink())
            .await?;
        let service = context.plugin.rendered_service().await?;

        let rendered = match self.format.as_str() {
            "json" => service.to_json_string()?,
            _ => service.to_yaml_string()?,
        };

        match &self.output {
            Some(path) => {
                fs::write(path, rendered.as_bytes())
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if config.log_level.is_some() {
                    eprintln!("{} {}", "✓ Rendered".green(), path.display());
                }
            }
            None => print!("{rendered}"),
        }
        Ok(())
    }

    fn validate_arguments(&self) -> Result<()> {
        if !matches!(self.format.as_str(), "yaml" | "json") {
            bail!("Invalid format '{}'. Valid formats are: yaml, json", self.format);
        }
        Ok(())
    }
}
