//! List resolved resource names.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::CommandContext;
use crate::inject::ResolvedResource;

/// List resolved resource names
#[derive(Args, Debug)]
pub struct NamesCommand {
    /// Output format: table or json
    #[arg(short = 'f', long, default_value = "table")]
    format: String,
}

impl NamesCommand {
    /// Execute the names command.
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        if !matches!(self.format.as_str(), "table" | "json") {
            bail!("Invalid format '{}'. Valid formats are: table, json", self.format);
        }

        let context = CommandContext::load(config).await?;
        let state = context.plugin.coordinator().ensure_injected().await?;

        if self.format == "json" {
            println!("{}", serde_json::to_string_pretty(state.resources())?);
        } else {
            print_table(state.resources());
        }
        Ok(())
    }
}

fn print_table(resources: &[ResolvedResource]) {
    if resources.is_empty() {
        println!("No named resources found.");
        return;
    }

    let id_width = column_width("Logical ID", resources.iter().map(|r| r.logical_id.len()));
    let type_width = column_width("Type", resources.iter().map(|r| r.resource_type.len()));
    let key_width = column_width("Env Key", resources.iter().map(|r| r.env_key.len()));

    println!(
        "{:<id_width$}  {:<type_width$}  {:<key_width$}  {}",
        "Logical ID".cyan().bold(),
        "Type".cyan().bold(),
        "Env Key".cyan().bold(),
        "Name".cyan().bold()
    );
    println!("{}", "-".repeat(id_width + type_width + key_width + 12).bright_black());
    for resource in resources {
        println!(
            "{:<id_width$}  {:<type_width$}  {:<key_width$}  {}",
            resource.logical_id,
            resource.resource_type,
            resource.env_key.yellow(),
            resource.name.green()
        );
    }
    println!();
    println!("{}: {} resources", "Total".green().bold(), resources.len());
}

fn column_width(header: &str, lengths: impl Iterator<Item = usize>) -> usize {
    lengths.fold(header.len(), usize::max)
}
