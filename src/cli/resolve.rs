//! Resolve `name:` and `topic:` addresses.
//!
//! ```bash
//! $ resnames resolve name:UserTable
//! "orders-user-table-dev"
//! $ resnames resolve name:UserTable topic:OrderTopic.topicName
//! name:UserTable = "orders-user-table-dev"
//! topic:OrderTopic.topicName = "orders-order-topic-dev"
//! ```

use anyhow::{Context, Result};
use clap::Args;

use super::CliConfig;
use super::common::CommandContext;
use crate::inject::SymbolicAddress;

/// Resolve name: and topic: references
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Addresses such as name:UserTable or topic:OrderTopic.arn
    #[arg(required = true, value_name = "ADDRESS")]
    addresses: Vec<String>,
}

impl ResolveCommand {
    /// Execute the resolve command.
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let addresses = self
            .addresses
            .iter()
            .map(|raw| raw.parse::<SymbolicAddress>())
            .collect::<Result<Vec<_>, _>>()?;

        let context = CommandContext::load(config).await?;
        let references = context.plugin.references();

        let single = addresses.len() == 1;
        for address in &addresses {
            let value = references
                .resolve(address)
                .await
                .with_context(|| format!("Failed to resolve {address}"))?;
            let json = serde_json::to_string(&value)?;
            if single {
                println!("{json}");
            } else {
                println!("{address} = {json}");
            }
        }
        Ok(())
    }
}
