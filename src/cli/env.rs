//! Print the merged environment.
//!
//! Every key of the final environment is printed as `KEY=value`: strings in double
//! quotes, numbers and booleans bare, and deploy-time expressions as a JSON-encoded
//! string literal.
//!
//! ```bash
//! resnames env > .env
//! ```

use std::io::Write;

use anyhow::Result;
use clap::Args;

use super::CliConfig;
use super::common::CommandContext;
use crate::hooks::LifecycleEvent;

/// Print all environment variables
#[derive(Args, Debug)]
pub struct EnvCommand {}

impl EnvCommand {
    /// Execute the env command.
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let context = CommandContext::load(config).await?;
        let mut stdout = std::io::stdout().lock();
        context
            .plugin
            .dispatch(LifecycleEvent::EnvEnvironment.as_str(), &mut stdout)
            .await?;
        stdout.flush()?;
        Ok(())
    }
}
