//! Lifecycle hooks.
//!
//! The deployment framework drives plugins through named lifecycle events. resnames
//! attaches to three of them: two that must see final resource names before they run,
//! and the `env` command's own event.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::ResnamesError;

/// Lifecycle events resnames hooks into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// Before a local offline emulator starts
    #[serde(rename = "before:offline:start:init")]
    OfflineStartInit,
    /// Before the provider validates the service for packaging or deployment
    #[serde(rename = "before:aws:common:validate:validate")]
    AwsCommonValidate,
    /// The `env` command
    #[serde(rename = "env:environment")]
    EnvEnvironment,
}

impl LifecycleEvent {
    /// Every event, in hook table order.
    pub const ALL: [Self; 3] = [Self::EnvEnvironment, Self::OfflineStartInit, Self::AwsCommonValidate];

    /// The event name as the framework spells it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OfflineStartInit => "before:offline:start:init",
            Self::AwsCommonValidate => "before:aws:common:validate:validate",
            Self::EnvEnvironment => "env:environment",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = ResnamesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| ResnamesError::Other {
                message: format!("Unknown lifecycle event '{s}'"),
            })
    }
}

/// What a hook does when its event fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    /// Run the one-time name injection
    Inject,
    /// Print the merged environment as `KEY=value` lines
    PrintEnvironment,
}

/// The hook table: which action runs for which event.
#[must_use]
pub fn hook_table() -> Vec<(LifecycleEvent, HookAction)> {
    LifecycleEvent::ALL
        .into_iter()
        .map(|event| {
            let action = match event {
                LifecycleEvent::EnvEnvironment => HookAction::PrintEnvironment,
                LifecycleEvent::OfflineStartInit | LifecycleEvent::AwsCommonValidate => HookAction::Inject,
            };
            (event, action)
        })
        .collect()
}
