//! Integration test suite for resnames
//!
//! Drives the `resnames` binary end to end against service definitions written into
//! temporary directories.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **env**: `env` output format and merge behavior
//! - **render**: rendered service definitions
//! - **resolve**: `name:` and `topic:` lookups
//! - **names**: the named-resource listing
//! - **errors**: failures and exit codes

#[path = "../common/mod.rs"]
mod common;

mod env;
mod errors;
mod names;
mod render;
mod resolve;
