//! Core types shared across resnames
//!
//! This module holds the error type used by every layer of the crate:
//! - [`ResnamesError`] - typed error kinds for naming, injection and lookups
//! - [`ErrorContext`] - user-facing wrapper with details and suggestions
//! - [`user_friendly_error`] - converts any `anyhow::Error` for CLI display
//!
//! Library code returns `Result<T, ResnamesError>` where the failure is one of the
//! documented kinds, and `anyhow::Result` where I/O or parsing context is attached on
//! the way up.

pub mod error;

pub use error::{ErrorContext, ResnamesError, user_friendly_error};
