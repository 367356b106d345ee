//! Test utilities for resnames
//!
//! Helpers shared by unit tests and the integration suite: one-time logging setup,
//! writing service definitions into temporary directories, and ready-made service
//! fixtures.
//!
//! # Example
//!
//! ```rust,no_run
//! use resnames_cli::test_utils::{ServiceFixture, write_service};
//!
//! let temp = tempfile::TempDir::new().unwrap();
//! let path = write_service(temp.path(), &ServiceFixture::basic().content);
//! assert!(path.ends_with("serverless.yml"));
//! ```

pub mod fixtures;

pub use fixtures::ServiceFixture;

use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` if given, otherwise `RUST_LOG`; does nothing if neither is set.
/// Only the first call has an effect.
///
/// ```bash
/// RUST_LOG=resnames_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// Write `yaml` to `serverless.yml` inside `dir` and return its path.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_service(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("serverless.yml");
    std::fs::write(&path, yaml.trim_start())
        .unwrap_or_else(|e| panic!("Failed to write {}: {e}", path.display()));
    path
}
