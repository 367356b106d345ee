//! Common helpers for resnames integration tests

// Not every helper is used by every test module
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub use resnames_cli::test_utils::{ServiceFixture, write_service};

/// A temporary service directory with its own (empty) global config.
pub struct TestProject {
    _temp_dir: TempDir,
    project_dir: PathBuf,
    config_path: PathBuf,
}

impl TestProject {
    /// Empty project directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let project_dir = temp_dir.path().join("service");
        std::fs::create_dir_all(&project_dir).unwrap();
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "").unwrap();

        Self {
            _temp_dir: temp_dir,
            project_dir,
            config_path,
        }
    }

    /// Project with `serverless.yml` set to `yaml`.
    pub fn with_service(yaml: &str) -> Self {
        let project = Self::new();
        project.write_service(yaml);
        project
    }

    /// Project with a fixture as `serverless.yml`.
    pub fn with_fixture(fixture: &ServiceFixture) -> Self {
        Self::with_service(&fixture.content)
    }

    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    pub fn write_service(&self, yaml: &str) -> PathBuf {
        write_service(&self.project_dir, yaml)
    }

    /// Replace the global config file.
    pub fn write_config(&self, toml: &str) {
        std::fs::write(&self.config_path, toml).unwrap();
    }

    /// `resnames` running inside the project with the project's global config.
    pub fn resnames_command(&self) -> Command {
        let mut cmd = Command::cargo_bin("resnames").unwrap();
        cmd.current_dir(&self.project_dir)
            .env("RESNAMES_CONFIG", &self.config_path)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run `resnames` and return stdout, panicking with stderr on failure.
    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self.resnames_command().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "resnames {args:?} failed with {:?}\nStderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }
}
