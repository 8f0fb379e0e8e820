//! Configuration loader
//!
//! `defaults/coursegraph.default.toml` is embedded into the binary so that
//! docs and runtime behavior stay in sync; a user-specific TOML file can be
//! layered on top via [`Loader`] before deserializing into
//! [`CoursegraphConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/coursegraph.default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CoursegraphConfig {
    pub vault: VaultConfig,
    pub linkcheck: LinkcheckConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// File extension of authored documents (without the dot).
    pub extension: String,
}

/// Knobs for the URL reachability validator.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkcheckConfig {
    pub timeout_secs: u64,
    pub concurrency: usize,
    pub user_agent: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<CoursegraphConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<CoursegraphConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.vault.extension, "md");
        assert_eq!(config.linkcheck.timeout_secs, 10);
        assert_eq!(config.linkcheck.concurrency, 8);
    }

    #[test]
    fn user_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[linkcheck]\nconcurrency = 2").unwrap();
        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(config.linkcheck.concurrency, 2);
        // Untouched keys keep their defaults.
        assert_eq!(config.vault.extension, "md");
    }

    #[test]
    fn missing_user_file_is_an_error() {
        assert!(Loader::new().with_file("/no/such/config.toml").build().is_err());
    }
}
