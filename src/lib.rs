//! Trellis
//!
//! A single-tenant task tracking engine with:
//! - Users, projects and tasks with append-only history and comment logs
//! - Registration gated by an out-of-band email verification code
//! - A pluggable status/priority transition policy
//! - One JSON document as the unit of persistence, written atomically

pub mod auth;
pub mod error;
pub mod model;
pub mod store;
pub mod tracker;
pub mod workflow;

pub use error::{DecodeError, Error, Result};
pub use tracker::Tracker;

use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_FILE: &str = "users.json";
const DEFAULT_ADMIN_FILE: &str = "admin.json";
const DEFAULT_PENDING_TTL_SECS: u64 = 600;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub store: StoreYamlConfig,
    pub registration: RegistrationYamlConfig,
}

/// Store file locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreYamlConfig {
    pub data_file: String,
    pub admin_file: String,
}

impl Default for StoreYamlConfig {
    fn default() -> Self {
        Self {
            data_file: DEFAULT_DATA_FILE.into(),
            admin_file: DEFAULT_ADMIN_FILE.into(),
        }
    }
}

/// Registration configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationYamlConfig {
    /// How long an unconfirmed registration stays claimable, in seconds
    pub pending_ttl_secs: u64,
}

impl Default for RegistrationYamlConfig {
    fn default() -> Self {
        Self {
            pending_ttl_secs: DEFAULT_PENDING_TTL_SECS,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub data_file: PathBuf,
    pub admin_file: PathBuf,
    pub pending_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            admin_file: PathBuf::from(DEFAULT_ADMIN_FILE),
            pending_ttl_secs: DEFAULT_PENDING_TTL_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Self {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "trellis.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Self {
        let yaml = Self::load_yaml(yaml_path);

        Self {
            data_file: std::env::var("TRELLIS_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(yaml.store.data_file)),
            admin_file: std::env::var("TRELLIS_ADMIN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(yaml.store.admin_file)),
            pending_ttl_secs: std::env::var("TRELLIS_PENDING_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.registration.pending_ttl_secs),
        }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("trellis.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
store:
  data_file: /tmp/test-users.json
  admin_file: /tmp/test-admin.json

registration:
  pending_ttl_secs: 120
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.store.data_file, "/tmp/test-users.json");
        assert_eq!(config.store.admin_file, "/tmp/test-admin.json");
        assert_eq!(config.registration.pending_ttl_secs, 120);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.store.data_file, "users.json");
        assert_eq!(config.store.admin_file, "admin.json");
        assert_eq!(config.registration.pending_ttl_secs, 600);
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
registration:
  pending_ttl_secs: 60
"#;
        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.store.data_file, "users.json");
        assert_eq!(config.registration.pending_ttl_secs, 60);
    }

    /// Combined test for YAML file loading, env var overrides, and defaults.
    /// Runs as a single test to avoid parallel env var race conditions.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "TRELLIS_DATA_FILE",
                "TRELLIS_ADMIN_FILE",
                "TRELLIS_PENDING_TTL_SECS",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
store:
  data_file: /data/yaml-users.json
  admin_file: /data/yaml-admin.json
registration:
  pending_ttl_secs: 300
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("trellis.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path));
        assert_eq!(config.data_file, PathBuf::from("/data/yaml-users.json"));
        assert_eq!(config.admin_file, PathBuf::from("/data/yaml-admin.json"));
        assert_eq!(config.pending_ttl_secs, 300);

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("TRELLIS_DATA_FILE", "/data/env-users.json");
        std::env::set_var("TRELLIS_PENDING_TTL_SECS", "45");

        let config = Config::from_yaml_and_env(Some(&file_path));
        assert_eq!(config.data_file, PathBuf::from("/data/env-users.json"));
        assert_eq!(config.pending_ttl_secs, 45);
        // YAML value still used where no env override
        assert_eq!(config.admin_file, PathBuf::from("/data/yaml-admin.json"));

        // --- Phase 3: Unparseable env TTL falls back to YAML ---
        std::env::set_var("TRELLIS_PENDING_TTL_SECS", "soon");
        let config = Config::from_yaml_and_env(Some(&file_path));
        assert_eq!(config.pending_ttl_secs, 300);

        clear_env();

        // --- Phase 4: No YAML file, no env -> defaults ---
        let nonexistent = Path::new("/tmp/nonexistent-trellis-config-12345.yaml");
        let config = Config::from_yaml_and_env(Some(nonexistent));
        assert_eq!(config.data_file, PathBuf::from("users.json"));
        assert_eq!(config.admin_file, PathBuf::from("admin.json"));
        assert_eq!(config.pending_ttl_secs, 600);
    }
}
