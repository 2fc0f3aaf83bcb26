//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{LedgerError, Result};
use crate::core::paths::resolve_absolute_path;

/// Full growth ledger configuration model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GrowthConfig {
    pub store: StoreConfig,
    pub audit: AuditConfig,
    /// Path the configuration was loaded from; set by [`GrowthConfig::load`].
    pub config_file: PathBuf,
}

/// Ledger store location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one subdirectory per business.
    pub data_root: PathBuf,
}

/// Audit trail settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub log_file: PathBuf,
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[GL-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn default_data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("growth-ledger")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_dir().join("data"),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_file: default_data_dir().join("audit.jsonl"),
        }
    }
}

impl GrowthConfig {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        home_dir()
            .join(".config")
            .join("growth-ledger")
            .join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| LedgerError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(LedgerError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.normalize_paths();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for audit events.
    ///
    /// FNV-1a keeps the value stable across processes and Rust releases,
    /// unlike `DefaultHasher` whose seed may change.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_env_overrides_from(env_var)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("GROWTH_STORE_DATA_ROOT") {
            self.store.data_root = PathBuf::from(raw);
        }

        if let Some(raw) = lookup("GROWTH_AUDIT_ENABLED") {
            self.audit.enabled = parse_env_bool("GROWTH_AUDIT_ENABLED", &raw)?;
        }

        if let Some(raw) = lookup("GROWTH_AUDIT_LOG_FILE") {
            self.audit.log_file = PathBuf::from(raw);
        }

        Ok(())
    }

    /// Normalize paths for consistent comparison.
    fn normalize_paths(&mut self) {
        self.store.data_root = resolve_absolute_path(&self.store.data_root);
        self.audit.log_file = resolve_absolute_path(&self.audit.log_file);
    }

    fn validate(&self) -> Result<()> {
        // Writing business directories at the filesystem root is never intended.
        if self.store.data_root.parent().is_none() {
            return Err(LedgerError::InvalidConfig {
                details: "store.data_root must not be the filesystem root".to_string(),
            });
        }

        if self.audit.enabled && self.audit.log_file.as_os_str().is_empty() {
            return Err(LedgerError::InvalidConfig {
                details: "audit.log_file must be set when audit.enabled=true".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    raw.parse::<bool>()
        .map_err(|error| LedgerError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let mut cfg = GrowthConfig::default();
        cfg.normalize_paths();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_data_root_is_under_growth_ledger() {
        let cfg = GrowthConfig::default();
        assert!(
            cfg.store
                .data_root
                .to_string_lossy()
                .contains("growth-ledger")
        );
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let result = GrowthConfig::load(Some(Path::new("/nonexistent/growth/config.toml")));
        let err = result.unwrap_err();
        assert!(matches!(err, LedgerError::MissingConfig { .. }));
    }

    #[test]
    fn load_reads_toml_and_records_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&cfg_path).unwrap();
        writeln!(file, "[store]").unwrap();
        writeln!(
            file,
            "data_root = \"{}\"",
            dir.path().join("data").display()
        )
        .unwrap();
        writeln!(file, "[audit]").unwrap();
        writeln!(file, "enabled = false").unwrap();
        drop(file);

        let cfg = GrowthConfig::load(Some(&cfg_path)).unwrap();
        assert_eq!(cfg.config_file, cfg_path);
        assert!(!cfg.audit.enabled);
        assert!(cfg.store.data_root.ends_with("data"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(&cfg_path, "store = not-a-table").unwrap();

        let err = GrowthConfig::load(Some(&cfg_path)).unwrap_err();
        assert_eq!(err.code(), "GL-1004");
    }

    #[test]
    fn env_override_replaces_data_root() {
        let mut cfg = GrowthConfig::default();
        let overrides = vars(&[("GROWTH_STORE_DATA_ROOT", "/srv/growth/data")]);

        cfg.apply_env_overrides_from(|name| overrides.get(name).cloned())
            .expect("env overrides should parse");

        assert_eq!(cfg.store.data_root, PathBuf::from("/srv/growth/data"));
    }

    #[test]
    fn env_override_invalid_boolean_rejected() {
        let mut cfg = GrowthConfig::default();
        let overrides = vars(&[("GROWTH_AUDIT_ENABLED", "yes-please")]);

        let err = cfg
            .apply_env_overrides_from(|name| overrides.get(name).cloned())
            .expect_err("invalid bool should fail");
        match err {
            LedgerError::ConfigParse { context, details } => {
                assert_eq!(context, "env");
                assert!(details.contains("GROWTH_AUDIT_ENABLED"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = GrowthConfig::default();
        let before = cfg.store.data_root.clone();
        // env_var filters blank strings before they reach the override.
        assert_eq!(env_var("GROWTH_TEST_UNSET_VARIABLE"), None);
        cfg.apply_env_overrides_from(|_| None).unwrap();
        assert_eq!(cfg.store.data_root, before);
    }

    #[test]
    fn normalize_makes_relative_paths_absolute() {
        let mut cfg = GrowthConfig::default();
        cfg.store.data_root = PathBuf::from("relative/data");
        cfg.normalize_paths();
        assert!(cfg.store.data_root.is_absolute());
        assert!(cfg.store.data_root.ends_with("relative/data"));
    }

    #[test]
    fn root_data_root_rejected() {
        let mut cfg = GrowthConfig::default();
        cfg.store.data_root = PathBuf::from("/");
        let err = cfg.validate().expect_err("expected data_root error");
        assert!(err.to_string().contains("data_root"));
    }

    #[test]
    fn stable_hash_deterministic() {
        let cfg = GrowthConfig::default();
        let h1 = cfg.stable_hash().expect("hash");
        let h2 = cfg.stable_hash().expect("hash");
        assert_eq!(h1, h2);
    }

    #[test]
    fn stable_hash_changes_when_config_changes() {
        let cfg = GrowthConfig::default();
        let hash_before = cfg.stable_hash().expect("hash should compute");
        let mut modified = GrowthConfig::default();
        modified.audit.enabled = !modified.audit.enabled;
        let hash_after = modified.stable_hash().expect("hash should compute");
        assert_ne!(hash_before, hash_after);
    }
}
