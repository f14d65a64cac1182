use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Runtime configuration for the trace service.
///
/// Read from a TOML file, then overridden by command-line flags:
///
/// ```toml
/// data_dir = "/var/lib/tracelot"
/// db_path = "/var/lib/tracelot/trace.redb"   # optional
/// log_filter = "info,trace=debug"             # optional
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory holding the database file.
    pub data_dir: Option<PathBuf>,

    /// Path to the redb database file.
    /// Defaults to `{data_dir}/trace.redb` if not specified.
    pub db_path: Option<PathBuf>,

    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_path: None,
            log_filter: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file. Missing keys take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration from command-line style arguments.
    ///
    /// Supported flags:
    /// - `--data-dir=PATH`
    /// - `--db=PATH`
    /// - `--log=FILTER`
    pub fn from_args(args: &[String]) -> Self {
        let mut config = ServiceConfig::default();

        for arg in args {
            if let Some(val) = arg.strip_prefix("--data-dir=") {
                config.data_dir = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--db=") {
                config.db_path = Some(PathBuf::from(val));
            } else if let Some(val) = arg.strip_prefix("--log=") {
                config.log_filter = val.to_string();
            }
        }

        config
    }

    /// Resolve the redb database path, falling back to `{data_dir}/trace.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("trace.redb"))
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_args() {
        let args = vec![
            "--data-dir=/tmp/tracelot".to_string(),
            "--log=debug".to_string(),
            "--ignored".to_string(),
        ];
        let config = ServiceConfig::from_args(&args);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/tracelot")));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.db_path, None);
    }

    #[test]
    fn test_resolve_defaults() {
        let config = ServiceConfig {
            data_dir: Some(PathBuf::from("/data")),
            ..Default::default()
        };
        assert_eq!(config.resolve_db_path(), PathBuf::from("/data/trace.redb"));

        let config = ServiceConfig::default();
        assert_eq!(config.resolve_db_path(), PathBuf::from("trace.redb"));

        let config = ServiceConfig {
            data_dir: Some(PathBuf::from("/data")),
            db_path: Some(PathBuf::from("/elsewhere/x.redb")),
            ..Default::default()
        };
        assert_eq!(config.resolve_db_path(), PathBuf::from("/elsewhere/x.redb"));
    }

    #[test]
    fn test_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracelot.toml");
        std::fs::write(&path, "data_dir = \"/srv/trace\"\n").unwrap();

        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/trace")));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(ServiceConfig::load(&missing), Err(ConfigError::Io { .. })));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "data_dir = [").unwrap();
        assert!(matches!(ServiceConfig::load(&bad), Err(ConfigError::Parse { .. })));
    }
}
