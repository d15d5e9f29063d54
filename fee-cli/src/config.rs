//! Settings for the `portal` binary.
//!
//! Values come from an optional TOML file and are then overridden by any
//! command-line flags that were given:
//!
//! ```toml
//! operator = "admin@example.com"
//!
//! [database]
//! backend = "sqlite"
//! connection_string = "portal.db"
//!
//! [logging]
//! level = "info"
//! file = "portal.log"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use fee_core::db::DbConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "portal.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortalConfig {
    pub database: DatabaseSection,
    pub logging: LoggingSection,
    /// Email of the user commands act as when `--as` is not given.
    pub operator: Option<String>,
}

/// Flag values that take precedence over the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
    pub operator: Option<String>,
    pub log_level: Option<String>,
}

impl PortalConfig {
    pub fn parse(
        text: &str,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading configuration");
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Read `path` if given, otherwise start from the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn with_overrides(
        mut self,
        overrides: Overrides,
    ) -> Self {
        if let Some(backend) = overrides.backend {
            self.database.backend = backend;
        }
        if let Some(connection_string) = overrides.connection_string {
            self.database.connection_string = connection_string;
        }
        if let Some(operator) = overrides.operator {
            self.operator = Some(operator);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        self
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.database.backend.clone(),
            connection_string: self.database.connection_string.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(text: &str) -> Result<PortalConfig, ConfigError> {
        PortalConfig::parse(text, Path::new("portal.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("").unwrap();

        assert_eq!(config, PortalConfig::default());
        assert_eq!(
            config.db_config(),
            DbConfig {
                backend: "sqlite".to_string(),
                connection_string: "portal.db".to_string(),
            }
        );
    }

    #[test]
    fn full_file() {
        let config = parse(
            r#"
            operator = "admin@example.com"

            [database]
            backend = "memory"
            connection_string = ""

            [logging]
            level = "debug"
            file = "/tmp/portal.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.operator.as_deref(), Some("admin@example.com"));
        assert_eq!(config.database.backend, "memory");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/portal.log")));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = parse("[database]\nconnection_string = \"other.db\"").unwrap();

        assert_eq!(config.database.backend, "sqlite");
        assert_eq!(config.database.connection_string, "other.db");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = parse("[database]\nbackend = \"sqlite\"\nurl = \"x\"").unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("failed to parse config file portal.toml"));
    }

    #[test]
    fn flags_override_file() {
        let config = parse("operator = \"a@example.com\"\n[logging]\nlevel = \"warn\"")
            .unwrap()
            .with_overrides(Overrides {
                connection_string: Some(":memory:".to_string()),
                operator: Some("b@example.com".to_string()),
                ..Overrides::default()
            });

        assert_eq!(config.database.connection_string, ":memory:");
        assert_eq!(config.operator.as_deref(), Some("b@example.com"));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = PortalConfig::load(Path::new("/nonexistent/portal.toml")).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
