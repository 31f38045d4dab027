//! Configuration for the RBAC crates
//!
//! Configuration is layered: defaults, then a TOML file, then `RBAC_*`
//! environment variables, then validation.
//!
//! ```toml
//! [resolver]
//! max_depth = 3          # or "unbounded"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Depth cap applied when none is configured
pub const DEFAULT_MAX_DEPTH: usize = 3;

const ENV_PREFIX: &str = "RBAC_";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema
    #[error("Invalid config file {path}: {source}")]
    Parse {
        /// File that was being parsed
        path: PathBuf,
        /// Underlying parse error
        source: toml::de::Error,
    },

    /// A value failed validation
    #[error("Field '{field}': {message}")]
    Invalid {
        /// Dotted path of the offending field
        field: String,
        /// What was wrong with it
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// How far below a directly assigned item the resolver may walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDepthLimit", into = "RawDepthLimit")]
pub enum DepthLimit {
    /// Expand nodes at most this many levels below the assigned item
    Levels(usize),
    /// No depth cap; only cycle detection bounds the walk
    Unbounded,
}

impl DepthLimit {
    /// The cap as an optional level count
    pub fn levels(&self) -> Option<usize> {
        match self {
            DepthLimit::Levels(levels) => Some(*levels),
            DepthLimit::Unbounded => None,
        }
    }
}

impl Default for DepthLimit {
    fn default() -> Self {
        DepthLimit::Levels(DEFAULT_MAX_DEPTH)
    }
}

impl fmt::Display for DepthLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthLimit::Levels(levels) => write!(f, "{levels}"),
            DepthLimit::Unbounded => f.write_str("unbounded"),
        }
    }
}

impl FromStr for DepthLimit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unbounded") {
            return Ok(DepthLimit::Unbounded);
        }
        s.parse::<usize>().map(DepthLimit::Levels).map_err(|_| {
            ConfigError::invalid(
                "resolver.max_depth",
                format!("expected a level count or \"unbounded\", got '{s}'"),
            )
        })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawDepthLimit {
    Levels(usize),
    Keyword(String),
}

impl TryFrom<RawDepthLimit> for DepthLimit {
    type Error = ConfigError;

    fn try_from(raw: RawDepthLimit) -> Result<Self, Self::Error> {
        match raw {
            RawDepthLimit::Levels(levels) => Ok(DepthLimit::Levels(levels)),
            RawDepthLimit::Keyword(keyword) => keyword.parse(),
        }
    }
}

impl From<DepthLimit> for RawDepthLimit {
    fn from(limit: DepthLimit) -> Self {
        match limit {
            DepthLimit::Levels(levels) => RawDepthLimit::Levels(levels),
            DepthLimit::Unbounded => RawDepthLimit::Keyword("unbounded".to_string()),
        }
    }
}

/// Hierarchy resolver settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Depth cap for the hierarchy walk
    pub max_depth: DepthLimit,
}

/// Logging settings, consumed by binaries that install a subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` level filter
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// Hierarchy resolver settings
    pub resolver: ResolverConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl RbacConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and fields take their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load defaults, then the file if given, then the environment, then validate
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.merge_with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Merge `RBAC_*` variables from the process environment
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Merge `RBAC_*` variables from an explicit list
    ///
    /// Recognised keys are `RBAC_RESOLVER_MAX_DEPTH` and `RBAC_LOG_LEVEL`;
    /// other `RBAC_*` keys are ignored.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(key) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match key {
                "RESOLVER_MAX_DEPTH" => {
                    self.resolver.max_depth = value.as_ref().parse()?;
                }
                "LOG_LEVEL" => {
                    self.logging.level = value.as_ref().trim().to_ascii_lowercase();
                }
                other => {
                    tracing::trace!(key = other, "Ignoring unrecognised RBAC environment variable");
                }
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.max_depth == DepthLimit::Levels(0) {
            return Err(ConfigError::invalid(
                "resolver.max_depth",
                "must be at least 1 or \"unbounded\"",
            ));
        }

        let level = self.logging.level.as_str();
        if !LOG_LEVELS.contains(&level) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("expected one of {}, got '{level}'", LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }

    /// Resolver depth cap as an optional level count
    pub fn max_depth(&self) -> Option<usize> {
        self.resolver.max_depth.levels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RbacConfig::default();
        assert_eq!(config.max_depth(), Some(DEFAULT_MAX_DEPTH));
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"").unwrap();

        let config = RbacConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.max_depth(), Some(DEFAULT_MAX_DEPTH));
    }

    #[test]
    fn test_unbounded_keyword_in_file() {
        let config: RbacConfig = toml::from_str("[resolver]\nmax_depth = \"unbounded\"").unwrap();
        assert_eq!(config.max_depth(), None);

        let config: RbacConfig = toml::from_str("[resolver]\nmax_depth = 7").unwrap();
        assert_eq!(config.max_depth(), Some(7));
    }

    #[test]
    fn test_bad_keyword_is_rejected() {
        let result: Result<RbacConfig, _> = toml::from_str("[resolver]\nmax_depth = \"deep\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_with_vars() {
        let mut config = RbacConfig::default();
        config
            .merge_with_vars([
                ("RBAC_RESOLVER_MAX_DEPTH", "unbounded"),
                ("RBAC_LOG_LEVEL", "WARN"),
                ("RBAC_UNRELATED", "x"),
                ("HOME", "/root"),
            ])
            .unwrap();

        assert_eq!(config.max_depth(), None);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_merge_with_vars_rejects_garbage_depth() {
        let mut config = RbacConfig::default();
        let err = config
            .merge_with_vars([("RBAC_RESOLVER_MAX_DEPTH", "three")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_validation() {
        let mut config = RbacConfig::default();
        config.resolver.max_depth = DepthLimit::Levels(0);
        assert!(config.validate().is_err());

        let mut config = RbacConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = RbacConfig::load_from_file(Path::new("/nonexistent/rbac.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    #[serial]
    fn test_load_reads_process_environment() {
        std::env::set_var("RBAC_RESOLVER_MAX_DEPTH", "5");
        let config = RbacConfig::load(None);
        std::env::remove_var("RBAC_RESOLVER_MAX_DEPTH");

        assert_eq!(config.unwrap().max_depth(), Some(5));
    }
}
