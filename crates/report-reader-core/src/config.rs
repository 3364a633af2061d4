//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables. Binaries apply their command line flags last.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Hosted processing backend used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "https://myreportbackend.vercel.app/process-report";

/// Multipart field carrying the report file.
pub const DEFAULT_FIELD_NAME: &str = "reportImage";

const DEFAULT_STAGE_DELAY: Duration = Duration::from_millis(1200);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Synthetic pauses that make the post-upload stages visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDelays {
    /// Time spent in Extracting before Analyzing starts.
    pub extracting: Duration,
    /// Time spent in Analyzing before Complete.
    pub analyzing: Duration,
}

impl Default for StageDelays {
    fn default() -> Self {
        Self {
            extracting: DEFAULT_STAGE_DELAY,
            analyzing: DEFAULT_STAGE_DELAY,
        }
    }
}

/// Settings shared by the command line and terminal front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub endpoint: String,
    pub field_name: String,
    pub delays: StageDelays,
    /// Request timeout for the transport; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            delays: StageDelays::default(),
            timeout: None,
        }
    }
}

/// On-disk form of [`Config`]; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub endpoint: Option<String>,
    pub field_name: Option<String>,
    pub extract_delay_ms: Option<u64>,
    pub analyze_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

/// `<config dir>/report-reader/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("report-reader").join("config.toml"))
}

impl Config {
    /// Defaults, overlaid with the config file and the process environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let file = match path {
            Some(path) => Some(ConfigFile::load(path)?),
            None => match default_config_path() {
                Some(path) if path.exists() => Some(ConfigFile::load(&path)?),
                _ => None,
            },
        };
        if let Some(file) = file {
            config.apply_file(file);
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_file(&mut self, file: ConfigFile) {
        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(field_name) = file.field_name {
            self.field_name = field_name;
        }
        if let Some(ms) = file.extract_delay_ms {
            self.delays.extracting = Duration::from_millis(ms);
        }
        if let Some(ms) = file.analyze_delay_ms {
            self.delays.analyzing = Duration::from_millis(ms);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Some(Duration::from_secs(secs));
        }
    }

    /// Apply `REPORT_READER_*` variables. Unparsable numbers are skipped.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("REPORT_READER_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(ms) = lookup("REPORT_READER_EXTRACT_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.delays.extracting = Duration::from_millis(ms);
        }
        if let Some(ms) = lookup("REPORT_READER_ANALYZE_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.delays.analyzing = Duration::from_millis(ms);
        }
        if let Some(secs) = lookup("REPORT_READER_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout = Some(Duration::from_secs(secs));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_hosted_backend() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.field_name, "reportImage");
        assert_eq!(config.timeout, None);
        assert_eq!(config.delays.extracting, Duration::from_millis(1200));
    }

    #[test]
    fn file_overrides_defaults() {
        let file = ConfigFile::parse(
            r#"
            endpoint = "http://localhost:3000/process-report"
            extract_delay_ms = 10
            timeout_secs = 30
            "#,
        )
        .unwrap();
        let mut config = Config::default();
        config.apply_file(file);
        assert_eq!(config.endpoint, "http://localhost:3000/process-report");
        assert_eq!(config.delays.extracting, Duration::from_millis(10));
        assert_eq!(config.delays.analyzing, Duration::from_millis(1200));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.field_name, DEFAULT_FIELD_NAME);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigFile::parse("endpont = \"typo\"").is_err());
    }

    #[test]
    fn env_overrides_file_and_skips_garbage() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("REPORT_READER_ENDPOINT", "http://env/process-report"),
            ("REPORT_READER_ANALYZE_DELAY_MS", "50"),
            ("REPORT_READER_TIMEOUT_SECS", "soon"),
        ]);
        let mut config = Config::default();
        config.apply_file(ConfigFile {
            endpoint: Some("http://file/process-report".into()),
            ..ConfigFile::default()
        });
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.endpoint, "http://env/process-report");
        assert_eq!(config.delays.analyzing, Duration::from_millis(50));
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn load_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = ConfigFile::load(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.toml"));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "extract_delay_ms = \"slow\"").unwrap();
        assert!(matches!(
            ConfigFile::load(&bad),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn resolve_with_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "field_name = \"file\"\n").unwrap();
        let config = Config::resolve(Some(&path)).unwrap();
        assert_eq!(config.field_name, "file");
    }
}
