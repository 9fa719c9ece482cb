use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid wizard config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid endpoint `{endpoint}`: {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("`{field}` must be greater than zero")]
    Zero { field: &'static str },
}

/// How concurrent save responses for the same step key are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseOrdering {
    /// A response only writes a key if it was issued after the last writer.
    #[default]
    Sequenced,
    /// Whatever arrives last wins.
    LastResponseWins,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Base URL of the persistence server; `/api/save` is appended.
    pub endpoint: String,
    pub autosave_interval_secs: u64,
    pub redirect_delay_ms: u64,
    pub redirect_url: String,
    pub request_timeout_secs: u64,
    pub response_ordering: ResponseOrdering,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000".to_string(),
            autosave_interval_secs: 30,
            redirect_delay_ms: 2000,
            redirect_url: "/".to_string(),
            request_timeout_secs: 15,
            response_ordering: ResponseOrdering::Sequenced,
        }
    }
}

impl WizardConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: WizardConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.save_url()?;
        if self.autosave_interval_secs == 0 {
            return Err(ConfigError::Zero {
                field: "autosave_interval_secs",
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Zero {
                field: "request_timeout_secs",
            });
        }
        Ok(())
    }

    /// Absolute URL of the save endpoint.
    pub fn save_url(&self) -> Result<Url, ConfigError> {
        let invalid = |source: url::ParseError| ConfigError::Endpoint {
            endpoint: self.endpoint.clone(),
            source,
        };
        let mut base = Url::parse(&self.endpoint).map_err(invalid)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("api/save").map_err(invalid)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_page_behaviour() {
        let config = WizardConfig::from_toml_str("").expect("config");
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
        assert_eq!(config.redirect_delay(), Duration::from_millis(2000));
        assert_eq!(config.redirect_url, "/");
        assert_eq!(config.response_ordering, ResponseOrdering::Sequenced);
    }

    #[test]
    fn save_url_keeps_base_path() {
        let config = WizardConfig::from_toml_str(
            r#"
endpoint = "https://alta.example.com/portal"
response_ordering = "last_response_wins"
"#,
        )
        .expect("config");
        assert_eq!(
            config.save_url().expect("url").as_str(),
            "https://alta.example.com/portal/api/save"
        );
        assert_eq!(config.response_ordering, ResponseOrdering::LastResponseWins);
    }

    #[test]
    fn rejects_zero_interval_and_bad_endpoint() {
        assert!(matches!(
            WizardConfig::from_toml_str("autosave_interval_secs = 0"),
            Err(ConfigError::Zero { .. })
        ));
        assert!(matches!(
            WizardConfig::from_toml_str(r#"endpoint = "not a url""#),
            Err(ConfigError::Endpoint { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = WizardConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
