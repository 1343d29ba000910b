//! Client configuration.
//!
//! Loaded from `config.toml` under the platform config directory
//! (`~/.config/dossier/config.toml` on Linux), or from an explicit path.
//! A missing file means defaults. Credentials can also come from the
//! environment, which takes precedence over the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::connectors::wikipedia::ExtractFormat;
use crate::connectors::{context7, metasearch, stackexchange, wikipedia};
use crate::dossier::DEFAULT_TOP_N;
use crate::error::ClientError;
use crate::transport::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};

pub const CONFIG_PATH_ENV: &str = "DOSSIER_CONFIG";
pub const CONTEXT7_KEY_ENV: &str = "CONTEXT7_API_KEY";
pub const STACKEXCHANGE_KEY_ENV: &str = "STACKEXCHANGE_KEY";
pub const METASEARCH_URL_ENV: &str = "DOSSIER_METASEARCH_URL";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DossierConfig {
    pub http: HttpConfig,
    pub context7: Context7Config,
    pub metasearch: MetasearchConfig,
    pub stackexchange: StackExchangeConfig,
    pub wikipedia: WikipediaConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context7Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for Context7Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: context7::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetasearchConfig {
    pub base_url: String,
}

impl Default for MetasearchConfig {
    fn default() -> Self {
        Self {
            base_url: metasearch::DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackExchangeConfig {
    pub site: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub top_n: usize,
}

impl Default for StackExchangeConfig {
    fn default() -> Self {
        Self {
            site: stackexchange::DEFAULT_SITE.to_string(),
            api_key: None,
            base_url: stackexchange::DEFAULT_BASE_URL.to_string(),
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikipediaConfig {
    pub language: String,
    pub user_agent: String,
    pub extract_format: ExtractFormat,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            language: wikipedia::DEFAULT_LANGUAGE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            extract_format: ExtractFormat::default(),
        }
    }
}

/// `<config dir>/dossier/config.toml`, falling back to `~/.config`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dossier")
        .join("config.toml")
}

impl DossierConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ClientError> {
        let config: DossierConfig = toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path`. Unlike [`load`](Self::load), a missing file
    /// is an error here.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load from `path`, or from `$DOSSIER_CONFIG`, or from the default
    /// location, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ClientError> {
        let mut config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(path) => Self::load_from_path(path)?,
                Err(_) => {
                    let path = default_config_path();
                    if path.exists() {
                        Self::load_from_path(&path)?
                    } else {
                        debug!(path = %path.display(), "no config file, using defaults");
                        Self::default()
                    }
                }
            },
        };
        config.apply_env_from(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply credential and endpoint overrides. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = lookup(CONTEXT7_KEY_ENV) {
            self.context7.api_key = Some(key);
        }
        if let Some(key) = lookup(STACKEXCHANGE_KEY_ENV) {
            self.stackexchange.api_key = Some(key);
        }
        if let Some(url) = lookup(METASEARCH_URL_ENV) {
            self.metasearch.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.http.timeout_secs == 0 {
            return Err(ClientError::Config("http.timeout_secs must be positive".into()));
        }
        if self.stackexchange.top_n == 0 {
            return Err(ClientError::Config("stackexchange.top_n must be positive".into()));
        }
        if self.stackexchange.site.trim().is_empty() {
            return Err(ClientError::Config("stackexchange.site must not be empty".into()));
        }
        if self.wikipedia.language.trim().is_empty() {
            return Err(ClientError::Config("wikipedia.language must not be empty".into()));
        }
        for (name, url) in [
            ("context7.base_url", &self.context7.base_url),
            ("metasearch.base_url", &self.metasearch.base_url),
            ("stackexchange.base_url", &self.stackexchange.base_url),
        ] {
            url::Url::parse(url)
                .map_err(|e| ClientError::Config(format!("{} '{}' is not a URL: {}", name, url, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DossierConfig::default();
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.user_agent, "Dossier/1.0");
        assert_eq!(config.stackexchange.site, "stackoverflow");
        assert_eq!(config.stackexchange.top_n, 5);
        assert_eq!(config.wikipedia.language, "en");
        assert_eq!(config.wikipedia.extract_format, ExtractFormat::Plain);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = DossierConfig::from_toml_str(
            r#"
            [stackexchange]
            site = "superuser"
            top_n = 3

            [wikipedia]
            language = "fr"
            extract_format = "html"
            "#,
        )
        .unwrap();
        assert_eq!(config.stackexchange.site, "superuser");
        assert_eq!(config.stackexchange.top_n, 3);
        assert_eq!(config.stackexchange.base_url, stackexchange::DEFAULT_BASE_URL);
        assert_eq!(config.wikipedia.extract_format, ExtractFormat::Html);
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = DossierConfig::from_toml_str("[http]\ntimeout_secs = 0\n").unwrap_err();
        assert_eq!(err.code_str(), "config_error");

        let err = DossierConfig::from_toml_str("[metasearch]\nbase_url = \"not a url\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("metasearch.base_url"));

        let err = DossierConfig::from_toml_str("[wikipedia]\nextract_format = \"wiki\"\n")
            .unwrap_err();
        assert_eq!(err.code_str(), "config_error");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[context7]\napi_key = \"from-file\"").unwrap();

        let config = DossierConfig::load_from_path(file.path()).unwrap();
        assert_eq!(config.context7.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = DossierConfig::load(Some(path.as_path())).unwrap_err();
        assert_eq!(err.code_str(), "config_error");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config =
            DossierConfig::from_toml_str("[context7]\napi_key = \"from-file\"\n").unwrap();
        let env: HashMap<&str, &str> = [
            (CONTEXT7_KEY_ENV, "from-env"),
            (STACKEXCHANGE_KEY_ENV, "se-key"),
            (METASEARCH_URL_ENV, ""),
        ]
        .into_iter()
        .collect();

        config.apply_env_from(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.context7.api_key.as_deref(), Some("from-env"));
        assert_eq!(config.stackexchange.api_key.as_deref(), Some("se-key"));
        // empty values are ignored
        assert_eq!(config.metasearch.base_url, metasearch::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = DossierConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(DossierConfig::from_toml_str(&text).unwrap(), config);
    }
}
