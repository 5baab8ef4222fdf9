/// Configuration for the coursedesk service
use crate::catalog::CatalogClientConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const ENV_BIND: &str = "COURSEDESK_BIND";
const ENV_COURSE_URL: &str = "COURSE_SERVICE_URL";
const ENV_SECTION_URL: &str = "SECTION_SERVICE_URL";
const ENV_API_TOKEN: &str = "COURSEDESK_API_TOKEN";
const ENV_TIMEOUT: &str = "COURSEDESK_REQUEST_TIMEOUT_SECS";
const ENV_DEFAULT_MINUTES: &str = "COURSEDESK_DEFAULT_SECTION_MINUTES";
const ENV_FORM_TTL: &str = "COURSEDESK_FORM_IDLE_TTL_SECS";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Base URL of the course service (`/Courses/...`)
    #[serde(default = "default_course_service_url")]
    pub course_service_url: String,

    /// Base URL of the section service (`/Sections/...`)
    #[serde(default = "default_section_service_url")]
    pub section_service_url: String,

    /// Bearer token forwarded to the backend services
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Duration pre-filled into a freshly opened section form
    #[serde(default = "default_section_minutes")]
    pub default_section_minutes: i64,

    /// Seconds an open form may go unused before it is dropped
    #[serde(default = "default_form_idle_ttl_secs")]
    pub form_idle_ttl_secs: u64,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_course_service_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_section_service_url() -> String {
    "http://localhost:5002".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_section_minutes() -> i64 {
    60
}

fn default_form_idle_ttl_secs() -> u64 {
    30 * 60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            course_service_url: default_course_service_url(),
            section_service_url: default_section_service_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            default_section_minutes: default_section_minutes(),
            form_idle_ttl_secs: default_form_idle_ttl_secs(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a JSON file.
    ///
    /// Missing keys fall back to their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from environment variables, honoring a `.env`
    /// file in the working directory if present.
    ///
    /// | Env Var                               | Default                 |
    /// |---------------------------------------|-------------------------|
    /// | `COURSEDESK_BIND`                     | `127.0.0.1:3000`        |
    /// | `COURSE_SERVICE_URL`                  | `http://localhost:5001` |
    /// | `SECTION_SERVICE_URL`                 | `http://localhost:5002` |
    /// | `COURSEDESK_API_TOKEN`                | unset                   |
    /// | `COURSEDESK_REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `COURSEDESK_DEFAULT_SECTION_MINUTES`  | `60`                    |
    /// | `COURSEDESK_FORM_IDLE_TTL_SECS`       | `1800`                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let request_timeout_secs = match lookup(ENV_TIMEOUT) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_TIMEOUT,
                message: format!("expected a whole number of seconds, got {:?}", raw),
            })?,
            None => defaults.request_timeout_secs,
        };

        let default_section_minutes = match lookup(ENV_DEFAULT_MINUTES) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_DEFAULT_MINUTES,
                message: format!("expected a whole number of minutes, got {:?}", raw),
            })?,
            None => defaults.default_section_minutes,
        };

        let form_idle_ttl_secs = match lookup(ENV_FORM_TTL) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_FORM_TTL,
                message: format!("expected a whole number of seconds, got {:?}", raw),
            })?,
            None => defaults.form_idle_ttl_secs,
        };

        let config = AppConfig {
            bind_address: lookup(ENV_BIND).unwrap_or(defaults.bind_address),
            course_service_url: lookup(ENV_COURSE_URL).unwrap_or(defaults.course_service_url),
            section_service_url: lookup(ENV_SECTION_URL)
                .unwrap_or(defaults.section_service_url),
            api_token: lookup(ENV_API_TOKEN).filter(|t| !t.trim().is_empty()),
            request_timeout_secs,
            default_section_minutes,
            form_idle_ttl_secs,
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            (ENV_COURSE_URL, &self.course_service_url),
            (ENV_SECTION_URL, &self.section_service_url),
        ] {
            let parsed = Url::parse(value).map_err(|e| ConfigError::Invalid {
                key,
                message: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid {
                    key,
                    message: format!("unsupported scheme {}", parsed.scheme()),
                });
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_TIMEOUT,
                message: "must be greater than 0".to_string(),
            });
        }

        if self.default_section_minutes < 1 {
            return Err(ConfigError::Invalid {
                key: ENV_DEFAULT_MINUTES,
                message: "must be at least 1".to_string(),
            });
        }

        if self.form_idle_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                key: ENV_FORM_TTL,
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn form_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.form_idle_ttl_secs)
    }

    /// Settings for the catalog HTTP client.
    pub fn client_config(&self) -> CatalogClientConfig {
        CatalogClientConfig {
            course_base_url: self.course_service_url.clone(),
            section_base_url: self.section_service_url.clone(),
            api_token: self.api_token.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..CatalogClientConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.default_section_minutes, 60);
        assert_eq!(config.form_idle_ttl(), Duration::from_secs(1800));
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_COURSE_URL, "https://courses.example.org/api"),
            (ENV_API_TOKEN, "abc"),
            (ENV_TIMEOUT, "5"),
            (ENV_DEFAULT_MINUTES, "45"),
            (ENV_FORM_TTL, "90"),
        ]))
        .unwrap();

        assert_eq!(config.course_service_url, "https://courses.example.org/api");
        assert_eq!(config.api_token.as_deref(), Some("abc"));
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.default_section_minutes, 45);
        assert_eq!(config.form_idle_ttl(), Duration::from_secs(90));

        let client = config.client_config();
        assert_eq!(client.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let config = AppConfig::from_lookup(lookup_from(&[(ENV_API_TOKEN, "  ")])).unwrap();
        assert!(config.api_token.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT, "soon")])),
            Err(ConfigError::Invalid { key: ENV_TIMEOUT, .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup_from(&[(ENV_SECTION_URL, "not a url")])),
            Err(ConfigError::Invalid { key: ENV_SECTION_URL, .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup_from(&[(ENV_DEFAULT_MINUTES, "0")])),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup_from(&[(ENV_FORM_TTL, "0")])),
            Err(ConfigError::Invalid { key: ENV_FORM_TTL, .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "course_service_url": "http://courses:8080" }"#).unwrap();
        assert_eq!(config.course_service_url, "http://courses:8080");
        assert_eq!(config.section_service_url, "http://localhost:5002");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "coursedesk-config-{}.json",
            std::process::id()
        ));
        fs::write(
            &path,
            r#"{ "section_service_url": "https://sections.internal", "request_timeout_secs": 12 }"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.section_service_url, "https://sections.internal");
        assert_eq!(config.request_timeout_secs, 12);
        assert_eq!(config.bind_address, "127.0.0.1:3000");

        assert!(matches!(
            AppConfig::load_from_file(Path::new("/nonexistent/coursedesk.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
