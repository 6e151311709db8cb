//! API configuration
//!
//! Two groups of settings, both read from the environment through `config`:
//!
//! - [`ApiConfig`]: server settings under the `API_` prefix
//! - [`CrmConfig`]: CRM credentials and tuning, unprefixed (`HUBSPOT_API_KEY`,
//!   `CLOSE_API_KEY`, `CRM_TIMEOUT_SECS`, ...)
//!
//! A missing or blank API key disables that CRM.

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use domain_lead::adapters::{close, hubspot, CrmSettings};
use domain_lead::{CloseConfig, ContactLookup, FieldMapping, HubSpotConfig};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level, used when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    /// Routes `POST /api/{hubspot,close}/test`, which write to the live CRM
    pub enable_crm_test_endpoints: bool,
    /// TOML or JSON field mapping file; the built-in mapping is used when unset
    pub field_mapping_path: Option<String>,
    /// Check the field mapping against each CRM's schema at startup
    pub validate_field_mapping: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            enable_crm_test_endpoints: false,
            field_mapping_path: None,
            validate_field_mapping: true,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix("API"))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Loads the field mapping file, or the built-in mapping when none is set
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or declares an unsupported
    /// version.
    pub fn load_field_mapping(&self) -> Result<FieldMapping, ConfigError> {
        let Some(path) = self.field_mapping_path.as_deref() else {
            return Ok(FieldMapping::default());
        };

        let mapping: FieldMapping = Config::builder()
            .add_source(File::from(Path::new(path)))
            .build()?
            .try_deserialize()?;
        mapping
            .check_version()
            .map_err(|e| ConfigError::Message(format!("{}: {}", path, e)))?;
        Ok(mapping)
    }
}

/// CRM credentials and client tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    pub hubspot_api_key: Option<String>,
    pub hubspot_base_url: Option<String>,
    pub hubspot_lookup: ContactLookup,
    pub hubspot_lookup_page_size: u32,
    pub close_api_key: Option<String>,
    pub close_base_url: Option<String>,
    pub close_app_url: Option<String>,
    /// Per HTTP request
    pub crm_timeout_secs: u64,
    /// Per adapter call during a submission, across all its requests
    pub crm_adapter_timeout_secs: u64,
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            hubspot_api_key: None,
            hubspot_base_url: None,
            hubspot_lookup: ContactLookup::PageScan,
            hubspot_lookup_page_size: hubspot::DEFAULT_LOOKUP_PAGE_SIZE,
            close_api_key: None,
            close_base_url: None,
            close_app_url: None,
            crm_timeout_secs: hubspot::DEFAULT_TIMEOUT.as_secs(),
            crm_adapter_timeout_secs: domain_lead::DEFAULT_ADAPTER_TIMEOUT.as_secs(),
        }
    }
}

impl CrmConfig {
    /// Loads CRM settings from unprefixed environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::default())
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.crm_adapter_timeout_secs)
    }

    /// Adapter settings for every CRM with a non-blank key
    pub fn settings(&self, mapping: &FieldMapping) -> CrmSettings {
        let timeout = Duration::from_secs(self.crm_timeout_secs);

        let hubspot = non_blank(&self.hubspot_api_key).map(|key| HubSpotConfig {
            access_token: key,
            base_url: self
                .hubspot_base_url
                .clone()
                .unwrap_or_else(|| hubspot::DEFAULT_BASE_URL.to_string()),
            timeout,
            lookup: self.hubspot_lookup,
            lookup_page_size: self.hubspot_lookup_page_size,
            fields: mapping.hubspot.clone(),
        });

        let close = non_blank(&self.close_api_key).map(|key| CloseConfig {
            api_key: key,
            base_url: self
                .close_base_url
                .clone()
                .unwrap_or_else(|| close::DEFAULT_BASE_URL.to_string()),
            app_url: self
                .close_app_url
                .clone()
                .unwrap_or_else(|| close::DEFAULT_APP_URL.to_string()),
            timeout,
            fields: mapping.close.clone(),
        });

        CrmSettings { hubspot, close }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::default().source(Some(map))
    }

    fn api_env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("API").source(Some(map))
    }

    #[test]
    fn test_api_defaults() {
        let config = ApiConfig::from_environment(api_env(&[])).unwrap();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(!config.enable_crm_test_endpoints);
        assert!(config.validate_field_mapping);
    }

    #[test]
    fn test_api_overrides() {
        let config = ApiConfig::from_environment(api_env(&[
            ("API_PORT", "3000"),
            ("API_LOG_FORMAT", "json"),
            ("API_ENABLE_CRM_TEST_ENDPOINTS", "true"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.enable_crm_test_endpoints);
    }

    #[test]
    fn test_blank_keys_disable_crms() {
        let config = CrmConfig::from_environment(env(&[
            ("HUBSPOT_API_KEY", "  "),
            ("CLOSE_API_KEY", "api_live"),
        ]))
        .unwrap();
        let settings = config.settings(&FieldMapping::default());

        assert!(settings.hubspot.is_none());
        let close = settings.close.unwrap();
        assert_eq!(close.api_key, "api_live");
        assert_eq!(close.base_url, "https://api.close.com/api/v1");
        assert_eq!(close.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_hubspot_tuning() {
        let config = CrmConfig::from_environment(env(&[
            ("HUBSPOT_API_KEY", "pat-na1-abc"),
            ("HUBSPOT_LOOKUP", "search"),
            ("HUBSPOT_LOOKUP_PAGE_SIZE", "25"),
            ("CRM_TIMEOUT_SECS", "3"),
            ("CRM_ADAPTER_TIMEOUT_SECS", "7"),
        ]))
        .unwrap();
        let hubspot = config.settings(&FieldMapping::default()).hubspot.unwrap();

        assert_eq!(hubspot.lookup, ContactLookup::Search);
        assert_eq!(hubspot.lookup_page_size, 25);
        assert_eq!(hubspot.timeout, Duration::from_secs(3));
        assert_eq!(hubspot.fields.twitter.as_deref(), Some("twitterhandle"));
        assert_eq!(config.adapter_timeout(), Duration::from_secs(7));
    }

    #[test]
    fn test_field_mapping_file() {
        let path = std::env::temp_dir().join(format!("field-mapping-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "version = 1\n\n[hubspot]\ntwitter = \"twitter_url\"\n\n[close]\ndiscord = \"cf_Discord9x\"\n",
        )
        .unwrap();

        let config = ApiConfig {
            field_mapping_path: Some(path.to_string_lossy().into_owned()),
            ..ApiConfig::default()
        };
        let mapping = config.load_field_mapping().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(mapping.hubspot.twitter.as_deref(), Some("twitter_url"));
        assert_eq!(mapping.hubspot.discord, None);
        assert_eq!(mapping.close.discord.as_deref(), Some("cf_Discord9x"));
    }

    #[test]
    fn test_field_mapping_rejects_other_versions() {
        let path = std::env::temp_dir().join(format!("field-mapping-v2-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"version": 2}"#).unwrap();

        let config = ApiConfig {
            field_mapping_path: Some(path.to_string_lossy().into_owned()),
            ..ApiConfig::default()
        };
        let err = config.load_field_mapping().unwrap_err().to_string();
        std::fs::remove_file(&path).ok();

        assert!(err.contains("unsupported field mapping version 2"), "{}", err);
    }
}
