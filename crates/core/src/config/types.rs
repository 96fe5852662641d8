use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    pub htr: HtrServiceConfig,
    pub pipeline: PipelineConfig,
}

/// Server configuration (HTTP façade)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("scrivano.db")
}

/// Defaults for the repository export tool, overridable per invocation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RepositoryConfig {
    /// Installation root passed to the export tool.
    #[serde(default)]
    pub root: Option<String>,
    /// Identity the export tool acts as.
    #[serde(default)]
    pub user: Option<String>,
    /// Site URI passed to the export tool.
    #[serde(default)]
    pub uri: Option<String>,
}

/// Remote recognition service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HtrServiceConfig {
    /// Base URL of the processing endpoint.
    #[serde(default = "default_processing_url")]
    pub processing_url: String,
    /// OAuth token endpoint.
    #[serde(default = "default_token_url")]
    pub token_url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Default recognition model when none is given on the command line.
    #[serde(default)]
    pub default_model: Option<i64>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_processing_url() -> String {
    "https://transkribus.eu/processing/v1/processes".to_string()
}

fn default_token_url() -> String {
    "https://account.readcoop.eu/auth/realms/readcoop/protocol/openid-connect/token".to_string()
}

fn default_client_id() -> String {
    "processing-api-client".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Compiled stylesheet used to turn recognition results into hOCR.
    pub stylesheet: PathBuf,
    /// Root under which staging directories are created (default: OS temp dir).
    #[serde(default)]
    pub staging_root: Option<PathBuf>,
    /// Minimum spacing between job submissions in seconds.
    #[serde(default = "default_submit_interval")]
    pub submit_interval_secs: u64,
    /// Delay before the first batch re-poll after an upload.
    #[serde(default = "default_initial_poll_delay")]
    pub initial_poll_delay_secs: u64,
    /// Delay between status checks in the single-page wait loop.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Overall bound on any polling loop.
    #[serde(default = "default_poll_deadline")]
    pub poll_deadline_secs: u64,
}

fn default_submit_interval() -> u64 {
    1
}

fn default_initial_poll_delay() -> u64 {
    15
}

fn default_poll_interval() -> u64 {
    5
}

fn default_poll_deadline() -> u64 {
    3600
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub repository: RepositoryConfig,
    pub htr: SanitizedHtrConfig,
    pub pipeline: PipelineConfig,
}

/// Sanitized recognition service config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedHtrConfig {
    pub processing_url: String,
    pub token_url: String,
    pub username: String,
    pub password_configured: bool,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_model: Option<i64>,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            repository: config.repository.clone(),
            htr: SanitizedHtrConfig {
                processing_url: config.htr.processing_url.clone(),
                token_url: config.htr.token_url.clone(),
                username: config.htr.username.clone(),
                password_configured: !config.htr.password.is_empty(),
                client_id: config.htr.client_id.clone(),
                default_model: config.htr.default_model,
                timeout_secs: config.htr.timeout_secs,
            },
            pipeline: config.pipeline.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            repository: RepositoryConfig::default(),
            htr: HtrServiceConfig {
                processing_url: default_processing_url(),
                token_url: default_token_url(),
                username: "reader".to_string(),
                password: "hunter2".to_string(),
                client_id: default_client_id(),
                default_model: Some(12345),
                timeout_secs: 30,
            },
            pipeline: PipelineConfig {
                stylesheet: PathBuf::from("alto2hocr.sef.json"),
                staging_root: None,
                submit_interval_secs: 1,
                initial_poll_delay_secs: 15,
                poll_interval_secs: 5,
                poll_deadline_secs: 3600,
            },
        }
    }

    #[test]
    fn test_sanitized_config_redacts_password() {
        let config = test_config();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.htr.password_configured);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("reader"));
    }

    #[test]
    fn test_sanitized_config_empty_password() {
        let mut config = test_config();
        config.htr.password = String::new();
        let sanitized = SanitizedConfig::from(&config);
        assert!(!sanitized.htr.password_configured);
    }
}
