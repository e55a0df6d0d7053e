//! Application configuration loaded from environment variables.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Credential Parameters ===
    /// Parameter Store name holding the access key id.
    #[serde(default = "default_access_key_param")]
    pub access_key_param: String,

    /// Parameter Store name holding the secret access key.
    #[serde(default = "default_secret_key_param")]
    pub secret_key_param: String,

    /// Region every capability handle is scoped to.
    #[serde(default = "default_region")]
    pub aws_region: String,

    // === Advisory Checks ===
    /// Language advisory check descriptions are fetched in.
    #[serde(default = "default_advisor_language")]
    pub advisor_language: String,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,

    // === Metrics ===
    /// Enable the Prometheus exporter.
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Prometheus exporter port.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_access_key_param() -> String {
    "tenant1_access_key".to_string()
}

fn default_secret_key_param() -> String {
    "tenant1_secret_key".to_string()
}

fn default_region() -> String {
    "ap-south-1".to_string()
}

fn default_advisor_language() -> String {
    "en".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_key_param.trim().is_empty() {
            return Err("ACCESS_KEY_PARAM must not be empty".to_string());
        }

        if self.secret_key_param.trim().is_empty() {
            return Err("SECRET_KEY_PARAM must not be empty".to_string());
        }

        if self.aws_region.trim().is_empty() {
            return Err("AWS_REGION must not be empty".to_string());
        }

        if self.advisor_language.trim().is_empty() {
            return Err("ADVISOR_LANGUAGE must not be empty".to_string());
        }

        if self.metrics_enabled && self.metrics_port == self.port {
            return Err("METRICS_PORT must differ from PORT".to_string());
        }

        Ok(())
    }
}
