//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;
use vaccin_core::{DeliverySchema, SchemaError};

const DEFAULT_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_BIND_ADDRESS: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);

/// Configuration errors that prevent the server from starting
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Failed to read {path}: {message}")]
    SchemaFile { path: String, message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Server configuration loaded from environment variables
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    pub openai_api_key: Option<String>,
    pub vector_store_id: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    pub max_search_results: u32,
    pub max_output_tokens: u32,
    pub schema: DeliverySchema,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A missing OpenAI key or vector store id is not an error here: the
    /// diagnostic endpoint reports it per request.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: parse_var("BIND_ADDRESS", DEFAULT_BIND_ADDRESS)?,
            api_key: non_empty_var("API_KEY"),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            rate_limit_rps: parse_var("RATE_LIMIT_RPS", 10)?,
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            vector_store_id: non_empty_var("VECTOR_STORE_ID"),
            openai_base_url: non_empty_var("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            model: non_empty_var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            max_search_results: parse_var("FILE_SEARCH_MAX_RESULTS", 12)?,
            max_output_tokens: parse_var("MAX_OUTPUT_TOKENS", 16000)?,
            schema: load_schema()?,
        })
    }

    /// Both upstream credentials, when configured
    pub fn openai_credentials(&self) -> Option<(&str, &str)> {
        match (&self.openai_api_key, &self.vector_store_id) {
            (Some(key), Some(store)) => Some((key.as_str(), store.as_str())),
            _ => None,
        }
    }
}

/// Inline JSON wins over a file path; the bundled schema is the fallback
fn load_schema() -> Result<DeliverySchema, ConfigError> {
    if let Some(inline) = non_empty_var("DIAGNOSTIC_SCHEMA_JSON") {
        return Ok(DeliverySchema::parse(&inline, "DIAGNOSTIC_SCHEMA_JSON")?);
    }

    if let Some(path) = non_empty_var("DIAGNOSTIC_SCHEMA_PATH") {
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::SchemaFile {
            path: path.clone(),
            message: e.to_string(),
        })?;
        return Ok(DeliverySchema::parse(&text, &path)?);
    }

    Ok(DeliverySchema::bundled()?)
}

fn non_empty_var(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(var) {
        Some(value) => parse_value(var, value),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}
