// src/config/app.rs
//! Run configuration loaded from `config/newswire.toml`.
//!
//! TOML shape (every key optional):
//! ```toml
//! [wire]
//! api_key = "ENV"          # read NYT_API_KEY
//! limit = 500
//! verify_tls = false
//!
//! [sentiment]
//! provider = "google"      # or "lexicon"
//! credentials_path = "ENV" # read GOOGLE_APPLICATION_CREDENTIALS
//!
//! [run]
//! sample_size = 10
//! fallback_path = "dfOut.csv"
//! out_dir = "charts"
//! ```

use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::error::ConfigError;

pub const ENV_CONFIG_PATH: &str = "NEWSWIRE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/newswire.toml";
pub const ENV_WIRE_API_KEY: &str = "NYT_API_KEY";
pub const ENV_CREDENTIALS_PATH: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub wire: WireConfig,
    pub sentiment: SentimentConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WireConfig {
    /// Literal key, or "ENV" to read `NYT_API_KEY`.
    pub api_key: String,
    pub base_url: String,
    pub limit: u32,
    pub verify_tls: bool,
    pub timeout_secs: Option<u64>,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            api_key: "ENV".to_string(),
            base_url: "https://api.nytimes.com".to_string(),
            limit: 500,
            verify_tls: false,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    Lexicon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub provider: ProviderKind,
    /// Path to a credentials JSON, or "ENV" to read `GOOGLE_APPLICATION_CREDENTIALS`.
    pub credentials_path: String,
    pub base_url: String,
    pub language: String,
    pub timeout_secs: Option<u64>,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Google,
            credentials_path: "ENV".to_string(),
            base_url: "https://language.googleapis.com".to_string(),
            language: "en".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Articles analysed per run; 0 analyses everything fetched.
    pub sample_size: usize,
    pub fallback_path: PathBuf,
    pub out_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            sample_size: 10,
            fallback_path: PathBuf::from("dfOut.csv"),
            out_dir: PathBuf::from("charts"),
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load using env var + fallbacks:
    /// 1) explicit path (CLI)
    /// 2) $NEWSWIRE_CONFIG
    /// 3) config/newswire.toml, if present
    /// 4) built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = explicit {
            return Self::load_from_file(p);
        }
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            return Self::load_from_file(PathBuf::from(p));
        }
        let default = Path::new(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from_file(default);
        }
        Ok(Self::default())
    }
}

impl WireConfig {
    pub fn resolved_api_key(&self) -> Result<String, ConfigError> {
        resolve_env(&self.api_key, ENV_WIRE_API_KEY)
    }
}

impl SentimentConfig {
    pub fn resolved_credentials_path(&self) -> Result<PathBuf, ConfigError> {
        resolve_env(&self.credentials_path, ENV_CREDENTIALS_PATH).map(PathBuf::from)
    }
}

fn resolve_env(value: &str, var: &'static str) -> Result<String, ConfigError> {
    if value.trim().eq_ignore_ascii_case("env") {
        env::var(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingEnv { var })
    } else {
        Ok(value.to_string())
    }
}
