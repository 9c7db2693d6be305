use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub evals: EvalsConfig,
    #[serde(default)]
    pub registrar: RegistrarConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("./out")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EvalsConfig {
    #[serde(default = "default_eval_base_url")]
    pub base_url: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Requests in flight per batch. The evaluation site tolerates very
    /// little; 2 has proven fast enough without drawing an IP ban.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_eval_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EvalsConfig {
    fn default() -> Self {
        Self {
            base_url: default_eval_base_url(),
            cookie_name: default_cookie_name(),
            concurrency: default_concurrency(),
            batch_delay_ms: default_batch_delay_ms(),
            timeout_secs: default_eval_timeout_secs(),
        }
    }
}

fn default_eval_base_url() -> String {
    "https://registrarapps.princeton.edu/course-evaluation".to_string()
}
fn default_cookie_name() -> String {
    "PHPSESSID".to_string()
}
fn default_concurrency() -> usize {
    2
}
fn default_batch_delay_ms() -> u64 {
    20
}
fn default_eval_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegistrarConfig {
    #[serde(default = "default_registrar_api_url")]
    pub api_url: String,
    /// Public page whose embedded `apiToken` authenticates listings calls.
    #[serde(default = "default_registrar_token_url")]
    pub token_url: String,
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            api_url: default_registrar_api_url(),
            token_url: default_registrar_token_url(),
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

fn default_registrar_api_url() -> String {
    "https://api.princeton.edu/registrar/course-offerings/classes/".to_string()
}
fn default_registrar_token_url() -> String {
    "https://registrar.princeton.edu/course-offerings".to_string()
}
fn default_api_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_api_url")]
    pub api_url: String,
    /// Pause between terms when caching several; the catalog API is slow
    /// and its performance fluctuates heavily.
    #[serde(default = "default_term_delay_ms")]
    pub term_delay_ms: u64,
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_url: default_catalog_api_url(),
            term_delay_ms: default_term_delay_ms(),
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

fn default_catalog_api_url() -> String {
    "https://api.princeton.edu/student-app/1.0.3/".to_string()
}
fn default_term_delay_ms() -> u64 {
    5000
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;

    Ok(config)
}

/// Load the config file if it exists, otherwise fall back to defaults.
/// A file that exists but fails to parse or validate is still an error.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::default())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.evals.concurrency == 0 {
        anyhow::bail!("evals.concurrency must be >= 1");
    }

    if config.evals.timeout_secs == 0 {
        anyhow::bail!("evals.timeout_secs must be > 0");
    }

    if config.evals.base_url.is_empty() {
        anyhow::bail!("evals.base_url must not be empty");
    }

    if config.registrar.api_url.is_empty() || config.registrar.token_url.is_empty() {
        anyhow::bail!("registrar.api_url and registrar.token_url must not be empty");
    }

    if config.catalog.api_url.is_empty() {
        anyhow::bail!("catalog.api_url must not be empty");
    }

    Ok(())
}
