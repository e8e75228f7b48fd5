use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Connection settings for the hosted backend (row storage + auth).
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.example.co`.
    pub url: String,
    /// Publishable API key sent with every request.
    pub api_key: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.backend.normalize_from_env();
        self.backend.validate()?;
        Ok(())
    }
}

impl BackendConfig {
    /// Fill missing values from the environment (`.env` is honored).
    pub fn normalize_from_env(&mut self) {
        let _ = dotenvy::dotenv();
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("BACKEND_URL") {
                self.url = url;
            }
        }
        if self.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var("BACKEND_API_KEY") {
                self.api_key = key;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!(
                "backend.url is empty; set it in config.toml or the BACKEND_URL environment variable"
            ));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("https://") || lower.starts_with("http://")) {
            return Err(anyhow!("backend.url must start with https:// or http://"));
        }
        if self.api_key.trim().is_empty() {
            return Err(anyhow!(
                "backend.api_key is empty; set it in config.toml or the BACKEND_API_KEY environment variable"
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("backend.request_timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }
}
