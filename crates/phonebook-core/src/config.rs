use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_PASS_PHRASE: &str = "PASSWORD";
pub const DEFAULT_DASHBOARD_TOPIC: &str = "solar energy Singapore";

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub api_base: Option<String>,
    pub api_token: Option<String>,
    pub pass_phrase: Option<String>,
    pub dashboard_topic: Option<String>,
    pub session_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Environment variables win over the config file
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(base) = lookup("PHONEBOOK_API_BASE") {
            self.api_base = Some(base);
        }
        if let Some(token) = lookup("PHONEBOOK_TOKEN") {
            self.api_token = Some(token);
        }
        if let Some(pass) = lookup("PHONEBOOK_PASS_PHRASE") {
            self.pass_phrase = Some(pass);
        }
        if let Some(topic) = lookup("PHONEBOOK_DASHBOARD_TOPIC") {
            self.dashboard_topic = Some(topic);
        }
        self
    }

    pub fn api_base(&self) -> String {
        normalize_base_url(self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE))
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn pass_phrase(&self) -> &str {
        self.pass_phrase.as_deref().unwrap_or(DEFAULT_PASS_PHRASE)
    }

    pub fn dashboard_topic(&self) -> &str {
        self.dashboard_topic.as_deref().unwrap_or(DEFAULT_DASHBOARD_TOPIC)
    }

    pub fn session_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.session_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?;

        Ok(cache_dir.join("phonebook").join("session"))
    }

    /// Where studio images are written
    pub fn output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        dirs::picture_dir()
            .or_else(dirs::data_dir)
            .map(|p| p.join("phonebook"))
            .unwrap_or_else(|| PathBuf::from("phonebook-images"))
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("phonebook").join("config.json"))
    }
}

/// Trim trailing slashes and point a wildcard bind address at localhost
pub fn normalize_base_url(raw: &str) -> String {
    let url = raw.trim().trim_end_matches('/');
    let (scheme, rest) = match url.find("://") {
        Some(i) => url.split_at(i + 3),
        None => ("", url),
    };
    let host_end = rest.find([':', '/']).unwrap_or(rest.len());
    if &rest[..host_end] == "0.0.0.0" {
        format!("{}localhost{}", scheme, &rest[host_end..])
    } else {
        url.to_string()
    }
}
