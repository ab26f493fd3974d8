use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for esreport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Capture final job outcomes
    #[serde(default)]
    pub jobs: bool,

    /// Also capture intermediate failed attempts that will be retried
    #[serde(default)]
    pub job_attempts: bool,

    /// Capture HTTP requests
    #[serde(default)]
    pub requests: bool,

    /// Overrides the group, which defaults to the environment
    #[serde(default)]
    pub log_group: Option<String>,

    #[serde(default = "default_redaction")]
    pub redaction: Vec<String>,

    #[serde(default = "default_ink")]
    pub redaction_ink: String,

    #[serde(default = "default_max_size")]
    pub max_request: usize,

    #[serde(default = "default_max_size")]
    pub max_response: usize,

    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_env")]
    pub env: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// Credentials embedded in the host URL
    #[default]
    Url,
    /// `Authorization: ApiKey ...`
    Apikey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    #[serde(default)]
    pub hosts: Vec<String>,

    #[serde(default)]
    pub auth_type: AuthType,

    #[serde(default)]
    pub auth_api_id: Option<String>,

    #[serde(default)]
    pub auth_api_key: Option<String>,

    /// Index prefix, `{env}_` when unset
    #[serde(default)]
    pub prefix: Option<String>,

    /// Days of partitions `tidy` keeps when no count is given
    #[serde(default)]
    pub keep_days: Option<i64>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jobs: false,
            job_attempts: false,
            requests: false,
            log_group: None,
            app: AppConfig::default(),
            elasticsearch: ElasticsearchConfig::default(),
            redaction: default_redaction(),
            redaction_ink: default_ink(),
            max_request: default_max_size(),
            max_response: default_max_size(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: None,
            env: default_env(),
        }
    }
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            auth_type: AuthType::default(),
            auth_api_id: None,
            auth_api_key: None,
            prefix: None,
            keep_days: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_env() -> String {
    "production".to_string()
}

fn default_timeout() -> u64 {
    3
}

fn default_max_size() -> usize {
    200_000
}

fn default_ink() -> String {
    "[--REDACTED--]".to_string()
}

fn default_redaction() -> Vec<String> {
    vec![
        "password".to_string(),
        "password_confirmation".to_string(),
        "authorization".to_string(),
        "telephone_number".to_string(),
        "email".to_string(),
        "algolia_key".to_string(),
        "access-token".to_string(),
    ]
}

fn parse_bool(name: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("{} must be a boolean, got '{}'", name, other),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        let mut config = if path.exists() {
            Self::read(&path)?
        } else {
            // Create default config file
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&path, content)?;
            config
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from an explicit file, environment overrides included
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file as written, without environment overrides
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "esreport", "esreport") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.esreport/config.toml")
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOG_JOBS") {
            self.jobs = parse_bool("LOG_JOBS", &v)?;
        }
        if let Some(v) = lookup("LOG_JOB_ATTEMPTS") {
            self.job_attempts = parse_bool("LOG_JOB_ATTEMPTS", &v)?;
        }
        if let Some(v) = lookup("LOG_REQUESTS") {
            self.requests = parse_bool("LOG_REQUESTS", &v)?;
        }
        if let Some(v) = lookup("LOG_GROUP") {
            self.log_group = Some(v);
        }
        if let Some(v) = lookup("APP_NAME") {
            self.app.name = Some(v);
        }
        if let Some(v) = lookup("APP_ENV") {
            self.app.env = v;
        }

        let es = &mut self.elasticsearch;
        if let Some(v) = lookup("LOG_ELASTICSEARCH_HOST") {
            es.hosts = parse_list(&v);
        }
        if let Some(v) = lookup("LOG_ELASTICSEARCH_AUTH_TYPE") {
            es.auth_type = match v.trim().to_ascii_lowercase().as_str() {
                "url" => AuthType::Url,
                "apikey" => AuthType::Apikey,
                other => bail!("LOG_ELASTICSEARCH_AUTH_TYPE must be 'url' or 'apikey', got '{}'", other),
            };
        }
        if let Some(v) = lookup("LOG_ELASTICSEARCH_AUTH_API_ID") {
            es.auth_api_id = Some(v);
        }
        if let Some(v) = lookup("LOG_ELASTICSEARCH_AUTH_API_KEY") {
            es.auth_api_key = Some(v);
        }
        if let Some(v) = lookup("LOG_ELASTICSEARCH_PREFIX") {
            es.prefix = Some(v);
        }
        if let Some(v) = lookup("LOG_ELASTICSEARCH_KEEP_DAYS") {
            es.keep_days = Some(
                v.trim()
                    .parse()
                    .with_context(|| format!("LOG_ELASTICSEARCH_KEEP_DAYS is not a number: '{}'", v))?,
            );
        }

        if let Some(v) = lookup("LOG_REDACTION_INK") {
            self.redaction_ink = v;
        }
        if let Some(v) = lookup("LOG_REQUEST_MAX_SIZE") {
            self.max_request = v
                .trim()
                .parse()
                .with_context(|| format!("LOG_REQUEST_MAX_SIZE is not a number: '{}'", v))?;
        }
        if let Some(v) = lookup("LOG_RESPONSE_MAX_SIZE") {
            self.max_response = v
                .trim()
                .parse()
                .with_context(|| format!("LOG_RESPONSE_MAX_SIZE is not a number: '{}'", v))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.redaction_ink.is_empty() {
            bail!("redaction_ink must not be empty");
        }

        let es = &self.elasticsearch;
        if es.auth_type == AuthType::Apikey
            && (es.auth_api_id.as_deref().unwrap_or_default().is_empty()
                || es.auth_api_key.as_deref().unwrap_or_default().is_empty())
        {
            bail!("apikey authentication requires auth_api_id and auth_api_key");
        }

        if let Some(days) = es.keep_days
            && days < 0
        {
            bail!("keep_days must not be negative, got {}", days);
        }

        Ok(())
    }

    /// Index prefix, derived from the environment when not configured
    pub fn prefix(&self) -> String {
        self.elasticsearch
            .prefix
            .clone()
            .unwrap_or_else(|| format!("{}_", self.app.env))
    }

    pub fn group(&self) -> String {
        self.log_group.clone().unwrap_or_else(|| self.app.env.clone())
    }

    /// Whether a store is configured at all
    pub fn has_store(&self) -> bool {
        !self.elasticsearch.hosts.is_empty()
    }
}
