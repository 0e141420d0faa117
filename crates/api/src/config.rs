use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub storage: StorageConfig,
    pub evaluation: EvaluationConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Usually supplied through `HF_TOKEN` rather than the config file
    #[serde(skip_serializing)]
    pub api_key: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub config_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Refuse to evaluate while no rubric is stored
    pub require_rubric: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.huggingface.co/v1".to_string(),
            model: "openai/gpt-oss-120b".to_string(),
            api_key: String::new(),
            max_tokens: 500,
            temperature: None,
            top_p: None,
            request_timeout_secs: 60,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff_ms: 500,
            max_backoff_ms: 5000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("docs"),
        }
    }
}

impl LlmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// Defaults, then the TOML file named by `GRADER_CONFIG`, then environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("GRADER_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config file: {:?}", path))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides; `lookup` is `std::env::var` outside tests
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GRADER_BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = lookup("GRADER_CONFIG_DIR") {
            self.storage.config_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("HF_TOKEN").or_else(|| lookup("LLM_API_KEY")) {
            self.llm.api_key = v;
        }
        if let Some(v) = lookup("LLM_MAX_TOKENS") {
            self.llm.max_tokens = v.parse().context("LLM_MAX_TOKENS must be an integer")?;
        }
        if let Some(v) = lookup("LLM_TEMPERATURE") {
            self.llm.temperature = Some(v.parse().context("LLM_TEMPERATURE must be a number")?);
        }
        if let Some(v) = lookup("LLM_TOP_P") {
            self.llm.top_p = Some(v.parse().context("LLM_TOP_P must be a number")?);
        }
        if let Some(v) = lookup("LLM_TIMEOUT_SECS") {
            self.llm.request_timeout_secs =
                v.parse().context("LLM_TIMEOUT_SECS must be an integer")?;
        }
        if let Some(v) = lookup("GRADER_REQUIRE_RUBRIC") {
            self.evaluation.require_rubric = parse_flag(&v);
        }
        if let Some(v) = lookup("GRADER_LOG_JSON") {
            self.log.json = parse_flag(&v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.llm.max_tokens >= 1, "llm.max_tokens must be at least 1");
        ensure!(
            self.llm.request_timeout_secs >= 1,
            "llm.request_timeout_secs must be at least 1"
        );
        ensure!(!self.llm.model.is_empty(), "llm.model must not be empty");
        if let Some(t) = self.llm.temperature {
            ensure!((0.0..=2.0).contains(&t), "llm.temperature must be within 0..=2");
        }
        if let Some(p) = self.llm.top_p {
            ensure!(p > 0.0 && p <= 1.0, "llm.top_p must be within (0, 1]");
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
