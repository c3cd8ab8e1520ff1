//! Configuration management for the LLM council

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Which backend family serves the council
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterType {
    OpenRouter,
    Ollama,
}

impl FromStr for RouterType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openrouter" => Ok(RouterType::OpenRouter),
            "ollama" => Ok(RouterType::Ollama),
            other => Err(ConfigError::InvalidRouter(other.to_string())),
        }
    }
}

impl RouterType {
    pub fn default_council(&self) -> Vec<String> {
        let models: &[&str] = match self {
            RouterType::OpenRouter => &[
                "openai/gpt-5.1",
                "google/gemini-3-pro-preview",
                "anthropic/claude-sonnet-4.5",
                "x-ai/grok-4",
            ],
            RouterType::Ollama => &[
                "deepseek-r1:latest",
                "llama3.1:latest",
                "qwen3:latest",
                "gemma3:latest",
            ],
        };
        models.iter().map(|m| m.to_string()).collect()
    }

    pub fn default_chairman(&self) -> String {
        match self {
            RouterType::OpenRouter => "google/gemini-3-pro-preview".to_string(),
            RouterType::Ollama => "gemma3:latest".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend family used for every council query
    pub router: RouterType,

    /// Models queried in parallel each round
    pub council_models: Vec<String>,

    /// Model that synthesizes the final answer
    pub chairman_model: String,

    /// Where conversations are stored
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-model query timeout in seconds
    pub default_secs: f64,

    /// Timeout for conversation title generation in seconds
    pub title_generation_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenRouterConfig {
    /// API key (can be env var reference like $OPENROUTER_API_KEY)
    pub api_key: String,

    /// Chat completions endpoint
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// host:port of the Ollama server
    pub host: String,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_secs: 120.0,
            title_generation_secs: 180.0,
        }
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: "$OPENROUTER_API_KEY".to_string(),
            api_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "localhost:11434".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/conversations")
}

impl Default for Config {
    fn default() -> Self {
        Self::for_router(RouterType::OpenRouter)
    }
}

impl Config {
    /// Default configuration for a router type
    pub fn for_router(router: RouterType) -> Self {
        Self {
            router,
            council_models: router.default_council(),
            chairman_model: router.default_chairman(),
            data_dir: default_data_dir(),
            timeouts: TimeoutConfig::default(),
            openrouter: OpenRouterConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }

    /// Load config from file or create default
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            Ok(config)
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("llm-council")
            .join("config.toml")
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Switching the router without naming models resets the council and
    /// chairman to that router's defaults.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(router) = lookup("ROUTER_TYPE") {
            let router: RouterType = router.parse()?;
            if router != self.router {
                self.router = router;
                self.council_models = router.default_council();
                self.chairman_model = router.default_chairman();
            }
        }

        if let Some(models) = lookup("COUNCIL_MODELS") {
            self.council_models = parse_model_list(&models);
        }
        if let Some(chairman) = lookup("CHAIRMAN_MODEL").filter(|c| !c.is_empty()) {
            self.chairman_model = chairman;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("DEFAULT_TIMEOUT") {
            self.timeouts.default_secs = parse_secs("DEFAULT_TIMEOUT", &secs)?;
        }
        if let Some(secs) = lookup("TITLE_GENERATION_TIMEOUT") {
            self.timeouts.title_generation_secs = parse_secs("TITLE_GENERATION_TIMEOUT", &secs)?;
        }
        if let Some(key) = lookup("OPENROUTER_API_KEY") {
            self.openrouter.api_key = key;
        }
        if let Some(url) = lookup("OPENROUTER_API_URL") {
            self.openrouter.api_url = url;
        }
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.ollama.host = host;
        }

        Ok(())
    }

    /// Check the configuration before any client is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.router == RouterType::OpenRouter && self.resolve_api_key().is_none() {
            return Err(ConfigError::MissingApiKey("openrouter".to_string()));
        }

        if self.council_models.is_empty() {
            return Err(ConfigError::EmptyCouncil);
        }

        let mut seen = HashSet::new();
        for model in &self.council_models {
            if !seen.insert(model.as_str()) {
                return Err(ConfigError::DuplicateModel(model.clone()));
            }
        }

        check_secs("default_secs", self.timeouts.default_secs)?;
        check_secs("title_generation_secs", self.timeouts.title_generation_secs)?;

        Ok(())
    }

    /// Resolve the OpenRouter API key (handles env var references)
    pub fn resolve_api_key(&self) -> Option<String> {
        let key = &self.openrouter.api_key;
        if let Some(var) = key.strip_prefix('$') {
            std::env::var(var).ok().filter(|v| !v.is_empty())
        } else if key.is_empty() {
            None
        } else {
            Some(key.clone())
        }
    }

    /// Per-model query timeout. Values rejected by [`Config::validate`] fall
    /// back to the built-in default.
    pub fn default_timeout(&self) -> Duration {
        to_duration(self.timeouts.default_secs)
            .unwrap_or_else(|| Duration::from_secs_f64(TimeoutConfig::default().default_secs))
    }

    pub fn title_generation_timeout(&self) -> Duration {
        to_duration(self.timeouts.title_generation_secs).unwrap_or_else(|| {
            Duration::from_secs_f64(TimeoutConfig::default().title_generation_secs)
        })
    }
}

/// Split a comma separated model list, dropping empty entries
pub fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_secs(name: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidTimeout {
            name,
            value: raw.to_string(),
        })?;
    check_secs(name, value)?;
    Ok(value)
}

/// Positive and representable as a `Duration`
fn to_duration(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
}

fn check_secs(name: &'static str, value: f64) -> Result<(), ConfigError> {
    match to_duration(value) {
        Some(_) => Ok(()),
        None => Err(ConfigError::InvalidTimeout {
            name,
            value: value.to_string(),
        }),
    }
}
