use crate::core::error::{DispatchError, PratError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_TOKENS: u32 = 2048;
const DEFAULT_SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";
const DEFAULT_SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Closed set of chat backends an adapter exists for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKey {
    #[default]
    OpenAI,
    #[serde(alias = "anthropic")]
    Claude,
    Gemini,
    /// The project's own chat server (`POST {base}/chat`).
    Local,
}

impl ProviderKey {
    pub const ALL: [ProviderKey; 4] = [
        ProviderKey::OpenAI,
        ProviderKey::Claude,
        ProviderKey::Gemini,
        ProviderKey::Local,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKey::OpenAI => "openai",
            ProviderKey::Claude => "claude",
            ProviderKey::Gemini => "gemini",
            ProviderKey::Local => "local",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKey::OpenAI => "https://api.openai.com/v1",
            ProviderKey::Claude => "https://api.anthropic.com/v1",
            ProviderKey::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKey::Local => "http://localhost:8000/api",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKey::OpenAI => "gpt-4.1-mini",
            ProviderKey::Claude => "claude-sonnet-4-20250514",
            ProviderKey::Gemini => "gemini-2.5-flash",
            ProviderKey::Local => "local",
        }
    }

    /// Environment variable holding the API key, if the backend needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKey::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKey::Claude => Some("ANTHROPIC_API_KEY"),
            ProviderKey::Gemini => Some("GEMINI_API_KEY"),
            ProviderKey::Local => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKey {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKey::OpenAI),
            "claude" | "anthropic" => Ok(ProviderKey::Claude),
            "gemini" => Ok(ProviderKey::Gemini),
            "local" => Ok(ProviderKey::Local),
            _ => Err(DispatchError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// One Gemini content filter: a harm category and its block threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl SafetySetting {
    pub fn new(category: impl Into<String>, threshold: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            threshold: threshold.into(),
        }
    }

    /// Every harm category blocked at medium probability and above.
    pub fn defaults() -> Vec<SafetySetting> {
        DEFAULT_SAFETY_CATEGORIES
            .iter()
            .map(|category| SafetySetting::new(*category, DEFAULT_SAFETY_THRESHOLD))
            .collect()
    }
}

/// Per-provider entry of the config file. Every field is optional;
/// [`ProviderConfig::resolve`] fills in the provider's defaults.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Gemini only. An empty list sends no `safetySettings`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
}

impl ProviderConfig {
    pub fn resolve(&self, key: ProviderKey, system_prompt: Option<&str>) -> ProviderSettings {
        let base_url = self
            .base_url
            .as_deref()
            .unwrap_or(key.default_base_url())
            .trim_end_matches('/')
            .to_string();

        let (max_tokens, temperature, top_k, top_p) = match key {
            ProviderKey::OpenAI | ProviderKey::Local => {
                (self.max_tokens, self.temperature, self.top_k, self.top_p)
            }
            ProviderKey::Claude => (
                Some(self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
                self.temperature,
                self.top_k,
                self.top_p,
            ),
            ProviderKey::Gemini => (
                Some(self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)),
                Some(self.temperature.unwrap_or(0.9)),
                Some(self.top_k.unwrap_or(1)),
                Some(self.top_p.unwrap_or(1.0)),
            ),
        };

        let safety_settings = match key {
            ProviderKey::Gemini => self
                .safety_settings
                .clone()
                .unwrap_or_else(SafetySetting::defaults),
            _ => Vec::new(),
        };

        ProviderSettings {
            key,
            api_key: self.api_key.clone().unwrap_or_default(),
            base_url,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| key.default_model().to_string()),
            max_tokens,
            temperature,
            top_k,
            top_p,
            safety_settings,
            system_prompt: system_prompt
                .filter(|p| !p.trim().is_empty())
                .map(str::to_string),
        }
    }
}

/// Fully resolved, read-only settings an adapter is built from.
#[derive(Clone, PartialEq)]
pub struct ProviderSettings {
    pub key: ProviderKey,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_k: Option<u32>,
    pub top_p: Option<f64>,
    pub safety_settings: Vec<SafetySetting>,
    pub system_prompt: Option<String>,
}

impl ProviderSettings {
    pub fn defaults(key: ProviderKey) -> Self {
        ProviderConfig::default().resolve(key, None)
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("key", &self.key)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("top_p", &self.top_p)
            .field("safety_settings", &self.safety_settings)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_provider: Option<ProviderKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub providers: HashMap<ProviderKey, ProviderConfig>,
}

impl Config {
    fn config_dir() -> PathBuf {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join(".prat").join("config.yaml")
    }

    pub fn from_yaml(contents: &str) -> Result<Config, PratError> {
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yml::from_str::<Config>(contents)?)
    }

    /// Reads the config at `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Config, PratError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
            .map_err(|e| PratError::Config(format!("Parse {}: {}", path.display(), e)))
    }

    /// Loads `~/.prat/config.yaml` and overlays credentials from the environment.
    pub fn load() -> Result<Config, PratError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PratError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml_content = serde_yml::to_string(self)?;
        fs::write(path, yaml_content)?;
        Ok(())
    }

    pub fn save(&self) -> Result<(), PratError> {
        self.save_to(&Self::config_path())
    }

    pub fn apply_env(&mut self) -> Result<(), PratError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Environment values win over the file for API keys; `PRAT_PROVIDER`
    /// overrides the active provider.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), PratError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in ProviderKey::ALL {
            let Some(var) = key.api_key_env() else {
                continue;
            };
            if let Some(api_key) = lookup(var).filter(|v| !v.trim().is_empty()) {
                debug!(provider = %key, "api key taken from {}", var);
                self.providers.entry(key).or_default().api_key = Some(api_key);
            }
        }

        if let Some(name) = lookup("PRAT_PROVIDER").filter(|v| !v.trim().is_empty()) {
            let key = name
                .parse::<ProviderKey>()
                .map_err(|e| PratError::Config(format!("PRAT_PROVIDER: {}", e)))?;
            self.active_provider = Some(key);
        }

        Ok(())
    }

    pub fn active_provider(&self) -> ProviderKey {
        self.active_provider.unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn has_credentials(&self, key: ProviderKey) -> bool {
        !key.requires_api_key()
            || self
                .providers
                .get(&key)
                .and_then(|p| p.api_key.as_deref())
                .is_some_and(|k| !k.trim().is_empty())
    }

    pub fn provider_settings(&self, key: ProviderKey) -> ProviderSettings {
        self.providers
            .get(&key)
            .cloned()
            .unwrap_or_default()
            .resolve(key, self.system_prompt.as_deref())
    }
}
