use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub const DEFAULT_CONTEXT_WINDOW: usize = 10; // 5 prior turns
pub const DEFAULT_TEMPERATURE: f64 = 0.9;
pub const DEFAULT_MAX_TOKENS: u32 = 10_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OPENAI_COMPAT_URL: &str = "http://localhost:11434/v1/chat/completions";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

const SHORT_SYSTEM_PROMPT: &str = "Ты AI-помощник приёмной комиссии КемГУ. \
Отвечай коротко и по делу, обращайся по имени, если оно известно.";

const FULL_SYSTEM_PROMPT: &str = "Ты AI-помощник приёмной комиссии Кемеровского государственного университета. \
Отвечай на вопросы абитуриентов о поступлении, документах, сроках и экзаменах.\n\n\
## ВАЖНО:\n\
- Если знаешь имя пользователя, обращайся к нему по имени.\n\
- Не повторяй одно и то же приветствие в каждом сообщении.\n\
- Говори кратко и по делу.\n\
- Если не знаешь ответ, предложи обратиться в приёмную комиссию или на сайт университета.";

const SHORT_GREETING: &str =
    "Здравствуйте! Вы обратились в приёмную комиссию КемГУ. Чем могу помочь?";

const FULL_GREETING: &str = "Здравствуйте! Вы обратились в приёмную комиссию \
Кемеровского государственного университета. Чем могу помочь?";

/// Top-level config (priem.toml + PRIEM_* env overrides + legacy env names).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriemConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

/// Which inference transport the deployment talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Ollama's native chat protocol (`/api/chat`).
    Ollama,
    /// OpenAI chat-completions endpoint, optionally behind a bearer token.
    #[default]
    OpenaiCompat,
    /// Plain REST endpoint with the chat-completions shape (LM Studio).
    GenericRest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    /// Full endpoint URL for REST kinds, server base URL for `ollama`.
    pub url: Option<String>,
    #[serde(default)]
    pub model: String,
    /// Bearer token, honoured by `openai_compat` only.
    pub api_key: Option<String>,
    /// Name shown to users in error replies. Defaults per kind.
    pub label: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            url: None,
            model: String::new(),
            api_key: None,
            label: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl BackendConfig {
    /// Configured URL, or the kind's well-known local default.
    /// `generic_rest` has no default.
    pub fn resolved_url(&self) -> Option<String> {
        if let Some(url) = self.url.as_deref().map(str::trim) {
            if !url.is_empty() {
                return Some(url.to_string());
            }
        }
        match self.kind {
            BackendKind::Ollama => Some(DEFAULT_OLLAMA_URL.to_string()),
            BackendKind::OpenaiCompat => Some(DEFAULT_OPENAI_COMPAT_URL.to_string()),
            BackendKind::GenericRest => None,
        }
    }

    pub fn label(&self) -> String {
        match self.label.as_deref() {
            Some(l) if !l.trim().is_empty() => l.to_string(),
            _ => match self.kind {
                BackendKind::Ollama | BackendKind::OpenaiCompat => "Ollama".to_string(),
                BackendKind::GenericRest => "LM Studio".to_string(),
            },
        }
    }

    /// Non-empty API key, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Persona text. Falls back to the preset for `backend.kind`.
    pub system_prompt: Option<String>,
    /// Reply to `/start`. Falls back to the preset for `backend.kind`.
    pub greeting: Option<String>,
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            greeting: None,
            context_window: DEFAULT_CONTEXT_WINDOW,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_context_window() -> usize {
    DEFAULT_CONTEXT_WINDOW
}
fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl PriemConfig {
    /// Load config and validate it.
    ///
    /// Sources, later wins:
    ///   1. TOML file: explicit path, else ~/.priem/priem.toml (optional)
    ///   2. Legacy env names (TELEGRAM_BOT_TOKEN, MODEL_NAME, OLLAMA_URL, ...)
    ///   3. PRIEM_* env, `__` separates sections (PRIEM_BACKEND__MODEL)
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::from_figment(Self::figment(config_path))
    }

    pub fn figment(config_path: Option<&str>) -> Figment {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Figment::new()
            .merge(Toml::file(path))
            .merge(legacy_env())
            .merge(Env::prefixed("PRIEM_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: PriemConfig = figment
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot serve traffic.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::Missing("telegram.bot_token"));
        }
        if self.backend.model.trim().is_empty() {
            return Err(ConfigError::Missing("backend.model"));
        }
        if self.backend.resolved_url().is_none() {
            return Err(ConfigError::Missing("backend.url"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "backend.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.backend.kind != BackendKind::OpenaiCompat && self.backend.api_key().is_some() {
            tracing::warn!(kind = ?self.backend.kind, "backend.api_key is ignored for this backend kind");
        }
        Ok(())
    }

    pub fn system_prompt(&self) -> &str {
        match self.agent.system_prompt.as_deref() {
            Some(p) if !p.trim().is_empty() => p,
            _ => match self.backend.kind {
                BackendKind::Ollama | BackendKind::OpenaiCompat => SHORT_SYSTEM_PROMPT,
                BackendKind::GenericRest => FULL_SYSTEM_PROMPT,
            },
        }
    }

    pub fn greeting(&self) -> &str {
        match self.agent.greeting.as_deref() {
            Some(g) if !g.trim().is_empty() => g,
            _ => match self.backend.kind {
                BackendKind::Ollama | BackendKind::OpenaiCompat => SHORT_GREETING,
                BackendKind::GenericRest => FULL_GREETING,
            },
        }
    }
}

/// Environment variable names used by the earlier single-backend deployments.
fn legacy_env() -> Env {
    Env::raw().filter_map(|key| {
        let mapped = match key.as_str().to_ascii_uppercase().as_str() {
            "TELEGRAM_BOT_TOKEN" | "TELEGRAM_TOKEN" => "telegram.bot_token",
            "MODEL_NAME" => "backend.model",
            "OLLAMA_URL" | "OLLAMA_API_URL" | "LM_STUDIO_LINK" => "backend.url",
            "OLLAMA_API_KEY" => "backend.api_key",
            _ => return None,
        };
        Some(mapped.into())
    })
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.priem/priem.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Result<PriemConfig> {
        PriemConfig::from_figment(Figment::new().merge(Toml::string(toml)))
    }

    #[test]
    fn minimal_openai_compat_config_uses_defaults() {
        let config = from_toml(
            r#"
            [telegram]
            bot_token = "123:abc"
            [backend]
            model = "qwen2.5:7b"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.kind, BackendKind::OpenaiCompat);
        assert_eq!(
            config.backend.resolved_url().as_deref(),
            Some(DEFAULT_OPENAI_COMPAT_URL)
        );
        assert_eq!(config.backend.timeout(), Duration::from_secs(30));
        assert_eq!(config.agent.context_window, 10);
        assert_eq!(config.agent.max_tokens, 10_000);
        assert!((config.agent.temperature - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.backend.label(), "Ollama");
        assert!(config.system_prompt().contains("КемГУ"));
    }

    #[test]
    fn missing_bot_token_is_reported() {
        let err = from_toml(
            r#"
            [backend]
            model = "m"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("telegram.bot_token")));
    }

    #[test]
    fn missing_model_is_reported() {
        let err = from_toml(
            r#"
            [telegram]
            bot_token = "t"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("backend.model")));
    }

    #[test]
    fn generic_rest_requires_url() {
        let err = from_toml(
            r#"
            [telegram]
            bot_token = "t"
            [backend]
            kind = "generic_rest"
            model = "m"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("backend.url")));
    }

    #[test]
    fn generic_rest_uses_full_persona_and_lm_studio_label() {
        let config = from_toml(
            r#"
            [telegram]
            bot_token = "t"
            [backend]
            kind = "generic_rest"
            url = "http://127.0.0.1:1234/v1/chat/completions"
            model = "m"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.label(), "LM Studio");
        assert!(config.system_prompt().contains("## ВАЖНО:"));
        assert!(config.greeting().contains("Кемеровского государственного университета"));
    }

    #[test]
    fn explicit_prompt_overrides_preset() {
        let config = from_toml(
            r#"
            [telegram]
            bot_token = "t"
            [backend]
            model = "m"
            [agent]
            system_prompt = "Be brief."
            greeting = "Hi"
            context_window = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.system_prompt(), "Be brief.");
        assert_eq!(config.greeting(), "Hi");
        assert_eq!(config.agent.context_window, 4);
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let err = from_toml(
            r#"
            [telegram]
            bot_token = "t"
            [backend]
            model = "m"
            timeout_secs = 0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn blank_api_key_is_treated_as_absent() {
        let backend = BackendConfig {
            api_key: Some("  ".to_string()),
            ..BackendConfig::default()
        };
        assert!(backend.api_key().is_none());
    }
}
