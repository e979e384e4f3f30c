use std::sync::Arc;

use clap::Parser;
use tracing::info;

use priem_agent::generic::GenericRestBackend;
use priem_agent::ollama::OllamaBackend;
use priem_agent::openai::OpenAiCompatBackend;
use priem_agent::{ConversationHandler, LlmBackend};
use priem_core::config::{BackendConfig, BackendKind, PriemConfig};
use priem_core::error::ConfigError;
use priem_telegram::TelegramAdapter;

#[derive(Parser)]
#[command(name = "priem-gateway")]
#[command(about = "Telegram assistant for the KemSU admissions office", long_about = None)]
struct Cli {
    /// Path to priem.toml (falls back to PRIEM_CONFIG, then ~/.priem/priem.toml)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "priem_gateway=info,priem_agent=info,priem_telegram=info".into()),
        )
        .init();

    let cli = Cli::parse();

    // explicit path > PRIEM_CONFIG env > ~/.priem/priem.toml
    let config_path = cli.config.or_else(|| std::env::var("PRIEM_CONFIG").ok());
    let config = PriemConfig::load(config_path.as_deref()).map_err(|e| {
        tracing::error!(code = e.code(), "config load failed: {e}");
        e
    })?;

    let backend = build_backend(&config.backend)?;
    let conversation = Arc::new(ConversationHandler::from_config(&config, backend));

    TelegramAdapter::new(&config.telegram, conversation)?.run().await?;

    info!("priem-gateway stopped");
    Ok(())
}

/// Build the one configured backend. Fails on a missing or unusable URL.
fn build_backend(config: &BackendConfig) -> Result<Box<dyn LlmBackend>, ConfigError> {
    let url = config.resolved_url().ok_or(ConfigError::Missing("backend.url"))?;
    let label = config.label();
    let timeout = config.timeout();

    let backend: Box<dyn LlmBackend> = match config.kind {
        BackendKind::Ollama => {
            info!("LLM backend: Ollama native ({url}), model {}", config.model);
            Box::new(OllamaBackend::new(&url, label, timeout)?)
        }
        BackendKind::OpenaiCompat => {
            info!(
                "LLM backend: OpenAI-compatible ({url}), model {}, auth {}",
                config.model,
                if config.api_key().is_some() { "bearer" } else { "none" }
            );
            Box::new(OpenAiCompatBackend::new(
                &url,
                config.api_key().map(str::to_string),
                label,
                timeout,
            )?)
        }
        BackendKind::GenericRest => {
            info!("LLM backend: generic REST ({url}), model {}", config.model);
            Box::new(GenericRestBackend::new(&url, label, timeout)?)
        }
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(kind: BackendKind, url: Option<&str>) -> BackendConfig {
        BackendConfig {
            kind,
            url: url.map(String::from),
            model: "qwen3:8b".to_string(),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn builds_each_kind() {
        let ollama = build_backend(&backend(BackendKind::Ollama, None)).unwrap();
        assert_eq!(ollama.name(), "ollama");
        assert_eq!(ollama.label(), "Ollama");

        let compat = build_backend(&backend(BackendKind::OpenaiCompat, None)).unwrap();
        assert_eq!(compat.name(), "openai_compat");

        let rest = build_backend(&backend(
            BackendKind::GenericRest,
            Some("http://10.0.0.5:1234/v1/chat/completions"),
        ))
        .unwrap();
        assert_eq!(rest.name(), "generic_rest");
        assert_eq!(rest.label(), "LM Studio");
    }

    #[test]
    fn generic_rest_without_url_is_missing() {
        assert!(matches!(
            build_backend(&backend(BackendKind::GenericRest, None)),
            Err(ConfigError::Missing("backend.url"))
        ));
    }

    #[test]
    fn bad_url_is_invalid() {
        assert!(matches!(
            build_backend(&backend(BackendKind::Ollama, Some("localhost 11434"))),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn custom_label_is_used() {
        let mut config = backend(BackendKind::OpenaiCompat, None);
        config.label = Some("Сервер КемГУ".to_string());
        assert_eq!(build_backend(&config).unwrap().label(), "Сервер КемГУ");
    }
}
