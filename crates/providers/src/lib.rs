//! Text generation provider implementations for Datasynth.

pub mod gemini;

use std::sync::Arc;

use datasynth_config::{AppConfig, ConfigError};
use datasynth_core::provider::Provider;

pub use gemini::GeminiProvider;

/// Build the configured provider.
///
/// Fails fast when no API key is available; there is no built-in key.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let api_key = config.require_api_key()?;
    let provider = GeminiProvider::new(
        &config.generation.api_url,
        &config.generation.model,
        api_key,
    )
    .map_err(|e| ConfigError::ValidationError(format!("cannot build HTTP client: {e}")))?;
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            build_from_config(&config),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn build_with_api_key() {
        let config = AppConfig {
            api_key: Some("test-key".into()),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "gemini");
    }
}
