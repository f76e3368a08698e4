//! `datasynth config`: Configuration management commands.

use datasynth_config::AppConfig;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }

    println!("# {}", AppConfig::config_path().display());
    println!("{}", toml::to_string_pretty(&config)?);
    if !config.has_api_key() {
        println!("# No API key set (DATASYNTH_API_KEY or GEMINI_API_KEY)");
    }
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();

    if config_path.exists() {
        println!("  Config file exists: {}", config_path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("Created {}", config_path.display());
    println!("   Add `api_key = \"...\"` or set DATASYNTH_API_KEY before chatting.");
    Ok(())
}
