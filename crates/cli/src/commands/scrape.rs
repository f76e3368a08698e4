//! `datasynth scrape`: Fetch one page with the configured scraper.

use datasynth_config::AppConfig;
use datasynth_core::fetch::PageFetcher;
use datasynth_scraper::HttpFetcher;

pub async fn run(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let fetcher = HttpFetcher::new(&config.scraper)?;

    let page = fetcher.fetch(url).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
