//! `datasynth chat`: Interactive or single-message discovery chat.

use std::io::Write;
use std::sync::Arc;

use datasynth_agent::{Session, SessionFactory, SessionMode};
use datasynth_config::AppConfig;
use datasynth_scraper::HttpFetcher;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use super::panel;

pub async fn run(message: Option<String>, guided: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    // Fail before any network call when no key is configured
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    DATASYNTH_API_KEY=...");
        eprintln!("    GEMINI_API_KEY=...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = datasynth_providers::build_from_config(&config)?;
    let fetcher = Arc::new(HttpFetcher::new(&config.scraper)?);
    let model = config.generation.model.clone();
    let factory = SessionFactory::new(provider, fetcher, config);
    let mode = if guided { SessionMode::Guided } else { SessionMode::Open };
    let mut session = factory.create_with_mode(mode);

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let outcome = session.submit(&msg).await?;
        eprint!("\r              \r");
        println!("{}", outcome.message);
        if outcome.knowledge_update.is_some_and(|d| !d.is_empty()) {
            println!();
            print!("{}", panel::render(session.knowledge(), &session.completeness()));
        }
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Datasynth — Business Discovery        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:     {model}");
    println!("  Commands:  /knowledge, /summary, /save, /exit");
    println!();
    println!("  Assistant > {}", session.greeting());
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {}
            "/exit" | "/quit" | "exit" | "quit" => break,
            "/knowledge" => {
                println!();
                print!("{}", panel::render(session.knowledge(), &session.completeness()));
                println!();
            }
            "/summary" => {
                println!();
                print!("{}", panel::render_summary(&session.summary()));
                println!();
            }
            "/save" => match session.save_knowledge().await {
                Ok(id) => println!("  Saved knowledge snapshot {id}\n"),
                Err(e) => eprintln!("  [Error] {e}\n"),
            },
            input => turn(&mut session, input).await,
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

async fn turn(session: &mut Session, input: &str) {
    eprint!("  ...");
    match session.submit(input).await {
        Ok(outcome) => {
            eprint!("\r     \r");
            println!();
            for line in outcome.message.lines() {
                println!("  Assistant > {line}");
            }
            if outcome.knowledge_update.is_some_and(|d| !d.is_empty()) {
                let c = session.completeness();
                println!("  (knowledge updated, {}/{} complete; /knowledge to view)", c.met, c.total);
            }
            println!();
        }
        Err(e) => {
            eprint!("\r     \r");
            eprintln!("  [Error] {e}");
            println!();
        }
    }
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}
