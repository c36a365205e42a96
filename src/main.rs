//! ARENA — Side-by-side LLM Prompt Comparison Tool
//!
//! Entry point. Loads configuration, initialises structured logging,
//! verifies the API key, and runs either a one-shot comparison (prompt
//! given as the first argument) or the interactive prompt loop.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::{error, info, warn};

use arena::compare;
use arena::config::AppConfig;
use arena::display;
use arena::openai::{ChatApi, OpenAiClient};
use arena::session::Session;
use arena::types::{CompareError, ComparisonRequest, ModelSpec};

const BANNER: &str = r#"
    _    ____  _____ _   _    _
   / \  |  _ \| ____| \ | |  / \
  / _ \ | |_) |  _| |  \| | / _ \
 / ___ \|  _ <| |___| |\  |/ ___ \
/_/   \_\_| \_\_____|_| \_/_/   \_\

  Side-by-side LLM Prompt Comparison
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML (defaults when the file is absent)
    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");

    let lineup = cfg.lineup()?;
    info!(
        models = ?lineup.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
        moderation = cfg.moderation.enabled,
        "Comparison lineup"
    );

    let api_key = AppConfig::resolve_env(&cfg.api.api_key_env)
        .with_context(|| format!("API key expected in ${}", cfg.api.api_key_env))?;

    let client = OpenAiClient::new(
        SecretString::new(api_key),
        cfg.api.base_url.clone(),
        Duration::from_secs(cfg.api.timeout_secs),
        cfg.api.max_retries,
    )?;

    verify_key(&client, &lineup).await;

    match std::env::args().nth(1) {
        Some(prompt) => one_shot(&client, &cfg, lineup, &prompt).await,
        None => interactive(&client, &cfg, lineup).await,
    }
}

/// Check the key against the model listing endpoint. Failure to verify is
/// a warning, not a stop: the provider may still accept completions.
async fn verify_key(client: &OpenAiClient, lineup: &[ModelSpec]) {
    match client.list_models().await {
        Ok(served) => {
            info!(count = served.len(), "API key verified");
            for model in lineup {
                if !served.iter().any(|id| id == &model.id) {
                    warn!(
                        model = %model.id,
                        "Model not listed for this API key - calls to it may fail"
                    );
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "Could not verify API key - continuing anyway");
        }
    }
}

/// Single prompt from the command line: moderate, fan out, render, exit.
async fn one_shot(
    client: &OpenAiClient,
    cfg: &AppConfig,
    lineup: Vec<ModelSpec>,
    prompt: &str,
) -> Result<()> {
    let request = ComparisonRequest::new(prompt, lineup);
    match compare::moderated_compare(client, &request, &cfg.generation, cfg.moderation.enabled)
        .await
    {
        Ok(results) => {
            print!("{}", display::render_results(&results));
            Ok(())
        }
        Err(CompareError::ModerationRejected { categories }) => {
            println!("{}", rejection_notice(&categories));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Interactive loop: each line fans out across the lineup; the first
/// prompt seeds the conversation, follow-ups continue it per model.
async fn interactive(client: &OpenAiClient, cfg: &AppConfig, lineup: Vec<ModelSpec>) -> Result<()> {
    let mut session = Session::new(lineup, cfg.generation.clone());

    println!("Type a prompt to fan it out across the lineup.");
    println!("Commands: :totals  :reset  :quit");

    let stdin = io::stdin();
    loop {
        print!("arena> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            ":quit" | ":q" => break,
            ":reset" => {
                session.reset();
                println!("Session reset - the next prompt starts a fresh conversation.");
            }
            ":totals" => {
                print!("{}", display::render_totals(&session));
            }
            prompt => {
                if cfg.moderation.enabled && !moderation_passed(client, prompt).await {
                    continue;
                }
                let results = session.submit(client, prompt).await;
                print!("{}", display::render_results(&results));
                print!("{}", display::render_totals(&session));
            }
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// Run the moderation gate for one interactive prompt. Returns false when
/// the prompt must not be sent (flagged, or the gate itself failed).
async fn moderation_passed(client: &OpenAiClient, prompt: &str) -> bool {
    match client.moderate(prompt).await {
        Ok(verdict) if verdict.flagged => {
            println!("{}", rejection_notice(&verdict.categories));
            false
        }
        Ok(_) => true,
        Err(e) => {
            error!(error = %e, "Moderation check failed");
            println!("Moderation check failed - prompt not sent.");
            false
        }
    }
}

fn rejection_notice(categories: &[String]) -> String {
    if categories.is_empty() {
        "Prompt rejected by moderation.".to_string()
    } else {
        format!("Prompt rejected by moderation ({}).", categories.join(", "))
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("arena=info"));

    let json_logging = std::env::var("ARENA_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
