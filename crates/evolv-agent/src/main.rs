//! Evolv - a conversational agent that writes its own commands
//!
//! Chat in a REPL or ask one-off questions; missing commands are generated
//! as shell functions and kept for next time.

mod adapters;
mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Input;

use evolv::{AgentPorts, CapabilityRepository, CapabilityRuntime, HistoryStore, Orchestrator};

use adapters::{build_oracle, FileHistory, FsCapabilityStore, JsonCredentialRegistry, ShellRuntime};
use config::Config;

#[derive(Parser)]
#[command(name = "evolv")]
#[command(about = "Evolv - a conversational agent that grows its own commands", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,

    /// Process a single turn and print the reply
    Ask {
        /// What to say
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// List known commands
    Capabilities,

    /// Show the conversation log
    History {
        /// Number of most recent entries
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let (mut config, config_path) = Config::load_or_init(cli.config.as_deref())?;
    config.apply_env()?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => cmd_chat(&config).await,
        Commands::Ask { text } => cmd_ask(&config, &text.join(" ")).await,
        Commands::Capabilities => cmd_capabilities(&config).await,
        Commands::History { limit } => cmd_history(&config, limit).await,
        Commands::Config => cmd_config(&config, &config_path),
    }
}

// ============================================
// Wiring
// ============================================

fn capability_ports(
    config: &Config,
) -> Result<(Arc<FsCapabilityStore>, Arc<dyn CapabilityRuntime>)> {
    let runtime: Arc<dyn CapabilityRuntime> =
        Arc::new(ShellRuntime::new(config.runtime.interpreter.clone()));
    let store = Arc::new(FsCapabilityStore::new(
        config.storage.capabilities_dir()?,
        runtime.extension(),
    ));
    Ok((store, runtime))
}

async fn build_agent(config: &Config) -> Result<Orchestrator> {
    let (store, runtime) = capability_ports(config)?;
    store
        .ensure_root()
        .await
        .with_context(|| format!("Failed to prepare {:?}", store.root()))?;

    let ports = AgentPorts {
        oracle: build_oracle(&config.oracle)?,
        store,
        runtime,
        history: Arc::new(FileHistory::new(config.storage.history_file()?)),
        credentials: Arc::new(JsonCredentialRegistry::new(
            config.storage.credentials_file()?,
        )),
    };

    let agent = Orchestrator::new(ports, config.agent_settings());
    let report = agent
        .load()
        .await
        .context("Failed to load capabilities")?;
    for skipped in &report.skipped {
        tracing::warn!("Skipped unit: {}", skipped);
    }
    Ok(agent)
}

// ============================================
// Command Implementations
// ============================================

async fn cmd_chat(config: &Config) -> Result<()> {
    let agent = build_agent(config).await?;
    let name = agent.persona().name.clone();

    println!(
        "{} {}",
        format!("{} is listening.", name).green().bold(),
        "Type 'exit' or 'quit' to leave.".dimmed()
    );

    loop {
        let line: String = Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read input")?;

        if matches!(line.trim().to_lowercase().as_str(), "exit" | "quit") {
            println!("{}", "Goodbye.".dimmed());
            break;
        }

        let reply = agent.evolve(&line).await;
        println!("{} {}", format!("{}:", name).cyan().bold(), reply);
    }

    Ok(())
}

async fn cmd_ask(config: &Config, text: &str) -> Result<()> {
    let agent = build_agent(config).await?;

    // Only the reply goes to stdout
    println!("{}", agent.evolve(text).await);

    Ok(())
}

async fn cmd_capabilities(config: &Config) -> Result<()> {
    let (store, runtime) = capability_ports(config)?;
    let root = store.root().to_path_buf();
    let repository = CapabilityRepository::new(store, runtime);
    let report = repository
        .load()
        .await
        .context("Failed to load capabilities")?;

    let ids = repository.list().await;
    if ids.is_empty() {
        println!("No commands yet in {:?}.", root);
        println!("\n{}", "They are created on demand, e.g.:".dimmed());
        println!("  evolv ask what time is it");
        return Ok(());
    }

    println!("{} ({}):", "Commands".bold(), ids.len().to_string().green());
    let mut current_category = None;
    for id in &ids {
        if current_category != Some(id.category()) {
            println!("  {}", id.category().cyan());
            current_category = Some(id.category());
        }
        println!("    {}", id.name());
    }

    if !report.skipped.is_empty() {
        println!("\n{} {}", "Unloadable:".yellow(), report.skipped.len());
        for skipped in &report.skipped {
            println!("  {}", skipped.dimmed());
        }
    }

    Ok(())
}

async fn cmd_history(config: &Config, limit: usize) -> Result<()> {
    let history = HistoryStore::new(Arc::new(FileHistory::new(config.storage.history_file()?)));
    let records = history.records().await.context("Failed to read history")?;

    if records.is_empty() {
        println!("No history yet.");
        return Ok(());
    }

    let start = records.len().saturating_sub(limit);
    for record in &records[start..] {
        println!(
            "{} {}",
            record
                .timestamp()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed(),
            truncate_string(&record.describe(), 120)
        );
    }

    Ok(())
}

/// Truncate string safely for UTF-8 (by char count, not bytes)
fn truncate_string(s: &str, max_chars: usize) -> String {
    let chars: Vec<char> = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        format!("{}...", chars.into_iter().collect::<String>())
    } else {
        s.to_string()
    }
}

fn cmd_config(config: &Config, path: &std::path::Path) -> Result<()> {
    let oracle = &config.oracle;

    println!("{}", "Configuration:".bold());
    println!("  Path: {:?}", path);
    println!("  Persona: {}", config.persona.name.cyan());
    println!("    Behavior: {}", config.persona.behavior);
    println!("    Personality: {}", config.persona.personality);
    println!("  Provider: {}", oracle.provider.to_string().cyan());
    println!(
        "  Model: {}",
        oracle
            .model
            .as_deref()
            .unwrap_or_else(|| oracle.provider.default_model())
    );
    println!(
        "  Base URL: {}",
        oracle
            .base_url
            .as_deref()
            .unwrap_or_else(|| oracle.provider.default_base_url())
    );
    println!(
        "  API Key: {}",
        if oracle.api_key.is_some() {
            "Set".green()
        } else {
            "Not set".red()
        }
    );
    println!("  Interpreter: {}", config.runtime.interpreter);
    println!(
        "  Command timeout: {}",
        match config.runtime.timeout_secs {
            0 => "none".to_string(),
            secs => format!("{}s", secs),
        }
    );
    println!("  Commands: {:?}", config.storage.capabilities_dir()?);
    println!("  History: {:?}", config.storage.history_file()?);
    println!("  Credentials: {:?}", config.storage.credentials_file()?);
    println!(
        "  Similarity threshold: {:.2}",
        config.agent.similarity_threshold
    );

    Ok(())
}
