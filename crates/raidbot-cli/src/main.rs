//! raidbot CLI - HTTP service, one-shot questions, onboarding and status.
//!
//! Usage:
//!   raidbot serve           - Run the chat service (default)
//!   raidbot ask "<message>" - Answer one message and exit
//!   raidbot rules           - List the rule table
//!   raidbot onboard         - Create a default configuration
//!   raidbot status          - Show configuration and validation results

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use raidbot_core::chat::{rules, ChatStrategy, Classifier, Fallback, LlmFallback};
use raidbot_core::config::Config;
use raidbot_core::cron::RefreshJob;
use raidbot_core::data::{ContextProvider, SharedData};
use raidbot_core::gateway::{self, AppState};
use raidbot_core::provider::openai::OpenAiProvider;
use raidbot_core::provider::LlmProvider;
use raidbot_core::session::ConversationStore;
use raidbot_core::sweeper::Sweeper;

#[derive(Parser)]
#[command(
    name = "raidbot",
    version,
    about = "RAID Shadow Legends community chat assistant"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP chat service
    Serve {
        /// Listen address host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer a single message and print the reply
    Ask {
        /// The message to classify
        message: String,

        /// Rule/fallback order (overrides config)
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Never call the LLM fallback
        #[arg(long)]
        offline: bool,
    },

    /// List rules in priority order with their keywords
    Rules,

    /// Create or reset the default configuration
    Onboard,

    /// Show configuration status and validation results
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    RulesFirst,
    FallbackFirst,
}

impl From<StrategyArg> for ChatStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::RulesFirst => ChatStrategy::RulesFirst,
            StrategyArg::FallbackFirst => ChatStrategy::FallbackFirst,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { host, port }) => cmd_serve(host, port).await?,
        Some(Commands::Ask {
            message,
            strategy,
            offline,
        }) => cmd_ask(&message, strategy, offline).await?,
        Some(Commands::Rules) => cmd_rules(),
        Some(Commands::Onboard) => cmd_onboard()?,
        Some(Commands::Status) => cmd_status()?,
        None => cmd_serve(None, None).await?,
    }

    Ok(())
}

// ── Shared Setup ────────────────────────────────────────────────────

fn load_config() -> Result<Config> {
    let mut config = Config::load()?;
    config.apply_env();

    if let Err(errors) = config.validate() {
        eprintln!("\n  \x1b[31m❌ Configuration errors:\x1b[0m");
        for e in &errors {
            eprintln!("     • {}", e);
        }
        eprintln!();
        anyhow::bail!("Fix the above {} error(s) in config.json", errors.len());
    }
    Ok(config)
}

/// Build the first configured provider, if any.
fn build_provider(config: &Config) -> Option<Arc<dyn LlmProvider>> {
    let (name, entry) = config.providers.find_active()?;
    let model = entry.model_or_default(name);
    let client = reqwest::Client::new();

    info!(provider = name, model = %model, "LLM fallback enabled");
    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::new(
        name,
        &entry.api_key,
        entry.api_base.as_deref(),
        &model,
        client,
    ));
    Some(provider)
}

/// Curated data, filled once before first use.
async fn load_data(config: &Config) -> SharedData {
    let data = SharedData::curated(config.cache_ttl());
    if let Err(e) = data.refresh(Utc::now()).await {
        warn!(error = %e, "Initial data load failed, starting with an empty cache");
    }
    data
}

// ── Serve Command ───────────────────────────────────────────────────

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let provider = build_provider(&config);
    if provider.is_none() {
        info!("No LLM provider configured, answering from rules only");
    }

    let data = load_data(&config).await;
    let conversations = Arc::new(RwLock::new(ConversationStore::new(
        config.conversation_limits(),
    )));

    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    // 1. Scheduled data refresh.
    let refresh = RefreshJob::new(
        &config.data.refresh_schedule,
        Duration::from_secs(config.data.startup_delay_secs),
        data.clone(),
    )?;
    tasks.push(tokio::spawn(refresh.run(cancel.clone())));

    // 2. Conversation sweeper.
    let sweeper = Sweeper::builder()
        .interval(Duration::from_secs(config.conversations.sweep_interval_secs))
        .store(Arc::clone(&conversations))
        .build();
    tasks.push(tokio::spawn(sweeper.run(cancel.clone())));

    // 3. HTTP gateway.
    let state = Arc::new(AppState::new(&config, data, conversations, provider));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(embed = %format!("{}/embed.js", state.public_url), "Embed script available");

    // Ctrl+C cancels every task, the gateway included.
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
            shutdown.cancel();
        }
    });

    let result = gateway::serve(state, &addr, cancel.clone()).await;
    cancel.cancel();

    for task in tasks {
        let _ = task.await;
    }
    result
}

// ── Ask Command ─────────────────────────────────────────────────────

async fn cmd_ask(message: &str, strategy: Option<StrategyArg>, offline: bool) -> Result<()> {
    let config = Config::load()?;
    let strategy = strategy.map(ChatStrategy::from).unwrap_or(config.chat.strategy);

    let data = load_data(&config).await;
    let snapshot = data.snapshot().await;

    let provider = if offline { None } else { build_provider(&config) };
    let fallback = match provider {
        Some(p) => Some(LlmFallback::new(
            p,
            config.fallback_options(),
            &snapshot,
            &data.relevant_champions(message).await,
        )),
        None => None,
    };

    let reply = Classifier::new(strategy)
        .respond(
            message,
            &snapshot,
            fallback.as_ref().map(|f| f as &dyn Fallback),
            Utc::now(),
        )
        .await;

    debug!(source = reply.source.as_str(), "Answered");
    println!("{}", reply.text);
    Ok(())
}

// ── Rules Command ───────────────────────────────────────────────────

fn cmd_rules() {
    println!();
    println!("  Rules (first match wins)");
    println!("  ─────────────────────────────────────");
    for (i, rule) in rules::rules().iter().enumerate() {
        println!(
            "  {:>2}. {:<14} {}",
            i + 1,
            rule.id.as_str(),
            rule.keywords.join(", ")
        );
    }
    println!();
}

// ── Onboard Command ─────────────────────────────────────────────────

fn cmd_onboard() -> Result<()> {
    let path = Config::write_default_template()?;
    println!();
    println!("  ✅ Configuration created at:");
    println!("     {}", path.display());
    println!();
    println!("  Next steps:");
    println!("  1. Optionally add an LLM API key for answers outside the rule table");
    println!("  2. Run `raidbot serve` and embed /embed.js on your site");
    println!();
    Ok(())
}

// ── Status Command ──────────────────────────────────────────────────

fn cmd_status() -> Result<()> {
    let config_path = Config::default_path();
    let mut config = Config::load()?;
    config.apply_env();

    println!();
    println!("  raidbot status");
    println!("  ─────────────────────────────────────");

    if config_path.exists() {
        println!("  Config:    {}", config_path.display());
    } else {
        println!("  Config:    ⚠️  Not found, using defaults (run `raidbot onboard`)");
    }

    match config.providers.find_active() {
        Some((name, entry)) => println!(
            "  Provider:  ✅ {} ({})",
            name,
            entry.model_or_default(name)
        ),
        None => println!("  Provider:  rules only (no LLM key)"),
    }

    let strategy = match config.chat.strategy {
        ChatStrategy::RulesFirst => "rules first",
        ChatStrategy::FallbackFirst => "fallback first",
    };
    println!("  Strategy:  {}", strategy);
    println!("  Listen:    {}:{}", config.server.host, config.server.port);
    println!("  Widget:    {}/embed.js", config.server.public_url());
    println!(
        "  Refresh:   {} (cache TTL {}s)",
        config.data.refresh_schedule, config.data.cache_ttl_secs
    );
    println!(
        "  Update key: {}",
        if config.data.update_key.is_some() { "set" } else { "not set" }
    );

    match config.validate() {
        Ok(()) => println!("  Validation: ✅ ok"),
        Err(errors) => {
            println!("  Validation: ❌ {} problem(s)", errors.len());
            for e in errors {
                println!("     • {}", e);
            }
        }
    }

    println!();
    Ok(())
}
