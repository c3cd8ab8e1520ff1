//! llm-council - ask every council model the same question
//!
//! Runs one council round and prints each model's answer as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llm_council::config::parse_model_list;
use llm_council::{create_client, Config, Council, Message, TracingObserver};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Question to put to the council
    prompt: Option<String>,

    /// Optional system message sent before the question
    #[arg(short, long)]
    system: Option<String>,

    /// Comma separated council models (overrides config)
    #[arg(short, long)]
    models: Option<String>,

    /// Per-model timeout in seconds (overrides config)
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long, default_value_t = false)]
    show_config: bool,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let mut config = Config::load(args.config.as_deref()).context("loading config")?;
    config.apply_env().context("reading environment overrides")?;
    if let Some(models) = &args.models {
        config.council_models = parse_model_list(models);
    }
    if let Some(secs) = args.timeout {
        config.timeouts.default_secs = secs;
    }

    if args.show_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    config.validate().context("invalid configuration")?;

    let prompt = args
        .prompt
        .ok_or_else(|| anyhow::anyhow!("No prompt given. Usage: llm-council \"your question\""))?;

    let mut conversation = Vec::new();
    if let Some(system) = args.system {
        conversation.push(Message::system(system));
    }
    conversation.push(Message::user(prompt));

    let client = create_client(&config, Arc::new(TracingObserver))?;
    let council = Council::new(client);

    info!(
        router = ?config.router,
        chairman = %config.chairman_model,
        "Convening council"
    );
    let outcome = council.dispatch(&config.council_models, &conversation).await;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
