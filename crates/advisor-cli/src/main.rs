use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use advisor_core::llm::ProviderId;

mod app;
mod commands;
mod render;

use app::StoreLocation;

#[derive(Parser)]
#[command(name = "advisor")]
#[command(about = "Advisor - a grounded conversational advisor in your terminal")]
#[command(version)]
struct Cli {
    /// Ask a single question and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// LLM model to use
    #[arg(short, long)]
    model: Option<String>,

    /// LLM provider (openai, claude, ollama, groq, openrouter, lmstudio)
    #[arg(long)]
    provider: Option<String>,

    /// Directory for history and tokens (default: platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep everything in memory for this session
    #[arg(long, conflicts_with = "data_dir")]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = advisor_core::Settings::load();

    if let Some(ref provider) = cli.provider {
        match ProviderId::parse(provider) {
            Some(id) => {
                if id != settings.llm.provider {
                    // The configured model belongs to the old provider
                    settings.llm.model.clear();
                    settings.llm.api_key_env.clear();
                    settings.llm.base_url = None;
                }
                settings.llm.provider = id;
            }
            None => bail!("Unknown provider: {provider}"),
        }
    }
    if let Some(ref model) = cli.model {
        settings.llm.model = model.clone();
    }

    let location = if cli.ephemeral {
        StoreLocation::Ephemeral
    } else if let Some(dir) = cli.data_dir {
        StoreLocation::Dir(dir)
    } else {
        StoreLocation::Default
    };
    let store = app::open_store(location)?;

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&settings, store, &prompt).await?;
    } else {
        app::run_repl(&settings, store).await?;
    }

    Ok(())
}
