use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kirana_copilot::commands;
use kirana_copilot::commands::invoices::AnalyzeOptions;
use kirana_copilot::models::Settings;
use kirana_copilot::services::provider::{self, resolve_kind};
use kirana_copilot::services::state::AppState;

#[derive(Parser)]
#[command(name = "kirana")]
#[command(version, about = "Draft GSTR-1 summaries from photographed invoices", long_about = None)]
struct Cli {
    /// AI provider: local, gemini, groq, together or huggingface
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model override for the selected provider
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract invoices from images/PDFs and draft a GSTR-1 summary
    Analyze {
        /// Invoice images or PDFs, processed in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory for the CSV draft
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Also write the analysis as JSON
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Give up on the whole batch after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// Draft a GSTR-1 summary from a saved analysis
    Gstr1 {
        /// JSON file written by `analyze --save`
        analysis: PathBuf,

        /// Directory for the CSV draft
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Check that the configured backend is reachable
    Health,

    /// List known providers and their credentials
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(value) = cli.provider.as_deref() {
        settings.provider = resolve_kind(Some(value));
    }
    if let Some(model) = cli.model {
        settings.model = Some(model);
    }

    if let Commands::Providers = cli.command {
        commands::settings::providers(&settings);
        return Ok(());
    }

    let extractor = provider::install(&settings)?;
    let state = AppState::new(extractor);

    match cli.command {
        Commands::Analyze {
            files,
            out,
            save,
            timeout_secs,
        } => {
            let options = AnalyzeOptions {
                files,
                out_dir: out,
                save,
                timeout_secs,
            };
            commands::invoices::analyze(&state, options).await
        }
        Commands::Gstr1 { analysis, out } => commands::gstr1::gstr1(&state, &analysis, &out).await,
        Commands::Health => commands::settings::health(&state.extractor).await,
        Commands::Providers => Ok(()),
    }
}

fn load_settings() -> Settings {
    commands::settings::settings_from(|key| std::env::var(key).ok())
}
