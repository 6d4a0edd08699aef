//! Invoice bot - Telegram front end for the invoice intake pipeline.

use clap::Parser;
use intake_bot::{app, BotConfig, BotError, Cli, Command, FileSettings};
use tracing_subscriber::EnvFilter;

/// Log filter when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "info,intake=debug";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> intake_bot::Result<()> {
    // A missing .env is fine; the environment may already be set
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let settings = match &cli.config {
        Some(path) => FileSettings::load(path)?,
        None => FileSettings::default(),
    };
    let config = BotConfig::from_env(settings)?;
    tracing::debug!(?config, "Configuration loaded");

    match cli.command {
        None | Some(Command::Run) => app::run_bot(config).await,
        Some(Command::Process(args)) => {
            let result = app::process_file(&config, &args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            match result.error() {
                Some(message) => Err(BotError::Processing(message.to_string())),
                None => Ok(()),
            }
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
