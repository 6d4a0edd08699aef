//! Wiring for the two commands.

use crate::cli::ProcessArgs;
use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::handler::Handler;
use crate::service::PollingService;
use crate::staging::{Archive, Staging};
use crate::telegram::TelegramClient;
use intake_domain::ProcessingResult;
use intake_extractor::{report, Extractor};
use intake_supervisor::Supervisor;
use std::sync::Arc;
use tracing::info;

/// Build the pipeline for `config`.
pub fn build_extractor(config: &BotConfig) -> Result<Extractor> {
    let backend = config.build_backend()?;
    let extractor = Extractor::new(backend, config.extractor.clone())?;
    info!(
        backend = %config.backend,
        model = %config.model,
        "Extractor ready"
    );
    Ok(extractor)
}

/// Run the bot under the supervisor until Ctrl+C or the restart budget runs out.
pub async fn run_bot(config: BotConfig) -> Result<()> {
    let telegram = TelegramClient::new(config.telegram_token()?)?;
    let me = telegram.get_me().await?;
    info!(
        bot_id = me.id,
        username = me.username.as_deref().unwrap_or("unknown"),
        "Connected to Telegram"
    );

    let staging = Staging::new(&config.uploads_dir)?;
    let mut handler = Handler::new(telegram.clone(), build_extractor(&config)?, staging);
    if let Some(dir) = &config.archive_dir {
        handler = handler.with_archive(Archive::new(dir)?);
        info!(dir = %dir.display(), "Archiving JSON replies");
    }

    let service = PollingService::new(telegram, Arc::new(handler));
    let mut supervisor = Supervisor::new(config.supervisor.clone())?;
    info!(uploads = %config.uploads_dir.display(), "Telegram bot started");

    let outcome = supervisor.run_until_ctrl_c(&service).await;
    info!("Bot stopped. Final metrics:\n{}", supervisor.metrics().summary());
    outcome.map_err(BotError::from)
}

/// Process one local file; writes the spreadsheet when asked and the parse succeeded.
pub async fn process_file(config: &BotConfig, args: &ProcessArgs) -> Result<ProcessingResult> {
    let extractor = build_extractor(config)?;
    let result = extractor
        .process_document(&args.file, args.remote_ref.as_deref())
        .await;

    if let (Some(out), ProcessingResult::Success(document)) = (&args.xlsx, &result) {
        let bytes = report::to_workbook(document)?;
        tokio::fs::write(out, bytes).await?;
        info!(file = %out.display(), "Wrote spreadsheet");
    }
    Ok(result)
}
