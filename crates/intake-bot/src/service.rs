//! The Telegram long-poll loop as a supervised service.

use crate::error::Result;
use crate::handler::Handler;
use crate::telegram::TelegramClient;
use async_trait::async_trait;
use intake_supervisor::Service;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// How long `stop` waits for in-flight documents before aborting them
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 90;

/// Polls Telegram and hands each update to the [`Handler`] in its own task.
///
/// The update offset survives restarts, so a crash never replays updates
/// that were already dispatched.
pub struct PollingService {
    telegram: TelegramClient,
    handler: Arc<Handler>,
    offset: AtomicI64,
    tasks: Mutex<JoinSet<()>>,
    drain_timeout: Duration,
}

impl PollingService {
    /// Create a new polling service
    pub fn new(telegram: TelegramClient, handler: Arc<Handler>) -> Self {
        Self {
            telegram,
            handler,
            offset: AtomicI64::new(0),
            tasks: Mutex::new(JoinSet::new()),
            drain_timeout: Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS),
        }
    }

    /// Set how long `stop` waits for in-flight documents
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    /// Next update id to request
    pub fn offset(&self) -> i64 {
        self.offset.load(Ordering::SeqCst)
    }

    /// Fetch one batch of updates and dispatch each to its own task.
    ///
    /// Returns the number of updates dispatched.
    pub async fn poll_once(&self) -> Result<usize> {
        let updates = self.telegram.get_updates(self.offset()).await?;
        let count = updates.len();

        let mut tasks = self.tasks.lock().await;
        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                warn!(error = %e, "Update task ended abnormally");
            }
        }

        for update in updates {
            self.offset.fetch_max(update.update_id + 1, Ordering::SeqCst);
            let handler = Arc::clone(&self.handler);
            tasks.spawn(async move { handler.handle_update(update).await });
        }
        Ok(count)
    }

    /// Number of update tasks not yet reaped
    pub async fn in_flight(&self) -> usize {
        self.tasks.lock().await.len()
    }
}

#[async_trait]
impl Service for PollingService {
    fn name(&self) -> &str {
        "telegram-poller"
    }

    async fn start(&self) -> anyhow::Result<()> {
        info!(offset = self.offset(), "Polling for updates");
        loop {
            self.poll_once().await?;
        }
    }

    async fn stop(&self) {
        let mut tasks = self.tasks.lock().await;
        if tasks.is_empty() {
            return;
        }

        info!(in_flight = tasks.len(), "Waiting for in-flight documents");
        let drained = tokio::time::timeout(self.drain_timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!(remaining = tasks.len(), "Drain timed out, aborting remaining tasks");
            tasks.shutdown().await;
        }
    }

    async fn health_check(&self) -> anyhow::Result<()> {
        let me = self.telegram.get_me().await?;
        debug!(bot_id = me.id, "Telegram reachable");
        Ok(())
    }
}
