//! The lifecycle contract a supervised service implements

use async_trait::async_trait;

/// A long-running service the [`Supervisor`](crate::Supervisor) can restart
///
/// Implementations keep their own state behind `&self`; the supervisor may
/// call [`health_check`](Service::health_check) while [`start`](Service::start)
/// is still running.
#[async_trait]
pub trait Service: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Run the service until it exits (`Ok`) or fails (`Err`)
    async fn start(&self) -> anyhow::Result<()>;

    /// Release whatever a running instance holds
    ///
    /// Called after a failed health check and on shutdown. The future
    /// returned by `start` is dropped right after.
    async fn stop(&self);

    /// Probe whether the running service is still able to do its job
    async fn health_check(&self) -> anyhow::Result<()>;
}
