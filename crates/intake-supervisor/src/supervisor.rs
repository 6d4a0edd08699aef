//! Restart loop with exponential backoff

use crate::{Service, SupervisorConfig, SupervisorError, SupervisorMetrics};
use std::future::Future;
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};

/// How one run of the service ended
enum Outcome {
    Exited,
    Crashed(String),
    Unhealthy(String),
    Shutdown,
}

/// Supervisor that keeps one [`Service`] running
///
/// Owns the restart counter and metrics for a single service. On a crash or a
/// failed health check the service is stopped, the supervisor sleeps for the
/// configured backoff, and the service is started again. A run that stays up
/// for `healthy_reset_ms` forgives earlier failures.
///
/// # Examples
///
/// ```no_run
/// use intake_supervisor::{Service, Supervisor, SupervisorConfig};
///
/// # async fn example(service: impl Service) -> Result<(), Box<dyn std::error::Error>> {
/// let mut supervisor = Supervisor::new(SupervisorConfig::default())?;
///
/// // Runs until Ctrl+C, a clean exit, or the restart budget is spent
/// supervisor.run_until_ctrl_c(&service).await?;
/// println!("{}", supervisor.metrics().summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Supervisor {
    config: SupervisorConfig,
    metrics: SupervisorMetrics,
    attempts: u32,
}

impl Supervisor {
    /// Create a new Supervisor with the given configuration
    pub fn new(config: SupervisorConfig) -> Result<Self, SupervisorError> {
        config.validate().map_err(SupervisorError::Config)?;
        Ok(Self {
            config,
            metrics: SupervisorMetrics::new(),
            attempts: 0,
        })
    }

    /// Create a Supervisor with default configuration
    pub fn default_config() -> Self {
        Self {
            config: SupervisorConfig::default(),
            metrics: SupervisorMetrics::new(),
            attempts: 0,
        }
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &SupervisorMetrics {
        &self.metrics
    }

    /// Consecutive failures since the last healthy run
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Supervise `service` until Ctrl+C
    pub async fn run_until_ctrl_c<S>(&mut self, service: &S) -> Result<(), SupervisorError>
    where
        S: Service + ?Sized,
    {
        self.run(service, async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler available; only exit or give-up ends supervision
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Supervise `service` until `shutdown` resolves
    ///
    /// Returns `Ok(())` when the service exits cleanly or shutdown is
    /// requested, and [`SupervisorError::GaveUp`] once `max_restarts`
    /// consecutive failures have been observed.
    pub async fn run<S, F>(&mut self, service: &S, shutdown: F) -> Result<(), SupervisorError>
    where
        S: Service + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let name = service.name().to_string();

        loop {
            self.metrics.record_start();
            tracing::info!(service = %name, attempt = self.attempts, "Starting service");

            let started = Instant::now();
            let outcome = self.run_once(service, &mut shutdown).await;
            let uptime = started.elapsed();
            self.metrics.record_uptime(uptime);

            let error = match outcome {
                Outcome::Exited => {
                    tracing::info!(service = %name, "Service exited cleanly");
                    return Ok(());
                }
                Outcome::Shutdown => {
                    tracing::info!(service = %name, "Shutdown requested, stopping service");
                    service.stop().await;
                    tracing::info!("Supervisor stopped. Final metrics:\n{}", self.metrics.summary());
                    return Ok(());
                }
                Outcome::Crashed(error) => {
                    tracing::error!(service = %name, error = %error, "Service crashed");
                    self.metrics.record_crash(error.clone());
                    error
                }
                Outcome::Unhealthy(error) => {
                    tracing::error!(service = %name, error = %error, "Health check failed");
                    self.metrics.record_health_failure(error.clone());
                    service.stop().await;
                    error
                }
            };

            if self.attempts > 0 && uptime >= self.config.healthy_reset() {
                tracing::info!(
                    service = %name,
                    uptime_secs = uptime.as_secs(),
                    "Service was healthy long enough, resetting failure count"
                );
                self.attempts = 0;
                self.metrics.record_reset();
            }

            self.attempts += 1;
            if self.attempts >= self.config.max_restarts {
                tracing::error!(
                    service = %name,
                    attempts = self.attempts,
                    "Restart budget exhausted, manual intervention required"
                );
                return Err(SupervisorError::GaveUp {
                    service: name,
                    attempts: self.attempts,
                    last_error: error,
                });
            }

            let delay = self.config.backoff_for(self.attempts);
            tracing::warn!(
                service = %name,
                attempt = self.attempts,
                max_restarts = self.config.max_restarts,
                delay_ms = delay.as_millis() as u64,
                "Restarting service after backoff"
            );

            tokio::select! {
                _ = sleep(delay) => {}
                _ = &mut shutdown => {
                    tracing::info!(service = %name, "Shutdown requested during backoff");
                    return Ok(());
                }
            }
        }
    }

    /// Drive one start of the service, checking health on an interval
    async fn run_once<S, F>(&self, service: &S, shutdown: &mut std::pin::Pin<&mut F>) -> Outcome
    where
        S: Service + ?Sized,
        F: Future<Output = ()>,
    {
        let period = self.config.health_check_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let run = service.start();
        tokio::pin!(run);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.as_mut() => return Outcome::Shutdown,
                result = &mut run => {
                    return match result {
                        Ok(()) => Outcome::Exited,
                        Err(e) => Outcome::Crashed(format!("{:#}", e)),
                    };
                }
                _ = ticker.tick() => {
                    match timeout(period, service.health_check()).await {
                        Ok(Ok(())) => tracing::debug!(service = service.name(), "Health check passed"),
                        Ok(Err(e)) => return Outcome::Unhealthy(format!("{:#}", e)),
                        Err(_) => {
                            return Outcome::Unhealthy(format!(
                                "health check timed out after {}ms",
                                period.as_millis()
                            ))
                        }
                    }
                }
            }
        }
    }
}
