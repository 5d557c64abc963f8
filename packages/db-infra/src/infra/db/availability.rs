use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Statement};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::config::db::LogicalDatabaseName;
use crate::error::DbInfraError;
use crate::infra::db::diagnostics::bootstrap_counters;

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(1);

/// A trivial query that succeeds only when the database accepts work.
#[async_trait]
pub trait LivenessCheck: Send + Sync {
    async fn check(&self) -> Result<(), DbErr>;
}

#[async_trait]
impl LivenessCheck for DatabaseConnection {
    async fn check(&self) -> Result<(), DbErr> {
        let backend = self.get_database_backend();
        self.query_one(Statement::from_string(backend, "SELECT 1"))
            .await
            .map(|_| ())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Total budget; the probe never gives up before it has elapsed.
    pub timeout: Duration,
    /// Upper bound on a single liveness query.
    pub attempt_timeout: Duration,
    pub max_backoff: Duration,
}

impl ProbeSettings {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    fn backoff(&self, attempts: u32) -> Duration {
        let base_ms = (50u64 << attempts.saturating_sub(1).min(10))
            .min(self.max_backoff.as_millis() as u64);
        let jitter_ms = rand::rng().random::<u64>() % 25;
        Duration::from_millis(base_ms + jitter_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Available,
    TimedOut { last_error: String },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityCheckResult {
    pub database: LogicalDatabaseName,
    pub outcome: ProbeOutcome,
    pub elapsed: Duration,
    pub attempts: u32,
}

impl AvailabilityCheckResult {
    pub fn is_available(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Available)
    }

    pub fn into_result(self) -> Result<AvailabilityCheckResult, DbInfraError> {
        match &self.outcome {
            ProbeOutcome::Available => Ok(self),
            ProbeOutcome::TimedOut { last_error } => Err(DbInfraError::DatabaseUnavailable {
                elapsed: self.elapsed,
                last_error: last_error.clone(),
            }),
            ProbeOutcome::Cancelled => Err(DbInfraError::Cancelled {
                elapsed: self.elapsed,
            }),
        }
    }
}

/// Poll `target` until it answers, the budget runs out or `cancel` fires.
///
/// Each attempt is bounded by the remaining budget and the last sleep is
/// clamped to the deadline, so a final attempt always runs at the deadline.
pub async fn probe<L>(
    database: LogicalDatabaseName,
    target: &L,
    settings: &ProbeSettings,
    cancel: &CancellationToken,
) -> AvailabilityCheckResult
where
    L: LivenessCheck + ?Sized,
{
    let start = Instant::now();
    let deadline = start + settings.timeout;
    let mut attempts: u32 = 0;
    let mut last_error = String::from("no liveness attempt completed");

    let finish = |outcome: ProbeOutcome, attempts: u32| AvailabilityCheckResult {
        database,
        outcome,
        elapsed: start.elapsed(),
        attempts,
    };

    loop {
        attempts += 1;
        bootstrap_counters::probe_attempt();

        let budget = deadline
            .saturating_duration_since(Instant::now())
            .min(settings.attempt_timeout);

        let attempt = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(database = %database, attempts, "probe cancelled");
                return finish(ProbeOutcome::Cancelled, attempts);
            }
            result = tokio::time::timeout(budget, target.check()) => result,
        };

        match attempt {
            Ok(Ok(())) => {
                let result = finish(ProbeOutcome::Available, attempts);
                info!(
                    "probe=available database={} attempts={} elapsed_ms={}",
                    database,
                    attempts,
                    result.elapsed.as_millis()
                );
                return result;
            }
            Ok(Err(e)) => last_error = e.to_string(),
            Err(_) => {
                last_error = format!("liveness query exceeded {}ms", budget.as_millis());
            }
        }

        let now = Instant::now();
        if now >= deadline {
            bootstrap_counters::probe_timeout();
            warn!(
                "probe=timeout database={} attempts={} elapsed_ms={} last_error={}",
                database,
                attempts,
                start.elapsed().as_millis(),
                last_error
            );
            return finish(ProbeOutcome::TimedOut { last_error }, attempts);
        }

        let delay = settings.backoff(attempts).min(deadline - now);
        trace!(
            probe = "backoff",
            database = %database,
            attempts,
            delay_ms = delay.as_millis(),
            error = %last_error
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {
                info!(database = %database, attempts, "probe cancelled during backoff");
                return finish(ProbeOutcome::Cancelled, attempts);
            }
        }
    }
}
