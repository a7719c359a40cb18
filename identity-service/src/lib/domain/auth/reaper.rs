use std::sync::Arc;
use std::time::Duration;

use auth::Clock;
use tokio::time::MissedTickBehavior;

use crate::domain::auth::errors::AuthError;
use crate::domain::session::models::ReapMode;
use crate::domain::session::ports::SessionRepository;

/// Periodic sweep of expired sessions.
///
/// Expired sessions already fail validation on their own; the sweep only
/// keeps the store from growing without bound.
pub struct SessionReaper<SR>
where
    SR: SessionRepository,
{
    sessions: Arc<SR>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    mode: ReapMode,
    deadline: Duration,
}

impl<SR> SessionReaper<SR>
where
    SR: SessionRepository,
{
    /// Create a new reaper.
    ///
    /// # Arguments
    /// * `sessions` - Session store to sweep
    /// * `clock` - Time source used as the expiry reference
    /// * `interval` - Delay between sweeps
    /// * `mode` - Deactivate or delete expired rows
    /// * `deadline` - Upper bound for a single sweep
    pub fn new(
        sessions: Arc<SR>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        mode: ReapMode,
        deadline: Duration,
    ) -> Self {
        Self {
            sessions,
            clock,
            interval,
            mode,
            deadline,
        }
    }

    /// Run a single sweep.
    ///
    /// # Returns
    /// Number of sessions deactivated or deleted
    ///
    /// # Errors
    /// * `Repository` - Store rejected the sweep
    /// * `InfrastructureTimeout` - Sweep exceeded its deadline
    pub async fn run_once(&self) -> Result<u64, AuthError> {
        let now = self.clock.now();

        let count = tokio::time::timeout(self.deadline, self.sessions.purge_expired(now, self.mode))
            .await
            .map_err(|_| {
                AuthError::InfrastructureTimeout(format!(
                    "purge_expired exceeded {} ms",
                    self.deadline.as_millis()
                ))
            })??;

        if count > 0 {
            tracing::info!(count, mode = ?self.mode, "Expired sessions reaped");
        } else {
            tracing::debug!(mode = ?self.mode, "No expired sessions to reap");
        }

        Ok(count)
    }

    /// Sweep forever at the configured interval.
    ///
    /// This is a long-running task that should be spawned in a separate tokio task
    pub async fn start_reaping(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            mode = ?self.mode,
            "Starting session reaper"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                tracing::error!(error = %e, "Session reaping failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use async_trait::async_trait;
    use auth::ManualClock;
    use chrono::DateTime;
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::domain::errors::RepositoryError;
    use crate::domain::session::models::Session;
    use crate::domain::session::models::SessionId;
    use crate::domain::user::models::UserId;

    mock! {
        pub TestSessionRepository {}

        #[async_trait]
        impl SessionRepository for TestSessionRepository {
            async fn create(&self, session: Session) -> Result<Session, RepositoryError>;
            async fn find_active_by_token(&self, token: &str) -> Result<Option<Session>, RepositoryError>;
            async fn deactivate(&self, id: &SessionId) -> Result<(), RepositoryError>;
            async fn deactivate_all_for_user(&self, user_id: &UserId) -> Result<u64, RepositoryError>;
            async fn purge_expired(&self, now: DateTime<Utc>, mode: ReapMode) -> Result<u64, RepositoryError>;
        }
    }

    fn reaper(
        sessions: MockTestSessionRepository,
        clock: Arc<ManualClock>,
        mode: ReapMode,
    ) -> SessionReaper<MockTestSessionRepository> {
        SessionReaper::new(
            Arc::new(sessions),
            clock,
            Duration::from_secs(60),
            mode,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_run_once_uses_clock_and_mode() {
        let clock = Arc::new(ManualClock::starting_now());
        let expected_now = clock.now();
        let mut sessions = MockTestSessionRepository::new();

        sessions
            .expect_purge_expired()
            .withf(move |now, mode| *now == expected_now && *mode == ReapMode::Delete)
            .times(1)
            .returning(|_, _| Ok(3));

        let reaper = reaper(sessions, clock, ReapMode::Delete);

        assert_eq!(reaper.run_once().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_run_once_surfaces_store_errors() {
        let mut sessions = MockTestSessionRepository::new();
        sessions
            .expect_purge_expired()
            .returning(|_, _| Err(RepositoryError::Database("relation missing".to_string())));

        let reaper = reaper(sessions, Arc::new(ManualClock::starting_now()), ReapMode::Deactivate);

        assert!(matches!(
            reaper.run_once().await,
            Err(AuthError::Repository(RepositoryError::Database(_)))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reaping_sweeps_each_interval() {
        let sweeps = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&sweeps);
        let mut sessions = MockTestSessionRepository::new();
        sessions.expect_purge_expired().returning(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        });

        let reaper = reaper(sessions, Arc::new(ManualClock::starting_now()), ReapMode::Deactivate);
        let handle = tokio::spawn(reaper.start_reaping());

        // First tick fires immediately, then once per 60 s
        tokio::time::sleep(Duration::from_secs(121)).await;
        handle.abort();
        let _ = handle.await;

        assert_eq!(sweeps.load(Ordering::SeqCst), 3);
    }
}
