use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::auth::ports::PasswordResetNotifier;
use crate::domain::user::models::User;

/// Reset notifier that only records the request in the log.
///
/// The token itself is never logged; delivering it to the user needs a real
/// channel such as email.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingResetNotifier;

#[async_trait]
impl PasswordResetNotifier for TracingResetNotifier {
    async fn notify_password_reset(
        &self,
        user: &User,
        _token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        tracing::info!(
            user_id = %user.id,
            expires_at = %expires_at,
            "Password reset token issued"
        );
        Ok(())
    }
}
