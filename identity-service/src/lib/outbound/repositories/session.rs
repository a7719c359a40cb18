use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::errors::RepositoryError;
use crate::domain::session::models::ReapMode;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::session::models::SessionMetadata;
use crate::domain::session::ports::SessionRepository;
use crate::domain::user::models::UserId;

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    token: String,
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
    device_info: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: SessionId(row.id),
            user_id: UserId(row.user_id),
            token: row.token,
            refresh_token: row.refresh_token,
            expires_at: row.expires_at,
            is_active: row.is_active,
            metadata: SessionMetadata {
                device_info: row.device_info,
                ip_address: row.ip_address,
                user_agent: row.user_agent,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create(&self, session: Session) -> Result<Session, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, user_id, token, refresh_token, expires_at,
                device_info, ip_address, user_agent, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(session.id.0)
        .bind(session.user_id.0)
        .bind(&session.token)
        .bind(&session.refresh_token)
        .bind(session.expires_at)
        .bind(&session.metadata.device_info)
        .bind(&session.metadata.ip_address)
        .bind(&session.metadata.user_agent)
        .bind(session.is_active)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_active_by_token(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT * FROM sessions WHERE token = $1 AND is_active",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Session::from))
    }

    async fn deactivate(&self, id: &SessionId) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE sessions SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn deactivate_all_for_user(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE sessions SET is_active = FALSE, updated_at = NOW() WHERE user_id = $1 AND is_active",
        )
        .bind(user_id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        mode: ReapMode,
    ) -> Result<u64, RepositoryError> {
        let sql = match mode {
            ReapMode::Deactivate => {
                "UPDATE sessions SET is_active = FALSE, updated_at = $1 WHERE is_active AND expires_at < $1"
            }
            ReapMode::Delete => "DELETE FROM sessions WHERE expires_at < $1",
        };

        let result = sqlx::query(sql).bind(now).execute(&self.pool).await?;

        Ok(result.rows_affected())
    }
}
