use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::errors::RepositoryError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    display_name: Option<String>,
    is_active: bool,
    password_reset_token_hash: Option<String>,
    password_reset_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = EmailAddress::new(row.email)
            .map_err(|e| RepositoryError::Database(format!("Stored email is invalid: {}", e)))?;

        Ok(User {
            id: UserId(row.id),
            email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            display_name: row.display_name,
            is_active: row.is_active,
            password_reset_token_hash: row.password_reset_token_hash,
            password_reset_expires_at: row.password_reset_expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login_at: row.last_login_at,
        })
    }
}

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, first_name, last_name, display_name, is_active,
                password_reset_token_hash, password_reset_expires_at,
                created_at, updated_at, last_login_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.display_name)
        .bind(user.is_active)
        .bind(&user.password_reset_token_hash)
        .bind(user.password_reset_expires_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2,
                password_hash = $3,
                first_name = $4,
                last_name = $5,
                display_name = $6,
                is_active = $7,
                password_reset_token_hash = $8,
                password_reset_expires_at = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.display_name)
        .bind(user.is_active)
        .bind(&user.password_reset_token_hash)
        .bind(user.password_reset_expires_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }

    async fn set_password_reset(
        &self,
        id: &UserId,
        digest: &str,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token_hash = $2,
                password_reset_expires_at = $3,
                updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(digest)
        .bind(expires_at)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn set_credential(
        &self,
        id: &UserId,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_token_hash = NULL,
                password_reset_expires_at = NULL,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }

    async fn consume_password_reset(
        &self,
        digest: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_token_hash = NULL,
                password_reset_expires_at = NULL,
                updated_at = $3
            WHERE password_reset_token_hash = $1
              AND password_reset_expires_at >= $3
            RETURNING *
            "#,
        )
        .bind(digest)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id.0)
            .bind(at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
