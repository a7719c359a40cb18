use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use auth::opaque_token;
use auth::token_digest;
use auth::Authenticator;
use auth::Claims;
use auth::IssuedToken;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthResult;
use crate::domain::auth::models::Deadlines;
use crate::domain::auth::models::Lifetimes;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::auth::ports::PasswordResetNotifier;
use crate::domain::errors::RepositoryError;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::session::models::SessionMetadata;
use crate::domain::session::ports::SessionRepository;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::Password;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::domain::user::ports::UserRepository;

const RESET_TOKEN_BYTES: usize = 32;

/// Domain service implementation for authentication and sessions.
///
/// Combines the stateless token check with the session store so that
/// individual tokens can be revoked. Holds no mutable state of its own.
pub struct AuthService<UR, SR, RN>
where
    UR: UserRepository,
    SR: SessionRepository,
    RN: PasswordResetNotifier,
{
    users: Arc<UR>,
    sessions: Arc<SR>,
    reset_notifier: Arc<RN>,
    authenticator: Arc<Authenticator>,
    lifetimes: Lifetimes,
    deadlines: Deadlines,
}

impl<UR, SR, RN> AuthService<UR, SR, RN>
where
    UR: UserRepository,
    SR: SessionRepository,
    RN: PasswordResetNotifier,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User record store
    /// * `sessions` - Session store
    /// * `reset_notifier` - Password reset delivery hook
    /// * `authenticator` - Hasher, token codec, clock and entropy source
    /// * `lifetimes` - Token and reset token lifetimes
    /// * `deadlines` - Store and hash timeouts
    pub fn new(
        users: Arc<UR>,
        sessions: Arc<SR>,
        reset_notifier: Arc<RN>,
        authenticator: Arc<Authenticator>,
        lifetimes: Lifetimes,
        deadlines: Deadlines,
    ) -> Self {
        Self {
            users,
            sessions,
            reset_notifier,
            authenticator,
            lifetimes,
            deadlines,
        }
    }

    /// Run a store call under the store deadline.
    async fn store<T, E, F>(&self, operation: &'static str, call: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, E>>,
        AuthError: From<E>,
    {
        match tokio::time::timeout(self.deadlines.store, call).await {
            Ok(result) => result.map_err(AuthError::from),
            Err(_) => {
                tracing::warn!(
                    operation,
                    deadline_ms = self.deadlines.store.as_millis() as u64,
                    "Store call timed out"
                );
                Err(AuthError::InfrastructureTimeout(format!(
                    "{} exceeded {} ms",
                    operation,
                    self.deadlines.store.as_millis()
                )))
            }
        }
    }

    /// Run credential work on the blocking pool under the hash deadline.
    async fn blocking<T, F>(&self, operation: &'static str, work: F) -> Result<T, AuthError>
    where
        F: FnOnce(&Authenticator) -> T + Send + 'static,
        T: Send + 'static,
    {
        let authenticator = Arc::clone(&self.authenticator);
        let handle = tokio::task::spawn_blocking(move || work(&authenticator));

        match tokio::time::timeout(self.deadlines.hash, handle).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(AuthError::Internal(format!("{} task failed: {}", operation, e))),
            Err(_) => {
                tracing::warn!(
                    operation,
                    deadline_ms = self.deadlines.hash.as_millis() as u64,
                    "Credential work timed out"
                );
                Err(AuthError::InfrastructureTimeout(format!(
                    "{} exceeded {} ms",
                    operation,
                    self.deadlines.hash.as_millis()
                )))
            }
        }
    }

    /// Bind a freshly issued token to a new session.
    async fn open_session(
        &self,
        user: &User,
        issued: IssuedToken,
        metadata: SessionMetadata,
    ) -> Result<AuthResult, AuthError> {
        let session = Session::open(
            SessionId::generate(self.authenticator.random())?,
            user.id,
            issued.token,
            issued.claims.expires_at(),
            metadata,
            self.authenticator.now(),
        );

        let session = self
            .store("create_session", self.sessions.create(session))
            .await
            .map_err(|e| match e {
                AuthError::Repository(RepositoryError::Conflict(_)) => AuthError::SessionConflict,
                other => other,
            })?;

        tracing::info!(user_id = %user.id, session_id = %session.id, "Session opened");

        Ok(AuthResult {
            user: user.into(),
            session_id: session.id,
            expires_at: session.expires_at,
            token: session.token,
        })
    }

    /// Hash a new password on the blocking pool.
    async fn hash_new_password(&self, password: Password) -> Result<String, AuthError> {
        Ok(self
            .blocking("hash_password", move |a| a.hash_password(password.as_str()))
            .await??)
    }

    /// Revoke every session after a credential change.
    async fn revoke_after_credential_change(&self, user_id: &UserId) -> Result<(), AuthError> {
        let revoked = self
            .store(
                "deactivate_user_sessions",
                self.sessions.deactivate_all_for_user(user_id),
            )
            .await?;

        tracing::info!(user_id = %user_id, revoked, "Credential replaced, sessions revoked");
        Ok(())
    }
}

#[async_trait]
impl<UR, SR, RN> AuthServicePort for AuthService<UR, SR, RN>
where
    UR: UserRepository,
    SR: SessionRepository,
    RN: PasswordResetNotifier,
{
    async fn register(
        &self,
        command: RegisterCommand,
        metadata: SessionMetadata,
    ) -> Result<AuthResult, AuthError> {
        let RegisterCommand {
            email,
            password,
            first_name,
            last_name,
        } = command;

        if self
            .store("find_user_by_email", self.users.find_by_email(&email))
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self
            .blocking("hash_password", move |a| a.hash_password(password.as_str()))
            .await??;

        let user = User::register(
            UserId::generate(self.authenticator.random())?,
            email,
            password_hash,
            first_name,
            last_name,
            self.authenticator.now(),
        );

        // The store's uniqueness constraint is the final arbiter
        let user = self
            .store("create_user", self.users.create(user))
            .await
            .map_err(|e| match e {
                AuthError::Repository(RepositoryError::Conflict(_)) => AuthError::DuplicateEmail,
                other => other,
            })?;

        let issued = self.authenticator.issue_token(
            &user.id.to_string(),
            user.email.as_str(),
            self.lifetimes.token,
        )?;
        let result = self.open_session(&user, issued, metadata).await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(result)
    }

    async fn login(
        &self,
        command: LoginCommand,
        metadata: SessionMetadata,
    ) -> Result<AuthResult, AuthError> {
        let LoginCommand { email, password } = command;

        let user = match EmailAddress::new(email) {
            Ok(email) => {
                self.store("find_user_by_email", self.users.find_by_email(&email))
                    .await?
            }
            Err(_) => None,
        };

        let Some(user) = user else {
            self.blocking("verify_password", move |a| {
                a.reject_without_credential(&password)
            })
            .await?;
            tracing::debug!("Login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let subject_id = user.id.to_string();
        let subject_email = user.email.as_str().to_string();
        let stored_credential = user.password_hash.clone();
        let ttl = self.lifetimes.token;

        let issued = self
            .blocking("verify_password", move |a| {
                a.authenticate(
                    &password,
                    stored_credential.as_deref(),
                    &subject_id,
                    &subject_email,
                    ttl,
                )
            })
            .await?
            .map_err(|e| {
                tracing::debug!(user_id = %user.id, "Login rejected");
                AuthError::from(e)
            })?;

        // A token without a session never validates, so dropping it here is safe
        if !user.is_active {
            tracing::info!(user_id = %user.id, "Login refused for disabled account");
            return Err(AuthError::AccountDisabled);
        }

        let mut result = self.open_session(&user, issued, metadata).await?;

        let now = self.authenticator.now();
        match self
            .store("record_login", self.users.record_login(&user.id, now))
            .await
        {
            Ok(()) => result.user.last_login_at = Some(now),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to record last login");
            }
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(result)
    }

    async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.authenticator.validate_token(token)?;

        let session = self
            .store(
                "find_active_session",
                self.sessions.find_active_by_token(token),
            )
            .await?
            .ok_or(AuthError::SessionRevoked)?;

        if session.user_id.to_string() != claims.sub {
            tracing::warn!(
                session_id = %session.id,
                "Session subject does not match token subject"
            );
            return Err(AuthError::SessionRevoked);
        }

        // The session's expiry governs when it is shorter than the token's
        if session.is_expired(self.authenticator.now()) {
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let Some(session) = self
            .store(
                "find_active_session",
                self.sessions.find_active_by_token(token),
            )
            .await?
        else {
            tracing::debug!("Logout for unknown or inactive session");
            return Ok(());
        };

        self.store("deactivate_session", self.sessions.deactivate(&session.id))
            .await?;

        tracing::info!(user_id = %session.user_id, session_id = %session.id, "Session revoked");
        Ok(())
    }

    async fn logout_all(&self, user_id: &UserId) -> Result<u64, AuthError> {
        let revoked = self
            .store(
                "deactivate_user_sessions",
                self.sessions.deactivate_all_for_user(user_id),
            )
            .await?;

        tracing::info!(user_id = %user_id, revoked, "All sessions revoked");
        Ok(revoked)
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<UserProfile, AuthError> {
        self.store("find_user_by_id", self.users.find_by_id(user_id))
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or(AuthError::UserNotFound(user_id.to_string()))
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let new_password = Password::new(new_password.to_string())?;

        let user = self
            .store("find_user_by_id", self.users.find_by_id(user_id))
            .await?
            .ok_or(AuthError::UserNotFound(user_id.to_string()))?;

        let current_password = current_password.to_string();
        let stored_credential = user.password_hash.clone();
        let verified = self
            .blocking("verify_password", move |a| match stored_credential {
                Some(credential) => a.verify_password(&current_password, &credential),
                None => {
                    let _ = a.reject_without_credential(&current_password);
                    false
                }
            })
            .await?;

        if !verified {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.hash_new_password(new_password).await?;
        self.store(
            "set_credential",
            self.users
                .set_credential(&user.id, &password_hash, self.authenticator.now()),
        )
        .await?;

        self.revoke_after_credential_change(&user.id).await
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = EmailAddress::new(email.to_string())?;

        let Some(mut user) = self
            .store("find_user_by_email", self.users.find_by_email(&email))
            .await?
        else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        if !user.is_active {
            tracing::debug!(user_id = %user.id, "Password reset requested for disabled account");
            return Ok(());
        }

        let token = opaque_token(self.authenticator.random(), RESET_TOKEN_BYTES)?;
        let now = self.authenticator.now();
        let expires_at = now + self.lifetimes.password_reset;
        let digest = token_digest(&token);

        self.store(
            "set_password_reset",
            self.users
                .set_password_reset(&user.id, &digest, expires_at, now),
        )
        .await?;

        user.password_reset_token_hash = Some(digest);
        user.password_reset_expires_at = Some(expires_at);
        user.updated_at = now;

        let delivery = tokio::time::timeout(
            self.deadlines.store,
            self.reset_notifier
                .notify_password_reset(&user, &token, expires_at),
        )
        .await;

        match delivery {
            Ok(Ok(())) => tracing::info!(user_id = %user.id, "Password reset issued"),
            Ok(Err(e)) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to deliver password reset")
            }
            Err(_) => tracing::error!(user_id = %user.id, "Password reset delivery timed out"),
        }

        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let new_password = Password::new(new_password.to_string())?;
        let password_hash = self.hash_new_password(new_password).await?;

        // Lookup, expiry check and credential write are one atomic step
        let user = self
            .store(
                "consume_password_reset",
                self.users.consume_password_reset(
                    &token_digest(token),
                    &password_hash,
                    self.authenticator.now(),
                ),
            )
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        self.revoke_after_credential_change(&user.id).await
    }
}
