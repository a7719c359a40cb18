#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use auth::Authenticator;
use auth::HashParams;
use auth::ManualClock;
use auth::OsRandom;
use auth::DEFAULT_ISSUER;
use chrono::DateTime;
use chrono::Utc;
use identity_service::domain::auth::models::Deadlines;
use identity_service::domain::auth::models::Lifetimes;
use identity_service::domain::auth::ports::PasswordResetNotifier;
use identity_service::domain::auth::service::AuthService;
use identity_service::domain::user::models::User;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::InMemorySessionRepository;
use identity_service::outbound::repositories::InMemoryUserRepository;
use serde_json::json;
use serde_json::Value;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

pub type TestAuthService =
    AuthService<InMemoryUserRepository, InMemorySessionRepository, CapturingResetNotifier>;

/// Reset notifier that keeps the last issued token for the test to use.
#[derive(Debug, Default)]
pub struct CapturingResetNotifier {
    last_token: Mutex<Option<String>>,
}

impl CapturingResetNotifier {
    pub fn last_token(&self) -> Option<String> {
        self.last_token.lock().unwrap().clone()
    }
}

#[async_trait]
impl PasswordResetNotifier for CapturingResetNotifier {
    async fn notify_password_reset(
        &self,
        _user: &User,
        token: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error> {
        *self.last_token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }
}

/// Service wired over in-memory stores and a manual clock
pub struct TestServices {
    pub clock: Arc<ManualClock>,
    pub users: Arc<InMemoryUserRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub reset_notifier: Arc<CapturingResetNotifier>,
    pub authenticator: Arc<Authenticator>,
    pub service: Arc<TestAuthService>,
}

impl TestServices {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::starting_now());
        let users = Arc::new(InMemoryUserRepository::new());
        let sessions = Arc::new(InMemorySessionRepository::new());
        let reset_notifier = Arc::new(CapturingResetNotifier::default());

        // Light parameters keep the suite fast
        let params = HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 4,
        };
        let authenticator = Arc::new(
            Authenticator::with_sources(
                TEST_SECRET,
                DEFAULT_ISSUER,
                params,
                clock.clone(),
                Arc::new(OsRandom),
            )
            .expect("Failed to create authenticator"),
        );

        let service = Arc::new(AuthService::new(
            Arc::clone(&users),
            Arc::clone(&sessions),
            Arc::clone(&reset_notifier),
            Arc::clone(&authenticator),
            Lifetimes::default(),
            Deadlines {
                store: StdDuration::from_secs(2),
                hash: StdDuration::from_secs(10),
            },
        ));

        Self {
            clock,
            users,
            sessions,
            reset_notifier,
            authenticator,
            service,
        }
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub services: TestServices,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        let services = TestServices::new();

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let router = create_router(services.service.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            services,
            api_client: reqwest::Client::new(),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Register an account and return the response body
    pub async fn register(&self, email: &str, password: &str) -> Value {
        let response = self
            .post("/api/auth/register")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }

    /// Log in and return the bearer token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Register an account, then log in to it and return the new token
    pub async fn login_after_register(&self, email: &str, password: &str) -> String {
        self.register(email, password).await;
        self.login(email, password).await
    }
}
