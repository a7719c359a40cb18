use std::sync::Arc;

use auth::Authenticator;
use auth::Clock;
use auth::OsRandom;
use auth::SystemClock;
use identity_service::config::Config;
use identity_service::domain::auth::reaper::SessionReaper;
use identity_service::domain::auth::service::AuthService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::notifications::TracingResetNotifier;
use identity_service::outbound::repositories::PostgresSessionRepository;
use identity_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        jwt_issuer = %config.jwt.issuer,
        token_lifetime_hours = config.jwt.expiration_hours,
        reap_mode = ?config.session.reap_mode,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let authenticator = Arc::new(Authenticator::with_sources(
        config.jwt.secret.as_bytes(),
        &config.jwt.issuer,
        config.hash_params(),
        Arc::clone(&clock),
        Arc::new(OsRandom),
    )?);

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let session_repository = Arc::new(PostgresSessionRepository::new(pg_pool));

    let auth_service = Arc::new(AuthService::new(
        user_repository,
        Arc::clone(&session_repository),
        Arc::new(TracingResetNotifier),
        authenticator,
        config.lifetimes(),
        config.deadlines(),
    ));

    let reaper = SessionReaper::new(
        session_repository,
        clock,
        config.reaper_interval(),
        config.session.reap_mode,
        config.deadlines().store,
    );
    tokio::spawn(async move {
        reaper.start_reaping().await;
    });

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, create_router(auth_service)).await?;

    Ok(())
}
