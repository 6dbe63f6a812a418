use std::sync::Arc;

use fitness_service::account::service::AccountService;
use fitness_service::config::Config;
use fitness_service::config::DEFAULT_LOG_FILTER;
use fitness_service::domain::user::service::UserService;
use fitness_service::inbound::http::router::create_router;
use fitness_service::outbound::notifications::LogResetMailer;
use fitness_service::outbound::repositories::PostgresResetLedger;
use fitness_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "fitness-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;
    let auth_settings = config.auth.to_settings()?;

    tracing::info!(
        http_port = config.server.http_port,
        algorithm = %config.auth.algorithm,
        access_token_ttl_minutes = config.auth.access_token_ttl_minutes,
        reset_token_ttl_minutes = config.auth.reset_token_ttl_minutes,
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

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let reset_ledger = Arc::new(PostgresResetLedger::new(pg_pool));
    let reset_mailer = Arc::new(LogResetMailer::new());

    let user_service = Arc::new(UserService::new(Arc::clone(&user_repository)));
    let account_service = Arc::new(AccountService::new(
        &auth_settings,
        user_repository,
        reset_mailer,
        reset_ledger,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(user_service, account_service);
    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited");
    Ok(())
}
