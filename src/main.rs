// src/main.rs

use dotenvy::dotenv;
use gelora_quiz::config::Config;
use gelora_quiz::routes;
use gelora_quiz::state::AppState;
use gelora_quiz::store::{MemoryQuizStore, PgQuizStore, QuizStore};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let store: Arc<dyn QuizStore> = match &config.database_url {
        Some(url) => {
            let pool = connect_with_retry(url).await;
            Arc::new(prepare_database(pool).await)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, serving the built-in quizzes from memory");
            Arc::new(MemoryQuizStore::seeded())
        }
    };

    let state = AppState::new(store, config.clone());
    tracing::info!(
        "Rate limiting {} requests per {}s on {:?}",
        config.rate_limit.max_requests,
        config.rate_limit.window_secs(),
        config.rate_limit.paths
    );

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {}: {}", addr, e));

    // Start the server; peer addresses feed the rate limiter fingerprint
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}

async fn connect_with_retry(database_url: &str) -> PgPool {
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");
    pool
}

async fn prepare_database(pool: PgPool) -> PgQuizStore {
    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    let store = PgQuizStore::new(pool);

    // Seed the built-in catalogue into an empty database
    match store.seed_defaults().await {
        Ok(0) => {}
        Ok(count) => tracing::info!("Seeded {} quizzes", count),
        Err(e) => tracing::error!("Failed to seed quizzes: {:?}", e),
    }

    store
}
