use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use anyhow::{Context, Result};
use blog_service::identity::clerk::ClerkDirectory;
use blog_service::rate_limit::RedisRateLimitStore;
use blog_service::{AppState, Config, Stores};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

async fn ready(
    pool: web::Data<PgPool>,
    redis: web::Data<redis::aio::ConnectionManager>,
) -> impl Responder {
    if let Err(e) = sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        error!("Readiness check failed (postgres): {}", e);
        return HttpResponse::ServiceUnavailable()
            .json(serde_json::json!({ "status": "unavailable", "dependency": "postgres" }));
    }

    let mut conn = redis.get_ref().clone();
    if let Err(e) = redis::cmd("PING").query_async::<_, String>(&mut conn).await {
        error!("Readiness check failed (redis): {}", e);
        return HttpResponse::ServiceUnavailable()
            .json(serde_json::json!({ "status": "unavailable", "dependency": "redis" }));
    }

    HttpResponse::Ok().json(serde_json::json!({ "status": "ready" }))
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
        }))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting blog-service");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        env = %config.app.env,
        http_port = config.app.http_port,
        post_limit = config.rate_limit.max_requests,
        post_window_secs = config.rate_limit.window_seconds,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    sqlx::query("SELECT 1")
        .execute(&pg_pool)
        .await
        .context("Failed to verify database connection")?;

    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database ready, migrations applied");

    let redis_client =
        redis::Client::open(config.redis.url.as_str()).context("Failed to create Redis client")?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client)
        .await
        .context("Failed to connect to Redis")?;
    info!("Redis connection established");

    let directory =
        ClerkDirectory::new(&config.identity).context("Failed to build identity directory client")?;

    let state = AppState::new(
        Stores::postgres(pg_pool.clone()),
        Arc::new(directory),
        Arc::new(
            RedisRateLimitStore::new(redis_conn.clone())
                .with_timeout(Duration::from_millis(config.rate_limit.store_timeout_ms)),
        ),
        config.rate_limit.clone(),
        &config.social,
    );

    let http_addr = format!("{}:{}", config.app.host, config.app.http_port);
    info!("HTTP server listening on http://{}", http_addr);

    let pool_data = web::Data::new(pg_pool);
    let redis_data = web::Data::new(redis_conn);
    let state_data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(pool_data.clone())
            .app_data(redis_data.clone())
            .app_data(state_data.clone())
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health))
                    .route("/ready", web::get().to(ready)),
            )
    })
    .bind(&http_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("blog-service shut down");
    Ok(())
}
