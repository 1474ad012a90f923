use std::error::Error;

use foodgram_sdk::{config::Config, jwt::JwtKeys, routes::{api, Context}};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("Database migrations applied");
    }

    let keys = JwtKeys::new(config.jwt_secret.as_bytes())?;
    let ctx = Context::new(pool, keys);

    log::info!("Listening on port {}", config.port);
    warp::serve(api(ctx)).run(([0, 0, 0, 0], config.port)).await;

    Ok(())
}
