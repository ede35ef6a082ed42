use std::sync::Arc;
use poll_backend::{
    config::AppConfig,
    identity::PgIdentity,
    queries::PgStore,
    routes::{build, AppState},
};
use shuttle_runtime::CustomError;
use sqlx::PgPool;
use tracing::info;

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🚀 Starting poll server");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(CustomError::new)?;

    info!("📋 Migrations complete");

    let config = AppConfig::from_secrets(&secret_store);
    let state = AppState::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(PgIdentity::new(pool)),
    );

    Ok(build(state, &config).into())
}
