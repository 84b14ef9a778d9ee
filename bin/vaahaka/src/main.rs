//! # Vaahaka Binary
//!
//! The entry point that assembles the application based on compile-time
//! features.

use actix_web::{web, App, HttpServer};
use vk_api::handlers::AppState;
use vk_api::{configure_routes, middleware};

// Feature-gated imports: storage plugins are compiled to order.
#[cfg(feature = "db-sqlite")]
use vk_db_sqlite::SqliteStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:vaahaka.db?mode=rwc".to_string());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    // 1. Initialize the storage implementation
    #[cfg(feature = "db-sqlite")]
    let store = SqliteStore::connect(&database_url)
        .await
        .map_err(|err| anyhow::anyhow!("failed to open {database_url}: {err}"))?;

    // 2. Wrap in AppState (dynamic dispatch keeps plugins swappable)
    let state = web::Data::new(AppState {
        catalog: Box::new(store.clone()),
        engage: Box::new(store),
    });

    log::info!("🚀 Vaahaka starting on http://{bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy())
            .service(actix_files::Files::new("/static", "./static"))
            .configure(configure_routes)
    })
    .bind(bind_addr.as_str())?
    .run()
    .await?;

    Ok(())
}
