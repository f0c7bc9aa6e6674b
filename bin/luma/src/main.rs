//! # Luma Binary
//!
//! The entry point that assembles the content API based on compile-time features.

mod settings;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use luma_api::middleware::{cors_policy, standard_middleware};
use luma_api::{configure_routes, AppState};
use luma_core::{ContentStore, KeyValueStore};

use settings::Settings;

// Feature-gated imports: the storage backend is chosen at compile time
#[cfg(feature = "db-sqlite")]
use luma_db_sqlite::SqliteKeyValueStore;

#[cfg(feature = "storage-local")]
use luma_storage_local::LocalKeyValueStore;

#[cfg(feature = "db-sqlite")]
async fn open_storage(settings: &Settings) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(SqliteKeyValueStore::new(&settings.database_url).await?))
}

#[cfg(all(feature = "storage-local", not(feature = "db-sqlite")))]
async fn open_storage(settings: &Settings) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    Ok(Arc::new(LocalKeyValueStore::new(settings.storage_dir.clone())))
}

#[cfg(not(any(feature = "db-sqlite", feature = "storage-local")))]
async fn open_storage(_settings: &Settings) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    log::warn!("no storage feature enabled; content will not survive a restart");
    Ok(Arc::new(luma_core::MemoryKeyValueStore::new()))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env()?;

    // 1. Initialize Storage Implementation
    let kv = open_storage(&settings).await?;

    // 2. Load every author's content into the shared store
    let store = ContentStore::open(kv, settings.store.clone()).await;
    let state = web::Data::new(AppState {
        store: Arc::new(store),
    });

    log::info!("Luma content API starting on http://{}", settings.bind);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(standard_middleware())
            .wrap(cors_policy())
            .configure(configure_routes)
    })
    .bind(&settings.bind)?
    .run()
    .await?;

    Ok(())
}
