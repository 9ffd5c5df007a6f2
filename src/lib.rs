//! Bookshelf service library
//!
//! Wires settings, telemetry, the record store and the books module into a
//! running HTTP server.

pub mod modules;

use std::sync::Arc;

use anyhow::Context;
use bookshelf_kernel::{
    settings::{DatabaseBackend, DatabaseSettings, Settings},
    InitCtx, ModuleRegistry,
};

use modules::books::store::{BookStore, InMemoryBookStore, PgBookStore};

/// Build the record store selected by `database.backend`
pub async fn build_store(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn BookStore>> {
    match settings.backend {
        DatabaseBackend::Postgres => {
            let pool = bookshelf_db::connect(settings)
                .await
                .context("failed to open the postgres record store")?;
            Ok(Arc::new(PgBookStore::new(pool)))
        }
        DatabaseBackend::Memory => {
            tracing::warn!("using the in-memory record store; data is lost on exit");
            Ok(Arc::new(InMemoryBookStore::new()))
        }
    }
}

/// Registry holding every service module over `store`
pub fn build_registry(store: Arc<dyn BookStore>, settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, settings);
    registry
}

/// Run the service until a shutdown signal arrives
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    bookshelf_telemetry::init(&settings.telemetry);

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        "bookshelf bootstrap starting"
    );

    let store = build_store(&settings.database).await?;
    let registry = build_registry(store, &settings);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("bookshelf bootstrap complete");

    let served = bookshelf_http::start_server(&registry, &settings).await;
    registry.stop_all().await?;
    served
}
