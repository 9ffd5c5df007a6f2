pub mod error;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, patch},
    Router,
};
use bookshelf_http::{error::method_not_allowed, ErrorBody};
use bookshelf_kernel::{InitCtx, Module};
use utoipa::OpenApi;

use handlers::BooksState;
use store::BookStore;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_books,
        handlers::create_book,
        handlers::update_rating,
        handlers::delete_book
    ),
    components(schemas(
        models::BookView,
        models::RatingValue,
        models::CreateBookRequest,
        models::UpdateRatingRequest,
        handlers::BookPage,
        handlers::BookCreated,
        handlers::BookDeleted,
        handlers::RatingUpdated,
        ErrorBody
    )),
    tags((name = "Books", description = "Paginated book collection"))
)]
struct BooksApi;

/// Books module: paginated CRUD over the book collection
pub struct BooksModule {
    state: Arc<BooksState>,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>, page_size: usize) -> Self {
        Self {
            state: Arc::new(BooksState { store, page_size }),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            page_size = self.state.page_size,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/books",
                get(handlers::list_books)
                    .post(handlers::create_book)
                    .fallback(method_not_allowed),
            )
            .route(
                "/books/{id}",
                patch(handlers::update_rating)
                    .delete(handlers::delete_book)
                    .fallback(method_not_allowed),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<utoipa::openapi::OpenApi> {
        Some(BooksApi::openapi())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let total = self.state.store.count_all().await?;
        tracing::info!(module = self.name(), total_books = total, "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module over `store`
pub fn create_module(store: Arc<dyn BookStore>, page_size: usize) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store, page_size))
}
