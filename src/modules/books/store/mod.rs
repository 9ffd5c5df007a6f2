//! Record store port for books and its adapters.

use async_trait::async_trait;

use super::models::{Book, BookId, NewBook};

mod memory;
mod postgres;

pub use memory::InMemoryBookStore;
pub use postgres::PgBookStore;

/// Persistence operations the books handlers need.
///
/// Any method may fail with a store error; handlers decide how that surfaces.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every book, ordered by id ascending.
    async fn find_all(&self) -> anyhow::Result<Vec<Book>>;
    async fn find_by_id(&self, id: BookId) -> anyhow::Result<Option<Book>>;
    async fn count_all(&self) -> anyhow::Result<u64>;
    /// Persist a new book; the store assigns its id.
    async fn insert(&self, book: NewBook) -> anyhow::Result<Book>;
    /// Write back every column of an existing book.
    async fn update(&self, book: &Book) -> anyhow::Result<()>;
    async fn delete(&self, book: &Book) -> anyhow::Result<()>;
}
