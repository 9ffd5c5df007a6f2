use anyhow::{bail, Context};
use async_trait::async_trait;
use bookshelf_db::PgPool;

use super::BookStore;
use crate::modules::books::models::{Book, BookId, NewBook};

/// Row shape of the `books` table.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: i32,
    title: Option<String>,
    author: Option<String>,
    rating: Option<i32>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            rating: row.rating,
        }
    }
}

/// `books` table accessed through a shared `sqlx` pool.
#[derive(Debug, Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn find_all(&self) -> anyhow::Result<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, author, rating FROM books ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list books")?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_id(&self, id: BookId) -> anyhow::Result<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, author, rating FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load book {}", id))?;

        Ok(row.map(Book::from))
    }

    async fn count_all(&self) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await
            .context("failed to count books")?;

        u64::try_from(count).context("negative book count")
    }

    async fn insert(&self, book: NewBook) -> anyhow::Result<Book> {
        let row = sqlx::query_as::<_, BookRow>(
            "INSERT INTO books (title, author, rating) VALUES ($1, $2, $3) \
             RETURNING id, title, author, rating",
        )
        .bind(book.title)
        .bind(book.author)
        .bind(book.rating)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert book")?;

        Ok(row.into())
    }

    async fn update(&self, book: &Book) -> anyhow::Result<()> {
        let result =
            sqlx::query("UPDATE books SET title = $1, author = $2, rating = $3 WHERE id = $4")
                .bind(&book.title)
                .bind(&book.author)
                .bind(book.rating)
                .bind(book.id)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to update book {}", book.id))?;

        if result.rows_affected() == 0 {
            bail!("book {} no longer exists", book.id);
        }
        Ok(())
    }

    async fn delete(&self, book: &Book) -> anyhow::Result<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book.id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete book {}", book.id))?;

        if result.rows_affected() == 0 {
            bail!("book {} no longer exists", book.id);
        }
        Ok(())
    }
}
