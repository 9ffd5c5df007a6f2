use std::collections::BTreeMap;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::BookStore;
use crate::modules::books::models::{Book, BookId, NewBook};

#[derive(Debug)]
struct Shelf {
    last_id: BookId,
    books: BTreeMap<BookId, Book>,
}

/// Process-local store. Ids come from a counter and are never reused.
#[derive(Debug)]
pub struct InMemoryBookStore {
    shelf: RwLock<Shelf>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self {
            shelf: RwLock::new(Shelf {
                last_id: 0,
                books: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn find_all(&self) -> anyhow::Result<Vec<Book>> {
        let shelf = self.shelf.read().await;
        Ok(shelf.books.values().cloned().collect())
    }

    async fn find_by_id(&self, id: BookId) -> anyhow::Result<Option<Book>> {
        let shelf = self.shelf.read().await;
        Ok(shelf.books.get(&id).cloned())
    }

    async fn count_all(&self) -> anyhow::Result<u64> {
        let shelf = self.shelf.read().await;
        Ok(shelf.books.len() as u64)
    }

    async fn insert(&self, book: NewBook) -> anyhow::Result<Book> {
        let mut shelf = self.shelf.write().await;
        let id = shelf
            .last_id
            .checked_add(1)
            .ok_or_else(|| anyhow!("book id space exhausted"))?;
        shelf.last_id = id;

        let stored = Book {
            id,
            title: book.title,
            author: book.author,
            rating: book.rating,
        };
        shelf.books.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, book: &Book) -> anyhow::Result<()> {
        let mut shelf = self.shelf.write().await;
        match shelf.books.get_mut(&book.id) {
            Some(slot) => {
                *slot = book.clone();
                Ok(())
            }
            None => bail!("book {} no longer exists", book.id),
        }
    }

    async fn delete(&self, book: &Book) -> anyhow::Result<()> {
        let mut shelf = self.shelf.write().await;
        if shelf.books.remove(&book.id).is_none() {
            bail!("book {} no longer exists", book.id);
        }
        Ok(())
    }
}
