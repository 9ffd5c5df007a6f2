//! HTTP handlers for the books routes.
//!
//! Every mutating handler runs its store work in one protected region (a
//! `*_inner` function returning [`BookError`]) and folds any failure into that
//! handler's single outward status. Listing is the exception: an empty page
//! is reported as 404 explicitly.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use bookshelf_http::{ApiError, ErrorBody};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    error::BookError,
    models::{Book, BookId, BookView, CreateBookRequest, NewBook, UpdateRatingRequest},
    pagination::{paginate, PageQuery},
    store::BookStore,
};

/// Shared handler state: the record store and the configured page size.
pub struct BooksState {
    pub store: Arc<dyn BookStore>,
    pub page_size: usize,
}

impl BooksState {
    /// Page `page` of the id-ordered list, projected for the wire, plus a
    /// fresh total count.
    async fn shelf(&self, page: i64) -> anyhow::Result<(Vec<BookView>, u64)> {
        let books = self.store.find_all().await?;
        let slice = paginate(page, self.page_size, &books)
            .iter()
            .map(BookView::from)
            .collect();
        let total = self.store.count_all().await?;
        Ok((slice, total))
    }

    async fn existing(&self, id: u64) -> Result<Book, BookError> {
        let book_id = BookId::try_from(id).map_err(|_| BookError::NotFound(id))?;
        self.store
            .find_by_id(book_id)
            .await?
            .ok_or(BookError::NotFound(id))
    }
}

/// `GET /books` response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookPage {
    pub success: bool,
    pub books: Vec<BookView>,
    pub total_books: u64,
}

/// `PATCH /books/{id}` response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RatingUpdated {
    pub success: bool,
    pub id: BookId,
}

/// `DELETE /books/{id}` response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookDeleted {
    pub success: bool,
    pub deleted: u64,
    pub books: Vec<BookView>,
    pub total_books: u64,
}

/// `POST /books` response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookCreated {
    pub success: bool,
    pub created: BookId,
    pub books: Vec<BookView>,
    pub total_books: u64,
}

fn page_of(query: Result<Query<PageQuery>, QueryRejection>) -> i64 {
    query.map(|Query(q)| q).unwrap_or_default().page_number()
}

/// Only unsigned digit runs match the route; anything else (signs, blanks,
/// letters) answers 404. Digit runs too long for `u64` saturate and then fail
/// the record lookup like any other unknown id.
fn book_id_of(path: Result<Path<String>, PathRejection>) -> Result<u64, ApiError> {
    let Path(raw) = path.map_err(|_| ApiError::NotFound)?;
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::NotFound);
    }
    Ok(raw.parse::<u64>().unwrap_or(u64::MAX))
}

/// List books, one page at a time
#[utoipa::path(
    get,
    path = "/books",
    tag = "Books",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of books", body = BookPage),
        (status = 404, description = "Page is empty", body = ErrorBody)
    )
)]
pub async fn list_books(
    State(state): State<Arc<BooksState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<BookPage>, ApiError> {
    let page = page_of(query);

    let (books, total_books) = state
        .shelf(page)
        .await
        .map_err(|err| BookError::from(err).collapse(ApiError::Unprocessable, "list_books"))?;

    if books.is_empty() {
        tracing::debug!(page, "requested page is empty");
        return Err(ApiError::NotFound);
    }

    Ok(Json(BookPage {
        success: true,
        books,
        total_books,
    }))
}

/// Set a book's rating
#[utoipa::path(
    patch,
    path = "/books/{id}",
    tag = "Books",
    params(("id" = u64, Path, description = "Book id")),
    request_body = UpdateRatingRequest,
    responses(
        (status = 200, description = "Rating stored", body = RatingUpdated),
        (status = 400, description = "Any failure, including an unknown id", body = ErrorBody)
    )
)]
pub async fn update_rating(
    State(state): State<Arc<BooksState>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<UpdateRatingRequest>, JsonRejection>,
) -> Result<Json<RatingUpdated>, ApiError> {
    let id = book_id_of(path)?;

    let id = update_rating_inner(&state, id, body)
        .await
        .map_err(|err| err.collapse(ApiError::BadRequest, "update_rating"))?;

    Ok(Json(RatingUpdated { success: true, id }))
}

async fn update_rating_inner(
    state: &BooksState,
    id: u64,
    body: Result<Json<UpdateRatingRequest>, JsonRejection>,
) -> Result<BookId, BookError> {
    let mut book = state.existing(id).await?;
    let Json(patch) = body.map_err(|rejection| BookError::MalformedBody(rejection.body_text()))?;

    if let Some(rating) = patch.rating {
        let rating = rating.ok_or_else(|| BookError::InvalidRating("null".to_string()))?;
        book.rating = Some(rating.coerce()?);
    }

    state.store.update(&book).await?;
    tracing::info!(book_id = book.id, rating = ?book.rating, "book rating updated");

    Ok(book.id)
}

/// Delete a book and return the current page
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "Books",
    params(
        ("id" = u64, Path, description = "Book id"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Book deleted", body = BookDeleted),
        (status = 422, description = "Any failure, including an unknown id", body = ErrorBody)
    )
)]
pub async fn delete_book(
    State(state): State<Arc<BooksState>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<BookDeleted>, ApiError> {
    let id = book_id_of(path)?;
    let page = page_of(query);

    delete_book_inner(&state, id, page)
        .await
        .map(Json)
        .map_err(|err| err.collapse(ApiError::Unprocessable, "delete_book"))
}

async fn delete_book_inner(
    state: &BooksState,
    id: u64,
    page: i64,
) -> Result<BookDeleted, BookError> {
    let book = state.existing(id).await?;
    state.store.delete(&book).await?;
    tracing::info!(book_id = book.id, "book deleted");

    let (books, total_books) = state.shelf(page).await?;

    Ok(BookDeleted {
        success: true,
        deleted: id,
        books,
        total_books,
    })
}

/// Create a book and return the current page
#[utoipa::path(
    post,
    path = "/books",
    tag = "Books",
    params(PageQuery),
    request_body = CreateBookRequest,
    responses(
        (status = 200, description = "Book created", body = BookCreated),
        (status = 422, description = "Any failure", body = ErrorBody)
    )
)]
pub async fn create_book(
    State(state): State<Arc<BooksState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
    body: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<Json<BookCreated>, ApiError> {
    let page = page_of(query);

    create_book_inner(&state, page, body)
        .await
        .map(Json)
        .map_err(|err| err.collapse(ApiError::Unprocessable, "create_book"))
}

async fn create_book_inner(
    state: &BooksState,
    page: i64,
    body: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<BookCreated, BookError> {
    let Json(request) =
        body.map_err(|rejection| BookError::MalformedBody(rejection.body_text()))?;
    let new_book = NewBook::try_from(request)?;

    let book = state.store.insert(new_book).await?;
    tracing::info!(book_id = book.id, "book created");

    let (books, total_books) = state.shelf(page).await?;

    Ok(BookCreated {
        success: true,
        created: book.id,
        books,
        total_books,
    })
}
