//! Router-level tests for the books API.
//!
//! Each test builds the real router (middleware included) over a fresh
//! in-memory record store and drives it with `oneshot`.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bookshelf_app::modules::books::{
    models::{Book, BookId, NewBook},
    store::{BookStore, InMemoryBookStore},
};
use bookshelf_kernel::settings::Settings;

fn router_over(store: Arc<dyn BookStore>) -> Router {
    let settings = Settings::default();
    let registry = bookshelf_app::build_registry(store, &settings);
    bookshelf_http::build_router(&registry)
}

async fn seeded(count: usize) -> (Arc<InMemoryBookStore>, Router) {
    let store = Arc::new(InMemoryBookStore::new());
    for n in 1..=count {
        store
            .insert(NewBook {
                title: Some(format!("Title {n}")),
                author: Some(format!("Author {n}")),
                rating: Some((n % 5) as i32),
            })
            .await
            .unwrap();
    }
    let router = router_over(store.clone());
    (store, router)
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn ids(body: &Value) -> Vec<i64> {
    body["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_i64().unwrap())
        .collect()
}

fn error_envelope(code: u16, message: &str) -> Value {
    json!({"success": false, "error": code, "message": message})
}

#[tokio::test]
async fn listing_an_empty_store_is_not_found() {
    let (_, router) = seeded(0).await;
    let (status, body) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error_envelope(404, "resource not found"));
}

#[tokio::test]
async fn listing_a_single_book() {
    let store = Arc::new(InMemoryBookStore::new());
    store
        .insert(NewBook {
            title: Some("Dune".to_string()),
            author: Some("Frank Herbert".to_string()),
            rating: Some(5),
        })
        .await
        .unwrap();
    let router = router_over(store);

    let (status, body) = send(&router, Method::GET, "/books?page=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "books": [{"id": 1, "title": "Dune", "author": "Frank Herbert", "rating": 5}],
            "total_books": 1
        })
    );
}

#[tokio::test]
async fn listing_pages_by_eight_in_id_order() {
    let (_, router) = seeded(19).await;

    let (status, first) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&first), (1..=8).collect::<Vec<_>>());
    assert_eq!(first["total_books"], 19);

    let (_, third) = send(&router, Method::GET, "/books?page=3", None).await;
    assert_eq!(ids(&third), vec![17, 18, 19]);

    let (status, beyond) = send(&router, Method::GET, "/books?page=4", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(beyond, error_envelope(404, "resource not found"));
}

#[tokio::test]
async fn non_numeric_page_means_first_page() {
    let (_, router) = seeded(10).await;
    let (status, body) = send(&router, Method::GET, "/books?page=abc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), (1..=8).collect::<Vec<_>>());
}

#[tokio::test]
async fn page_zero_is_not_found() {
    let (_, router) = seeded(10).await;
    let (status, _) = send(&router, Method::GET, "/books?page=0", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn updating_rating_from_string_coerces() {
    let (store, router) = seeded(2).await;

    let (status, body) = send(&router, Method::PATCH, "/books/2", Some(json!({"rating": "5"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "id": 2}));

    let book = store.find_by_id(2).await.unwrap().unwrap();
    assert_eq!(book.rating, Some(5));
}

#[tokio::test]
async fn updating_without_rating_changes_nothing() {
    let (store, router) = seeded(1).await;
    let before = store.find_by_id(1).await.unwrap().unwrap();

    let (status, body) = send(&router, Method::PATCH, "/books/1", Some(json!({"title": "ignored"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "id": 1}));
    assert_eq!(store.find_by_id(1).await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn updating_a_missing_book_is_bad_request() {
    let (_, router) = seeded(1).await;
    let (status, body) = send(&router, Method::PATCH, "/books/999", Some(json!({"rating": 3}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_envelope(400, "bad request"));
}

#[tokio::test]
async fn updating_with_bad_rating_is_bad_request() {
    let (store, router) = seeded(1).await;

    for rating in [json!("five"), json!(null), json!({"value": 1})] {
        let (status, body) = send(&router, Method::PATCH, "/books/1", Some(json!({ "rating": rating }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "rating {rating}");
        assert_eq!(body, error_envelope(400, "bad request"));
    }

    assert_eq!(store.find_by_id(1).await.unwrap().unwrap().rating, Some(1));
}

#[tokio::test]
async fn updating_without_a_json_body_is_bad_request() {
    let (_, router) = seeded(1).await;
    let (status, _) = send(&router, Method::PATCH, "/books/1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_removes_the_book_for_good() {
    let (store, router) = seeded(10).await;

    let (status, body) = send(&router, Method::DELETE, "/books/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["deleted"], 3);
    assert_eq!(body["total_books"], 9);
    assert_eq!(ids(&body), vec![1, 2, 4, 5, 6, 7, 8, 9]);

    assert!(store.find_by_id(3).await.unwrap().is_none());

    let (status, body) = send(&router, Method::DELETE, "/books/3", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, error_envelope(422, "unprocessable"));
}

#[tokio::test]
async fn deleting_the_last_book_returns_an_empty_page() {
    let (_, router) = seeded(1).await;
    let (status, body) = send(&router, Method::DELETE, "/books/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"], json!([]));
    assert_eq!(body["total_books"], 0);
}

#[tokio::test]
async fn deleting_reports_the_requested_page() {
    let (_, router) = seeded(12).await;
    let (status, body) = send(&router, Method::DELETE, "/books/1?page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![10, 11, 12]);
}

#[tokio::test]
async fn creating_assigns_a_fresh_id() {
    let (_, router) = seeded(3).await;
    let (_, before) = send(&router, Method::GET, "/books", None).await;
    let prior_ids = ids(&before);

    let (status, body) = send(
        &router,
        Method::POST,
        "/books",
        Some(json!({"title": "X", "author": "Y", "rating": 3})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let created = body["created"].as_i64().unwrap();
    assert!(created > 0);
    assert!(!prior_ids.contains(&created));
    assert_eq!(body["total_books"], before["total_books"].as_i64().unwrap() + 1);
    assert!(body["books"]
        .as_array()
        .unwrap()
        .contains(&json!({"id": created, "title": "X", "author": "Y", "rating": 3})));
}

#[tokio::test]
async fn creating_with_an_empty_body_stores_nulls() {
    let (store, router) = seeded(0).await;
    let (status, body) = send(&router, Method::POST, "/books", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 1);

    let book = store.find_by_id(1).await.unwrap().unwrap();
    assert_eq!(
        book,
        Book {
            id: 1,
            title: None,
            author: None,
            rating: None
        }
    );
}

#[tokio::test]
async fn creating_with_bad_input_is_unprocessable() {
    let (store, router) = seeded(0).await;

    let (status, body) = send(&router, Method::POST, "/books", Some(json!({"rating": "lots"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, error_envelope(422, "unprocessable"));

    let (status, _) = send(&router, Method::POST, "/books", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(store.count_all().await.unwrap(), 0);
}

#[tokio::test]
async fn unsupported_methods_are_not_allowed() {
    let (_, router) = seeded(1).await;

    for (method, uri) in [
        (Method::PUT, "/books"),
        (Method::DELETE, "/books"),
        (Method::GET, "/books/1"),
        (Method::POST, "/books/1"),
    ] {
        let (status, body) = send(&router, method.clone(), uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(body, error_envelope(405, "method not allowed"));
    }
}

#[tokio::test]
async fn non_integer_ids_and_unknown_paths_are_not_found() {
    let (_, router) = seeded(1).await;

    let (status, body) = send(&router, Method::PATCH, "/books/abc", Some(json!({"rating": 1}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error_envelope(404, "resource not found"));

    let (status, _) = send(&router, Method::GET, "/shelves", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn signed_ids_are_not_found() {
    let (store, router) = seeded(2).await;

    for uri in ["/books/-1", "/books/+1", "/books/%201"] {
        let (status, body) = send(&router, Method::DELETE, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "DELETE {uri}");
        assert_eq!(body, error_envelope(404, "resource not found"));

        let (status, body) = send(&router, Method::PATCH, uri, Some(json!({"rating": 1}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "PATCH {uri}");
        assert_eq!(body, error_envelope(404, "resource not found"));
    }

    assert_eq!(store.count_all().await.unwrap(), 2);
}

#[tokio::test]
async fn oversized_ids_are_unknown_books() {
    let (_, router) = seeded(1).await;
    let uri = "/books/99999999999999999999999";

    let (status, body) = send(&router, Method::PATCH, uri, Some(json!({"rating": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_envelope(400, "bad request"));

    let (status, body) = send(&router, Method::DELETE, uri, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, error_envelope(422, "unprocessable"));
}

#[tokio::test]
async fn preflight_carries_the_fixed_cors_headers() {
    let (_, router) = seeded(1).await;
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/books/1")
        .header(header::ORIGIN, "http://client.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type,Authorization,true"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET,PUT,POST,DELETE,OPTIONS"
    );
}

#[tokio::test]
async fn every_response_carries_cors_headers() {
    let (_, router) = seeded(0).await;
    let request = Request::builder()
        .uri("/books")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type,Authorization,true"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET,PUT,POST,DELETE,OPTIONS"
    );
}

/// Store whose every call fails, standing in for a lost database.
struct BrokenStore;

#[async_trait]
impl BookStore for BrokenStore {
    async fn find_all(&self) -> anyhow::Result<Vec<Book>> {
        anyhow::bail!("connection refused")
    }

    async fn find_by_id(&self, _id: BookId) -> anyhow::Result<Option<Book>> {
        anyhow::bail!("connection refused")
    }

    async fn count_all(&self) -> anyhow::Result<u64> {
        anyhow::bail!("connection refused")
    }

    async fn insert(&self, _book: NewBook) -> anyhow::Result<Book> {
        anyhow::bail!("connection refused")
    }

    async fn update(&self, _book: &Book) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }

    async fn delete(&self, _book: &Book) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
}

#[tokio::test]
async fn store_failures_collapse_to_each_handlers_status() {
    let router = router_over(Arc::new(BrokenStore));

    let (status, _) = send(&router, Method::PATCH, "/books/1", Some(json!({"rating": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, Method::DELETE, "/books/1", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&router, Method::POST, "/books", Some(json!({"title": "X"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, error_envelope(422, "unprocessable"));
}

/// Store that answers correctly but slowly, like a loaded database.
struct SlowStore {
    inner: InMemoryBookStore,
    delay: Duration,
}

#[async_trait]
impl BookStore for SlowStore {
    async fn find_all(&self) -> anyhow::Result<Vec<Book>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_all().await
    }

    async fn find_by_id(&self, id: BookId) -> anyhow::Result<Option<Book>> {
        self.inner.find_by_id(id).await
    }

    async fn count_all(&self) -> anyhow::Result<u64> {
        self.inner.count_all().await
    }

    async fn insert(&self, book: NewBook) -> anyhow::Result<Book> {
        self.inner.insert(book).await
    }

    async fn update(&self, book: &Book) -> anyhow::Result<()> {
        self.inner.update(book).await
    }

    async fn delete(&self, book: &Book) -> anyhow::Result<()> {
        self.inner.delete(book).await
    }
}

#[tokio::test]
async fn slow_store_calls_run_to_completion() {
    let inner = InMemoryBookStore::new();
    inner
        .insert(NewBook {
            title: Some("Slow Reading".to_string()),
            author: None,
            rating: None,
        })
        .await
        .unwrap();
    let router = router_over(Arc::new(SlowStore {
        inner,
        delay: Duration::from_millis(300),
    }));

    let (status, body) = send(&router, Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(ids(&body), vec![1]);
}
