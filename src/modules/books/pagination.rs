//! Page slicing over the id-ordered book list.

use serde::Deserialize;
use utoipa::IntoParams;

/// Default number of books per page ("per shelf").
pub const BOOKS_PER_SHELF: usize = 8;

/// `?page=` query parameter, kept raw so bad input falls back to page 1.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number; absent or non-numeric means 1
    #[param(value_type = Option<i64>)]
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page_number(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(1)
    }
}

/// Items `[(page - 1) * page_size, page * page_size)` of `items`, clamped to
/// its bounds. Pages below 1 and pages past the end are empty.
pub fn paginate<T>(page: i64, page_size: usize, items: &[T]) -> &[T] {
    if page < 1 {
        return &[];
    }

    let skipped = u64::try_from(page - 1)
        .unwrap_or(u64::MAX)
        .saturating_mul(page_size as u64);
    let start = usize::try_from(skipped)
        .unwrap_or(usize::MAX)
        .min(items.len());
    let end = start.saturating_add(page_size).min(items.len());

    &items[start..end]
}
