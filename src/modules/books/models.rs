use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::error::BookError;

/// Store-assigned book identifier.
pub type BookId = i32;

/// A persisted book record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Assigned by the store on insert, never reused
    pub id: BookId,
    pub title: Option<String>,
    pub author: Option<String>,
    /// The only field that changes after creation
    pub rating: Option<i32>,
}

/// A book that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBook {
    pub title: Option<String>,
    pub author: Option<String>,
    pub rating: Option<i32>,
}

/// Wire projection of a [`Book`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookView {
    pub id: BookId,
    pub title: Option<String>,
    pub author: Option<String>,
    pub rating: Option<i32>,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            rating: book.rating,
        }
    }
}

/// A rating as clients send it: a number, a boolean, or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RatingValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl RatingValue {
    /// Coerce into the stored integer rating.
    ///
    /// Floats truncate toward zero, booleans count as 1/0, and strings must
    /// hold a base-10 integer (surrounding whitespace allowed).
    pub fn coerce(&self) -> Result<i32, BookError> {
        let wide: i64 = match self {
            RatingValue::Integer(value) => *value,
            RatingValue::Bool(value) => i64::from(*value),
            RatingValue::Float(value) => {
                let truncated = value.trunc();
                if !truncated.is_finite()
                    || truncated < i32::MIN as f64
                    || truncated > i32::MAX as f64
                {
                    return Err(BookError::InvalidRating(value.to_string()));
                }
                truncated as i64
            }
            RatingValue::Text(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| BookError::InvalidRating(format!("{raw:?}")))?,
        };

        i32::try_from(wide).map_err(|_| BookError::InvalidRating(wide.to_string()))
    }
}

/// Body of `POST /books`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateBookRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub rating: Option<RatingValue>,
}

impl TryFrom<CreateBookRequest> for NewBook {
    type Error = BookError;

    fn try_from(request: CreateBookRequest) -> Result<Self, Self::Error> {
        let rating = request.rating.as_ref().map(RatingValue::coerce).transpose()?;
        Ok(Self {
            title: request.title,
            author: request.author,
            rating,
        })
    }
}

/// Body of `PATCH /books/{id}`.
///
/// `rating` is `None` when the key is absent and `Some(None)` for an explicit
/// `null`; only a present key triggers a write.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRatingRequest {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<RatingValue>)]
    pub rating: Option<Option<RatingValue>>,
}

/// Marks a field as present, keeping `null` distinct from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
